//! Path registry
//!
//! Records which paths currently "exist". Content is not modeled.

use std::collections::{BTreeMap, HashMap};

/// Insertion-ordered set of registered paths
///
/// Re-registering an existing path keeps its original position. Removing and
/// then re-registering moves it to the end.
#[derive(Debug, Default)]
pub struct PathRegistry {
    /// path -> insertion sequence
    index: HashMap<String, u64>,

    /// insertion sequence -> path, iterated for listings
    order: BTreeMap<u64, String>,

    next_seq: u64,
}

impl PathRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a path. Returns false if it was already present.
    pub fn insert(&mut self, path: &str) -> bool {
        if self.index.contains_key(path) {
            return false;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.index.insert(path.to_string(), seq);
        self.order.insert(seq, path.to_string());
        true
    }

    /// Unregister a path. Returns false if it was absent.
    pub fn remove(&mut self, path: &str) -> bool {
        match self.index.remove(path) {
            Some(seq) => {
                self.order.remove(&seq);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Registered paths in insertion order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.order.values().map(String::as_str)
    }
}
