//! Readdir listing serialization
//!
//! Existing host clients expect the listing byte-for-byte as the reference
//! kernel produced it: a JSON array with `", "` between elements and every
//! non-ASCII character written as a `\uXXXX` escape.

use std::io;

use serde::{Deserialize, Serialize};
use serde_json::ser::Formatter;

use crate::error::Result;

/// Readdir payload: registered paths in insertion order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirListing(pub Vec<String>);

impl DirListing {
    /// Encode as the textual listing sent on the wire
    pub fn to_json(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(2 + self.0.iter().map(|p| p.len() + 4).sum::<usize>());
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, ListingFormatter);
        self.serialize(&mut serializer)?;
        Ok(out)
    }

    /// Parse a listing received from a server
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.iter().any(|p| p == path)
    }

    pub fn into_paths(self) -> Vec<String> {
        self.0
    }
}

/// Compact JSON with `", "` / `": "` separators and ASCII-only output
struct ListingFormatter;

impl Formatter for ListingFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W: ?Sized + io::Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        let mut start = 0;
        for (idx, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(&fragment.as_bytes()[start..idx])?;

            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = idx + ch.len_utf8();
        }
        writer.write_all(&fragment.as_bytes()[start..])
    }
}
