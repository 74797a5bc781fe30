//! String Table.
//!
//! Append-only table assigning small integer indices to strings (element and
//! attribute names, referenced values). Each entry also remembers the stream
//! offset of the StringTable token that defined it; the trailer index is
//! built from these offsets.
//!
//! Indices are handed out in insertion order and never change. Lookup is by
//! content, so a rebuilt `String` finds the entry of an equal earlier one.
//!
//! Lifecycle: one table per reader or writer, not shared across streams.

use std::rc::Rc;

use crate::{Error, FastIndexMap, Result};

/// Deduplicating, index-addressable string table.
#[derive(Debug, Clone, Default)]
pub struct StringTable {
    /// String → Offset der definierenden StringTable-Tokens.
    entries: FastIndexMap<Rc<str>, u64>,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `s`, recording `offset` as its definition offset.
    ///
    /// Returns the existing index (and keeps the first offset) if `s` is
    /// already present, otherwise the new index `len()` before insertion.
    pub fn add(&mut self, s: &str, offset: u64) -> usize {
        if let Some(index) = self.entries.get_index_of(s) {
            return index;
        }
        self.entries.insert_full(Rc::from(s), offset).0
    }

    /// String at `index`.
    pub fn get(&self, index: usize) -> Result<&str> {
        self.get_rc(index).map(|s| &**s)
    }

    /// Shared handle of the string at `index` (no copy).
    pub fn get_rc(&self, index: usize) -> Result<&Rc<str>> {
        self.entries
            .get_index(index)
            .map(|(s, _)| s)
            .ok_or(Error::InvalidStringIndex { index: index as u64, len: self.entries.len() })
    }

    /// Index of `s`, `None` if not defined.
    pub fn lookup(&self, s: &str) -> Option<usize> {
        self.entries.get_index_of(s)
    }

    /// Definition offset of the entry at `index`.
    pub fn offset(&self, index: usize) -> Result<u64> {
        self.entries
            .get_index(index)
            .map(|(_, off)| *off)
            .ok_or(Error::InvalidStringIndex { index: index as u64, len: self.entries.len() })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(string, offset)` in index order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.entries.iter().map(|(s, off)| (&**s, *off))
    }

    /// Leert die Tabelle (neuer Stream).
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
