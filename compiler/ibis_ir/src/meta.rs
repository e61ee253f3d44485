//! Per-node metadata bag.
//!
//! An enum-keyed, typed, additive key-value bag carried by every `Expr`.
//! Passes read keys set by earlier phases and add new ones; nothing is ever
//! removed within a pipeline run. Keys are a closed enum so a typo'd or
//! mistyped key is a compile error, not a silent miss.
//!
//! Core passes read `KeepBinding` and `ResultShape` and set `Synthetic`.
//! `Schema` and `Endpoint` are set by the front end and consumed by the
//! framework-synthesis layer outside this repository.

use smallvec::SmallVec;
use std::fmt;

use crate::Name;

/// Closed set of metadata keys.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum MetaKey {
    /// Module represents a schema definition.
    Schema,
    /// Module represents a web endpoint.
    Endpoint,
    /// This binding must survive hygiene passes untouched.
    KeepBinding,
    /// Function definition must return tagged-tuple results.
    ResultShape,
    /// Node was synthesized by a rewrite pass (no source counterpart).
    Synthetic,
}

/// Closed union of metadata values.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum MetaValue {
    Flag(bool),
    Name(Name),
    Int(i64),
    Text(Name),
}

/// Per-node metadata bag.
///
/// Inline storage: almost every node carries zero entries and flagged nodes
/// rarely carry more than two, so entries live inline and spill to the heap
/// only in the degenerate case.
#[derive(Clone, Eq, PartialEq, Hash, Default)]
pub struct Meta {
    entries: SmallVec<[(MetaKey, MetaValue); 2]>,
}

impl Meta {
    /// Create an empty bag.
    pub fn new() -> Self {
        Meta::default()
    }

    /// Set a key, replacing any existing value for it.
    pub fn set(&mut self, key: MetaKey, value: MetaValue) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Get the value for a key.
    pub fn get(&self, key: MetaKey) -> Option<&MetaValue> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// Check a boolean flag. Absent keys and non-flag values read as false.
    pub fn flag(&self, key: MetaKey) -> bool {
        matches!(self.get(key), Some(MetaValue::Flag(true)))
    }

    /// Check if the bag has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &(MetaKey, MetaValue)> {
        self.entries.iter()
    }
}

impl fmt::Debug for Meta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}
