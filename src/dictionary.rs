//! Unified data-dictionary accumulation.
//!
//! Each processed instruction row contributes exactly one entry, in
//! processing order. The accumulator never deduplicates: two instruction
//! rows naming the same unified field yield two entries, which is a
//! caller-level mistake this component preserves rather than corrects.

use serde::{Deserialize, Serialize};

/// Final metadata record for one unified field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    /// Unified field name.
    pub unified_name: String,
    /// Final description (second dataset's wording unless a
    /// `recode_extend` replaced it).
    pub description: String,
    /// Serialized options descriptor; `{}` when the field has none.
    pub options: String,
    /// Category the field belongs to.
    pub category: String,
}

/// Append-only collector for dictionary entries.
#[derive(Debug, Clone, Default)]
pub struct DictionaryAccumulator {
    entries: Vec<DictionaryEntry>,
}

impl DictionaryAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: DictionaryEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[DictionaryEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<DictionaryEntry> {
        self.entries
    }
}
