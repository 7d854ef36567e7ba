//! Count-preservation audit for recode transformations.
//!
//! A recode promises that every occurrence of a mapping key in the source
//! column shows up as exactly one occurrence of the mapped target in the
//! output column. Collisions (two distinct source values landing on the
//! same target) or a mapping applied against unexpected data break that
//! promise, and the break is visible in the counts.
//!
//! The audit works in two steps:
//!
//! 1. count occurrences of every distinct source value, and of each mapped
//!    target in the output column;
//! 2. for each mapping entry `(key, target)`, subtract the key's source
//!    count from the target's output count.
//!
//! If the mapping was applied correctly, every target's residual nets to
//! exactly zero once all contributing keys are subtracted. Any nonzero
//! residual, in either direction, fails the audit.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::models::{Cell, Column};

/// Outcome of auditing one recode, with the count evidence retained so a
/// caller can show *why* a field failed, not just that it did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecodeAudit {
    /// True iff every residual nets to zero.
    pub passed: bool,
    /// Occurrences of each distinct non-missing source value.
    pub key_counts: BTreeMap<String, usize>,
    /// Per-target residuals after subtracting contributing key counts.
    /// All zeros on a clean recode.
    pub residuals: BTreeMap<String, i64>,
}

/// Audit that a recode preserved per-category counts.
pub fn audit_recode(source: &Column, output: &Column, mapping: &Map<String, Value>) -> RecodeAudit {
    let (key_counts, mut residuals) = count_occurrences(source, output, mapping);
    settle_residuals(mapping, &key_counts, &mut residuals);
    let passed = residuals.values().all(|r| *r == 0);
    RecodeAudit {
        passed,
        key_counts,
        residuals,
    }
}

/// Count occurrences of each distinct source value, and of each mapped
/// target value in the output column. Missing cells have no key and do not
/// participate.
fn count_occurrences(
    source: &Column,
    output: &Column,
    mapping: &Map<String, Value>,
) -> (BTreeMap<String, usize>, BTreeMap<String, i64>) {
    let mut key_counts: BTreeMap<String, usize> = BTreeMap::new();
    for cell in source {
        if let Some(key) = cell.key() {
            *key_counts.entry(key).or_insert(0) += 1;
        }
    }

    let mut value_counts: BTreeMap<String, i64> = BTreeMap::new();
    for key in key_counts.keys() {
        if let Some(target) = mapping.get(key) {
            if let Some(target_key) = Cell::from_value(target).key() {
                let count = occurrences(output, &target_key);
                value_counts.insert(target_key, count as i64);
            }
        }
    }

    (key_counts, value_counts)
}

/// Subtract each observed key's count from its target's output count.
fn settle_residuals(
    mapping: &Map<String, Value>,
    key_counts: &BTreeMap<String, usize>,
    value_counts: &mut BTreeMap<String, i64>,
) {
    for (key, target) in mapping {
        let Some(count) = key_counts.get(key) else {
            continue;
        };
        let Some(target_key) = Cell::from_value(target).key() else {
            continue;
        };
        if let Some(residual) = value_counts.get_mut(&target_key) {
            *residual -= *count as i64;
        }
    }
}

fn occurrences(column: &Column, key: &str) -> usize {
    column
        .iter()
        .filter(|cell| cell.key().as_deref() == Some(key))
        .count()
}

/// Shape-only audit: do two columns have the same occurrence profile?
///
/// Compares the sorted multiset of per-value counts, ignoring which value
/// carries which count. Useful as a sanity check when no mapping is in
/// play; it cannot detect two categories swapping places.
pub fn counts_match(source: &Column, output: &Column) -> bool {
    occurrence_profile(source) == occurrence_profile(output)
}

fn occurrence_profile(column: &Column) -> Vec<usize> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for cell in column {
        if let Some(key) = cell.key() {
            *counts.entry(key).or_insert(0) += 1;
        }
    }
    let mut profile: Vec<usize> = counts.into_values().collect();
    profile.sort_unstable_by(|a, b| b.cmp(a));
    profile
}
