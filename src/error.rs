//! Error types for the harmonization engine.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`PayloadError`] - malformed instruction payloads (always recovered)
//! - [`ActionError`] - primitive composition violations (fatal per field)
//! - [`HarmonizeError`] - top-level pass errors
//!
//! `PayloadError` never aborts anything: the interpreter substitutes the
//! documented defaults and records the failure in the field report. The
//! other two propagate with `?`.

use thiserror::Error;

// =============================================================================
// Instruction Payload Errors
// =============================================================================

/// Errors while parsing a serialized instruction payload.
///
/// Recovered locally by the interpreter: a failed parse falls back to the
/// default value (empty options, single no-op action) and the failure is
/// attached to the field report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PayloadError {
    /// The payload is not valid JSON.
    #[error("payload is not valid JSON: {0}")]
    Syntax(String),

    /// The payload parsed but has an unusable shape.
    #[error("payload has an unrecognized shape: {0}")]
    Shape(String),
}

// =============================================================================
// Primitive Composition Errors
// =============================================================================

/// Structural precondition violations inside an action primitive.
///
/// These are usage errors in the instruction table, fatal to the field
/// being processed, and are surfaced to the caller wrapped in
/// [`HarmonizeError::Action`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ActionError {
    /// `add_to_dict` was applied while the working options descriptor is
    /// absent or continuous.
    #[error("add_to_dict requires an existing categorical options mapping")]
    NotCategorical,
}

// =============================================================================
// Pass Errors (top-level)
// =============================================================================

/// Top-level errors from a harmonization pass.
///
/// Returned by [`crate::transform::pipeline::harmonize`]: the pass either
/// completes fully or fails outright on the offending instruction row.
#[derive(Debug, Error)]
pub enum HarmonizeError {
    /// The instruction row names no source column but lists an action that
    /// needs one.
    #[error("field '{field}': action '{action}' needs a source column but the instruction names none")]
    NoSourceColumn { field: String, action: String },

    /// The named source column does not exist in the source table.
    #[error("field '{field}': source column '{column}' not found")]
    MissingColumn { field: String, column: String },

    /// A column being inserted does not match the table's row count.
    #[error("column '{column}' has {actual} rows, table expects {expected}")]
    RowCountMismatch {
        column: String,
        actual: usize,
        expected: usize,
    },

    /// A primitive composition error, tagged with the field it occurred on.
    #[error("field '{field}': {source}")]
    Action {
        field: String,
        #[source]
        source: ActionError,
    },
}

impl HarmonizeError {
    /// Wrap an [`ActionError`] with the unified field it occurred on.
    pub fn action(field: impl Into<String>, source: ActionError) -> Self {
        Self::Action {
            field: field.into(),
            source,
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for action primitives.
pub type ActionResult<T> = Result<T, ActionError>;

/// Result type for whole-pass operations.
pub type PassResult<T> = Result<T, HarmonizeError>;
