//! # Unifield - instruction-driven dataset harmonization
//!
//! Unifield merges two independently-collected tabular datasets with
//! divergent schemas into a single unified schema, driven by a declarative
//! instruction table. Each instruction row says how one unified field is
//! derived from its source field(s): a plain copy with numeric/categorical
//! classification, a recode through a value mapping, an enumeration
//! substitution, or a dictionary extension. Every recode is audited
//! for per-category count preservation.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Instructions │────▶│ Interpreter  │────▶│  Primitives  │────▶│ Unified table│
//! │  (one/field) │     │ (dispatch in │     │ copy, recode,│     │ + dictionary │
//! │              │     │ listed order)│     │ options, ... │     │ + reports    │
//! └──────────────┘     └──────────────┘     └──────┬───────┘     └──────────────┘
//!                                                  │
//!                                           ┌──────▼───────┐
//!                                           │ Recode audit │
//!                                           │ (count check)│
//!                                           └──────────────┘
//! ```
//!
//! File I/O is deliberately absent: tables arrive in memory and results
//! leave in memory. Reading CSVs and persisting outputs belong to the
//! calling layer.
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use unifield::{harmonize, Column, HarmonizeOptions, InstructionRow, Table};
//!
//! let source = Table::from_columns(vec![(
//!     "sexo".to_string(),
//!     Column::from_values(vec![json!("H"), json!("M")]),
//! )])
//! .unwrap();
//!
//! let instructions = vec![InstructionRow::new("sex", "sexo")
//!     .with_actions(r#"{"actions": ["recode"], "recode": {"H": 1, "M": 2}}"#)];
//!
//! let result = harmonize(&source, &instructions, &HarmonizeOptions::default()).unwrap();
//! assert_eq!(result.dictionary.len(), 1);
//! assert!(result.reports[0].audits_passed());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - hierarchical error types
//! - [`models`] - cells, columns, tables, options descriptors
//! - [`instruction`] - instruction rows and action specs
//! - [`transform`] - primitives, interpreter and pipeline
//! - [`validation`] - recode count-preservation audit
//! - [`dictionary`] - unified dictionary accumulation
//! - [`report`] - structured per-field diagnostics

// Core modules
pub mod error;
pub mod models;

// Instructions
pub mod instruction;

// Transformation
pub mod transform;

// Validation
pub mod validation;

// Dictionary
pub mod dictionary;

// Diagnostics
pub mod report;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{ActionError, ActionResult, HarmonizeError, PassResult, PayloadError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{is_numeric_literal, Cell, Column, FieldKind, FieldOptions, Table};

// =============================================================================
// Re-exports - Instructions
// =============================================================================

pub use instruction::{ActionKind, ActionSpec, InstructionRow};

// =============================================================================
// Re-exports - Transformation
// =============================================================================

pub use transform::{
    harmonize, FieldContext, FieldOutcome, HarmonizeOptions, HarmonizeResult, Interpreter,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{audit_recode, counts_match, RecodeAudit};

// =============================================================================
// Re-exports - Dictionary
// =============================================================================

pub use dictionary::{DictionaryAccumulator, DictionaryEntry};

// =============================================================================
// Re-exports - Diagnostics
// =============================================================================

pub use report::{FieldReport, PayloadKind, ReportEvent};
