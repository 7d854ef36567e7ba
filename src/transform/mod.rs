//! Transformation module.
//!
//! This module turns instruction rows into unified columns:
//! - Actions: column-level transformation primitives
//! - Interpreter: per-row action dispatch
//! - Pipeline: the full harmonization pass

pub mod actions;
pub mod interpreter;
pub mod pipeline;

pub use actions::FieldContext;
pub use interpreter::{FieldOutcome, Interpreter};
pub use pipeline::{harmonize, HarmonizeOptions, HarmonizeResult};
