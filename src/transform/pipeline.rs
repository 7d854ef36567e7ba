//! High-level harmonization pass over an instruction table.
//!
//! This is the main entry point: feed it the second source dataset, the
//! ordered instruction rows and the pass options, get back the unified
//! data table, the unified dictionary and one diagnostic report per field.
//!
//! # Example
//!
//! ```rust,ignore
//! use unifield::{harmonize, HarmonizeOptions, InstructionRow, Table};
//!
//! let result = harmonize(&source, &instructions, &HarmonizeOptions::default())?;
//! println!("{}", result.summary());
//! for report in &result.reports {
//!     println!("{}", report.summary());
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::dictionary::{DictionaryAccumulator, DictionaryEntry};
use crate::error::HarmonizeError;
use crate::instruction::InstructionRow;
use crate::models::Table;
use crate::report::FieldReport;
use crate::transform::interpreter::Interpreter;

/// Options for a harmonization pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarmonizeOptions {
    /// Text values treated as missing during `copy` classification.
    /// Clear this when a marker is a legitimate category in your data.
    pub missing_markers: Vec<String>,

    /// Skip the recode count-preservation audit.
    pub skip_audit: bool,
}

impl Default for HarmonizeOptions {
    fn default() -> Self {
        Self {
            missing_markers: vec!["na".to_string()],
            skip_audit: false,
        }
    }
}

/// Result of a complete harmonization pass.
#[derive(Debug, Clone)]
pub struct HarmonizeResult {
    /// Unified data table: one column per instruction row that produced
    /// one, in processing order.
    pub table: Table,

    /// Unified dictionary: exactly one entry per instruction row, in
    /// processing order.
    pub dictionary: Vec<DictionaryEntry>,

    /// One diagnostic report per instruction row, in processing order.
    pub reports: Vec<FieldReport>,
}

impl HarmonizeResult {
    /// Fields whose recode audit failed.
    pub fn failed_audits(&self) -> Vec<&str> {
        self.reports
            .iter()
            .filter(|r| !r.audits_passed())
            .map(|r| r.field.as_str())
            .collect()
    }

    /// Fields tagged for manual handling.
    pub fn pending_special(&self) -> Vec<&str> {
        self.reports
            .iter()
            .filter(|r| r.needs_manual_handling())
            .map(|r| r.field.as_str())
            .collect()
    }

    /// True when no audit failed and nothing is pending manual handling.
    pub fn is_clean(&self) -> bool {
        self.failed_audits().is_empty() && self.pending_special().is_empty()
    }

    /// Get summary statistics.
    pub fn summary(&self) -> String {
        format!(
            "Harmonized {} field(s): {} column(s), {} failed audit(s), {} pending special",
            self.dictionary.len(),
            self.table.width(),
            self.failed_audits().len(),
            self.pending_special().len()
        )
    }
}

/// Run a full harmonization pass.
///
/// Instruction rows are processed strictly in order, each exactly once.
/// Recoverable problems (malformed payloads, unknown actions, failed
/// audits) land in the per-field reports; composition errors and
/// unresolvable source columns abort the pass on the offending row.
pub fn harmonize(
    source: &Table,
    instructions: &[InstructionRow],
    options: &HarmonizeOptions,
) -> Result<HarmonizeResult, HarmonizeError> {
    let interpreter = Interpreter::new(source, options);
    let mut table = Table::with_row_count(source.row_count());
    let mut accumulator = DictionaryAccumulator::new();
    let mut reports = Vec::with_capacity(instructions.len());

    for row in instructions {
        let outcome = interpreter.interpret(row)?;
        if let Some(column) = outcome.column {
            table.insert(outcome.unified_name, column)?;
        }
        accumulator.push(outcome.entry);
        reports.push(outcome.report);
    }

    Ok(HarmonizeResult {
        table,
        dictionary: accumulator.into_entries(),
        reports,
    })
}
