//! Structured per-field diagnostics.
//!
//! Every processed field yields a [`FieldReport`]: a typed event stream a
//! caller can log, surface, or aggregate as it sees fit. Downstream
//! consumers rely on these to remediate special-tagged and mismatched
//! fields by hand, so nothing here is optional logging: the report is part
//! of the result.

use serde::Serialize;

use crate::models::FieldKind;
use crate::validation::RecodeAudit;

/// Which serialized instruction payload a notice refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadKind {
    Options,
    Actions,
}

/// One diagnostic event recorded while processing a field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportEvent {
    /// A payload failed to parse and the documented default was used.
    PayloadDefaulted {
        payload: PayloadKind,
        message: String,
    },

    /// The copy primitive classified the column.
    Classified {
        numeric: usize,
        text: usize,
        missing: usize,
        kind: FieldKind,
    },

    /// A recode was audited for count preservation.
    RecodeAudited { audit: RecodeAudit },

    /// An action name outside the known set was skipped.
    UnknownAction { name: String },

    /// The field is tagged for manual handling and was left untouched.
    SpecialPending,

    /// The explicit no-op action ran (the default for absent actions).
    NoActionTaken,
}

/// Diagnostic report for one unified field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldReport {
    /// Unified field name.
    pub field: String,
    /// Events in the order they occurred.
    pub events: Vec<ReportEvent>,
}

impl FieldReport {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            events: Vec::new(),
        }
    }

    pub fn push(&mut self, event: ReportEvent) {
        self.events.push(event);
    }

    /// All recode audits recorded for this field.
    pub fn audits(&self) -> impl Iterator<Item = &RecodeAudit> {
        self.events.iter().filter_map(|e| match e {
            ReportEvent::RecodeAudited { audit } => Some(audit),
            _ => None,
        })
    }

    /// True iff no recorded audit failed. Vacuously true for fields that
    /// were never recoded.
    pub fn audits_passed(&self) -> bool {
        self.audits().all(|a| a.passed)
    }

    /// Classification decided by `copy`, if it ran.
    pub fn classified_kind(&self) -> Option<FieldKind> {
        self.events.iter().find_map(|e| match e {
            ReportEvent::Classified { kind, .. } => Some(*kind),
            _ => None,
        })
    }

    /// Names of actions that were skipped as unrecognized.
    pub fn unknown_actions(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ReportEvent::UnknownAction { name } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// True if the field was tagged for manual handling.
    pub fn needs_manual_handling(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, ReportEvent::SpecialPending))
    }

    /// One-line digest for logs.
    pub fn summary(&self) -> String {
        let mut notes: Vec<String> = Vec::new();
        if let Some(kind) = self.classified_kind() {
            notes.push(format!("{:?}", kind).to_lowercase());
        }
        let audits = self.audits().count();
        if audits > 0 {
            notes.push(if self.audits_passed() {
                format!("{} audit(s) passed", audits)
            } else {
                format!("{} audit(s), FAILED", audits)
            });
        }
        let unknown = self.unknown_actions();
        if !unknown.is_empty() {
            notes.push(format!("unknown: {}", unknown.join(", ")));
        }
        if self.needs_manual_handling() {
            notes.push("special handling pending".to_string());
        }
        if notes.is_empty() {
            notes.push("no actions".to_string());
        }
        format!("{}: {}", self.field, notes.join(", "))
    }
}
