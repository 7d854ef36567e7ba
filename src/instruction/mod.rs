//! Declarative harmonization instructions.
//!
//! One [`InstructionRow`] describes how one unified field is derived from
//! the corresponding field(s) of the two source datasets. The serialized
//! `raw_options` / `raw_actions` payloads are JSON objects; parsing them is
//! deliberately forgiving: a missing or malformed payload normalizes to
//! the documented default and the interpreter reports the substitution
//! instead of failing the field.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::PayloadError;

// =============================================================================
// Instruction Rows
// =============================================================================

/// One row of the instruction table, immutable once read.
///
/// The external I/O layer produces these in whatever way it likes; the
/// engine only consumes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructionRow {
    /// Name of the unified field this row produces.
    pub unified_name: String,

    /// Field name in the first source dataset, if any. Only its
    /// description participates in transformation; kept for the record.
    #[serde(default)]
    pub source_a: Option<String>,

    /// Field name in the second source dataset, if any. All column
    /// transforms read from this dataset.
    #[serde(default)]
    pub source_b: Option<String>,

    /// Description of the field in the first dataset.
    #[serde(default)]
    pub description_a: String,

    /// Description of the field in the second dataset. The unified
    /// description defaults to this wording.
    #[serde(default)]
    pub description_b: String,

    /// Serialized options descriptor, if any.
    #[serde(default)]
    pub raw_options: Option<String>,

    /// Serialized action spec, if any.
    #[serde(default)]
    pub raw_actions: Option<String>,

    /// Category the unified field belongs to.
    #[serde(default)]
    pub category: String,
}

impl InstructionRow {
    /// Create a minimal row; fill in the rest with the `with_*` builders.
    pub fn new(unified_name: impl Into<String>, source_b: impl Into<String>) -> Self {
        Self {
            unified_name: unified_name.into(),
            source_a: None,
            source_b: Some(source_b.into()),
            description_a: String::new(),
            description_b: String::new(),
            raw_options: None,
            raw_actions: None,
            category: String::new(),
        }
    }

    pub fn with_source_a(mut self, source_a: impl Into<String>) -> Self {
        self.source_a = Some(source_a.into());
        self
    }

    pub fn with_descriptions(
        mut self,
        description_a: impl Into<String>,
        description_b: impl Into<String>,
    ) -> Self {
        self.description_a = description_a.into();
        self.description_b = description_b.into();
        self
    }

    pub fn with_options(mut self, raw_options: impl Into<String>) -> Self {
        self.raw_options = Some(raw_options.into());
        self
    }

    pub fn with_actions(mut self, raw_actions: impl Into<String>) -> Self {
        self.raw_actions = Some(raw_actions.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }
}

// =============================================================================
// Action Kinds
// =============================================================================

/// The known action set, plus a catch-all for anything else the
/// instruction table asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    /// Copy the source column, classifying it numeric/categorical.
    Copy,
    /// Substitute values through an explicit mapping.
    Recode,
    /// Recode, and take the first dataset's description.
    RecodeExtend,
    /// Merge additional entries into the categorical options mapping.
    AddToDict,
    /// Replace the options descriptor with a fresh enumeration.
    NewOptions,
    /// Recognized but deliberately untouched; needs manual handling.
    Special,
    /// Explicit no-op, spelled `none` on the wire.
    Noop,
    /// Anything else: skipped, reported, never fatal.
    Unknown(String),
}

impl ActionKind {
    /// Parse a single action tag. `especial` is accepted as a legacy
    /// spelling of `special`.
    pub fn parse(name: &str) -> Self {
        match name.trim() {
            "copy" => ActionKind::Copy,
            "recode" => ActionKind::Recode,
            "recode_extend" => ActionKind::RecodeExtend,
            "add_to_dict" => ActionKind::AddToDict,
            "new_options" => ActionKind::NewOptions,
            "special" | "especial" => ActionKind::Special,
            "none" => ActionKind::Noop,
            other => ActionKind::Unknown(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ActionKind::Copy => "copy",
            ActionKind::Recode => "recode",
            ActionKind::RecodeExtend => "recode_extend",
            ActionKind::AddToDict => "add_to_dict",
            ActionKind::NewOptions => "new_options",
            ActionKind::Special => "special",
            ActionKind::Noop => "none",
            ActionKind::Unknown(name) => name,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Action Specs
// =============================================================================

/// Parsed form of an instruction row's `raw_actions` payload.
///
/// Wire format:
///
/// ```json
/// {
///   "actions": ["recode", "add_to_dict"],
///   "recode": {"1": 1, "2": 0},
///   "add_to_dict": {"99": "no answer"}
/// }
/// ```
///
/// Absent payloads, and payloads with an empty action list, default to the
/// single no-op action. Absent mappings default to empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionSpec {
    /// Actions in execution order.
    pub actions: Vec<ActionKind>,
    /// Old value → new value mapping for `recode` / `recode_extend`.
    pub recode: Map<String, Value>,
    /// Entries to merge into the options mapping for `add_to_dict`.
    pub add_to_dict: Map<String, Value>,
    /// Replacement enumeration for `new_options`.
    pub new_options: Map<String, Value>,
}

impl Default for ActionSpec {
    fn default() -> Self {
        Self {
            actions: vec![ActionKind::Noop],
            recode: Map::new(),
            add_to_dict: Map::new(),
            new_options: Map::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawActionSpec {
    #[serde(default)]
    actions: Vec<String>,
    #[serde(default)]
    recode: Map<String, Value>,
    #[serde(default)]
    add_to_dict: Map<String, Value>,
    #[serde(default)]
    new_options: Map<String, Value>,
}

impl ActionSpec {
    /// Parse a serialized action payload, recovering to the default on any
    /// failure and reporting why.
    pub fn parse(raw: Option<&str>) -> (Self, Option<PayloadError>) {
        let raw = match raw {
            Some(r) if !r.trim().is_empty() => r,
            _ => return (Self::default(), None),
        };

        let parsed: RawActionSpec = match serde_json::from_str(raw) {
            Ok(p) => p,
            Err(e) => return (Self::default(), Some(PayloadError::Syntax(e.to_string()))),
        };

        let mut actions: Vec<ActionKind> = parsed
            .actions
            .iter()
            .map(|name| ActionKind::parse(name))
            .collect();
        if actions.is_empty() {
            actions.push(ActionKind::Noop);
        }

        (
            Self {
                actions,
                recode: parsed.recode,
                add_to_dict: parsed.add_to_dict,
                new_options: parsed.new_options,
            },
            None,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_kind_parsing() {
        assert_eq!(ActionKind::parse("copy"), ActionKind::Copy);
        assert_eq!(ActionKind::parse("recode_extend"), ActionKind::RecodeExtend);
        assert_eq!(ActionKind::parse("especial"), ActionKind::Special);
        assert_eq!(ActionKind::parse("none"), ActionKind::Noop);
        assert_eq!(
            ActionKind::parse("transmogrify"),
            ActionKind::Unknown("transmogrify".to_string())
        );
    }

    #[test]
    fn test_spec_parse_full_payload() {
        let raw = r#"{
            "actions": ["recode", "add_to_dict"],
            "recode": {"1": 1, "2": 0},
            "add_to_dict": {"99": "no answer"}
        }"#;
        let (spec, err) = ActionSpec::parse(Some(raw));
        assert!(err.is_none());
        assert_eq!(
            spec.actions,
            vec![ActionKind::Recode, ActionKind::AddToDict]
        );
        assert_eq!(spec.recode.get("2"), Some(&json!(0)));
        assert_eq!(spec.add_to_dict.get("99"), Some(&json!("no answer")));
    }

    #[test]
    fn test_spec_defaults_when_absent() {
        let (spec, err) = ActionSpec::parse(None);
        assert!(err.is_none());
        assert_eq!(spec.actions, vec![ActionKind::Noop]);
        assert!(spec.recode.is_empty());

        let (spec, err) = ActionSpec::parse(Some("   "));
        assert!(err.is_none());
        assert_eq!(spec.actions, vec![ActionKind::Noop]);
    }

    #[test]
    fn test_spec_defaults_when_malformed() {
        let (spec, err) = ActionSpec::parse(Some("{'actions': ['copy']}"));
        assert!(matches!(err, Some(PayloadError::Syntax(_))));
        assert_eq!(spec.actions, vec![ActionKind::Noop]);
    }

    #[test]
    fn test_empty_action_list_defaults_to_noop() {
        let (spec, err) = ActionSpec::parse(Some(r#"{"actions": []}"#));
        assert!(err.is_none());
        assert_eq!(spec.actions, vec![ActionKind::Noop]);
    }

    #[test]
    fn test_row_builder() {
        let row = InstructionRow::new("sex", "sexo")
            .with_source_a("SEX2014")
            .with_descriptions("Sex of respondent", "Sexo")
            .with_options(r#"{"options": {"1": "male", "2": "female"}}"#)
            .with_actions(r#"{"actions": ["copy"]}"#)
            .with_category("demographics");
        assert_eq!(row.unified_name, "sex");
        assert_eq!(row.source_b.as_deref(), Some("sexo"));
        assert_eq!(row.category, "demographics");
    }
}
