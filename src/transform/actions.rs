//! Column-level transformation primitives.
//!
//! Each primitive is a pure step over a [`FieldContext`]: it consumes the
//! context, applies one transform against the source column, and returns
//! the updated context. The interpreter composes them in the order the
//! instruction row lists them.

use serde_json::{Map, Value};

use crate::error::{ActionError, ActionResult};
use crate::models::{Cell, Column, FieldKind, FieldOptions};
use crate::report::{FieldReport, ReportEvent};
use crate::validation::audit_recode;

/// Working state for one unified field while its action list runs.
#[derive(Debug, Clone)]
pub struct FieldContext {
    /// The in-progress output column; at most one per unified field.
    pub column: Option<Column>,
    /// Current options descriptor.
    pub options: Option<FieldOptions>,
    /// Description that will land in the unified dictionary.
    pub description: String,
    /// Diagnostics collected so far.
    pub report: FieldReport,
}

impl FieldContext {
    pub fn new(
        field: impl Into<String>,
        options: Option<FieldOptions>,
        description: impl Into<String>,
    ) -> Self {
        let field = field.into();
        Self {
            column: None,
            options,
            description: description.into(),
            report: FieldReport::new(field),
        }
    }
}

/// Copy the source column, deciding whether the field is continuous or
/// categorical.
///
/// Non-missing cells are tallied: text equal to a configured missing
/// marker counts as missing, text that reads as a numeric literal (and
/// actual numbers) count as numeric, the rest as strings. Numeric-dominant
/// columns (ties included) are force-coerced, with coercion failures
/// becoming missing, and summarized by their min/max range. String-dominant
/// columns are copied verbatim and keep whatever options they already had.
pub fn copy(mut ctx: FieldContext, source: &Column, missing_markers: &[String]) -> FieldContext {
    let is_marker = |s: &str| missing_markers.iter().any(|m| m == s);

    let mut numeric = 0usize;
    let mut text = 0usize;
    let mut missing = 0usize;
    for cell in source {
        match cell {
            Cell::Missing => missing += 1,
            Cell::Number(_) => numeric += 1,
            Cell::Text(s) if is_marker(s) => missing += 1,
            Cell::Text(s) if crate::models::is_numeric_literal(s) => numeric += 1,
            Cell::Text(_) => text += 1,
        }
    }

    if numeric >= text {
        let coerced: Column = source
            .iter()
            .map(|cell| match cell {
                Cell::Text(s) if is_marker(s) => Cell::Missing,
                other => match other.coerce_numeric() {
                    Some(n) => Cell::Number(n),
                    None => Cell::Missing,
                },
            })
            .collect();
        let (min, max) = numeric_range(&coerced);
        ctx.options = Some(FieldOptions::continuous(min, max));
        ctx.column = Some(coerced);
        ctx.report.push(ReportEvent::Classified {
            numeric,
            text,
            missing,
            kind: FieldKind::Continuous,
        });
    } else {
        ctx.column = Some(source.clone());
        ctx.report.push(ReportEvent::Classified {
            numeric,
            text,
            missing,
            kind: FieldKind::Categorical,
        });
    }
    ctx
}

/// Min/max over the numeric cells, ignoring missing. An all-missing
/// column yields NaN bounds.
fn numeric_range(column: &Column) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut seen = false;
    for cell in column {
        if let Cell::Number(n) = cell {
            min = min.min(*n);
            max = max.max(*n);
            seen = true;
        }
    }
    if seen {
        (min, max)
    } else {
        (f64::NAN, f64::NAN)
    }
}

/// Substitute each source value through the mapping. Values absent from
/// the mapping (missing cells included) come out missing. The
/// description is left alone.
pub fn recode(
    mut ctx: FieldContext,
    source: &Column,
    mapping: &Map<String, Value>,
    audit: bool,
) -> FieldContext {
    let output: Column = source
        .iter()
        .map(|cell| match cell.key().and_then(|key| mapping.get(&key)) {
            Some(target) => Cell::from_value(target),
            None => Cell::Missing,
        })
        .collect();

    if audit {
        let audit = audit_recode(source, &output, mapping);
        ctx.report.push(ReportEvent::RecodeAudited { audit });
    }
    ctx.column = Some(output);
    ctx
}

/// Same transform as [`recode`], but the unified description follows the
/// first dataset's wording instead of the default.
pub fn recode_extend(
    ctx: FieldContext,
    source: &Column,
    mapping: &Map<String, Value>,
    description_a: &str,
    audit: bool,
) -> FieldContext {
    let mut ctx = recode(ctx, source, mapping, audit);
    ctx.description = description_a.to_string();
    ctx
}

/// Merge additional entries into the categorical options mapping.
///
/// Requires the working descriptor to already be categorical; applying
/// this to a continuous or absent descriptor is a usage error in the
/// instruction table and is surfaced, never papered over. New entries
/// overwrite existing keys; re-adding an identical pair is a no-op.
pub fn add_to_dict(
    mut ctx: FieldContext,
    additions: &Map<String, Value>,
) -> ActionResult<FieldContext> {
    let Some(FieldOptions::Categorical { options }) = ctx.options.as_mut() else {
        return Err(ActionError::NotCategorical);
    };
    for (key, label) in additions {
        options.insert(key.clone(), label.clone());
    }
    Ok(ctx)
}

/// Replace the options descriptor wholesale with a fresh enumeration,
/// marking the field categorical.
pub fn new_options(mut ctx: FieldContext, options: &Map<String, Value>) -> FieldContext {
    ctx.options = Some(FieldOptions::categorical(options.clone()));
    ctx
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn markers() -> Vec<String> {
        vec!["na".to_string()]
    }

    fn base_ctx(field: &str) -> FieldContext {
        FieldContext::new(field, None, "default description")
    }

    fn categorical_ctx(field: &str) -> FieldContext {
        let mut options = Map::new();
        options.insert("1".to_string(), json!("yes"));
        options.insert("2".to_string(), json!("no"));
        FieldContext::new(
            field,
            Some(FieldOptions::categorical(options)),
            "default description",
        )
    }

    #[test]
    fn test_copy_numeric_column_gets_range() {
        let source = Column::from_values(vec![json!("3"), json!(7), json!(null), json!("5")]);
        let ctx = copy(base_ctx("age"), &source, &markers());
        assert_eq!(
            ctx.options,
            Some(FieldOptions::continuous(3.0, 7.0))
        );
        let column = ctx.column.unwrap();
        assert_eq!(column.get(0), Some(&Cell::number(3.0)));
        assert_eq!(column.get(2), Some(&Cell::Missing));
    }

    #[test]
    fn test_copy_tie_break_favors_numeric() {
        let source = Column::from_values(vec![json!("1"), json!("abc")]);
        let ctx = copy(base_ctx("mixed"), &source, &markers());
        assert_eq!(ctx.report.classified_kind(), Some(FieldKind::Continuous));
        let column = ctx.column.unwrap();
        assert_eq!(column.get(0), Some(&Cell::number(1.0)));
        assert_eq!(column.get(1), Some(&Cell::Missing));
    }

    #[test]
    fn test_copy_string_column_kept_verbatim() {
        let source = Column::from_values(vec![json!("alto"), json!("bajo"), json!("1")]);
        let before = categorical_ctx("level");
        let expected_options = before.options.clone();
        let ctx = copy(before, &source, &markers());
        assert_eq!(ctx.report.classified_kind(), Some(FieldKind::Categorical));
        assert_eq!(ctx.column.unwrap().get(0), Some(&Cell::text("alto")));
        // options untouched on the categorical branch
        assert_eq!(ctx.options, expected_options);
    }

    #[test]
    fn test_copy_marker_counts_as_missing() {
        // without the marker, 'na' would tip the column to string-dominant
        let source = Column::from_values(vec![json!("na"), json!("na"), json!("4")]);
        let ctx = copy(base_ctx("weight"), &source, &markers());
        assert_eq!(ctx.report.classified_kind(), Some(FieldKind::Continuous));
        assert_eq!(
            ctx.options,
            Some(FieldOptions::continuous(4.0, 4.0))
        );

        // an empty marker list restores the raw tally
        let source = Column::from_values(vec![json!("na"), json!("na"), json!("4")]);
        let ctx = copy(base_ctx("weight"), &source, &[]);
        assert_eq!(ctx.report.classified_kind(), Some(FieldKind::Categorical));
    }

    #[test]
    fn test_recode_maps_and_drops_unmapped() {
        let source = Column::from_values(vec![json!("a"), json!("b"), json!("zzz"), json!(null)]);
        let mut mapping = Map::new();
        mapping.insert("a".to_string(), json!(1));
        mapping.insert("b".to_string(), json!(2));
        let ctx = recode(base_ctx("grade"), &source, &mapping, true);
        let column = ctx.column.unwrap();
        assert_eq!(column.get(0), Some(&Cell::number(1.0)));
        assert_eq!(column.get(1), Some(&Cell::number(2.0)));
        assert_eq!(column.get(2), Some(&Cell::Missing));
        assert_eq!(column.get(3), Some(&Cell::Missing));
        assert_eq!(ctx.description, "default description");
    }

    #[test]
    fn test_recode_audit_recorded() {
        let source = Column::from_values(vec![json!("a"), json!("a"), json!("b")]);
        let mut mapping = Map::new();
        mapping.insert("a".to_string(), json!(1));
        mapping.insert("b".to_string(), json!(2));
        let ctx = recode(base_ctx("grade"), &source, &mapping, true);
        assert_eq!(ctx.report.audits().count(), 1);
        assert!(ctx.report.audits_passed());

        let ctx2 = recode(
            FieldContext::new("grade", None, ""),
            &source,
            &mapping,
            false,
        );
        assert_eq!(ctx2.report.audits().count(), 0);
    }

    #[test]
    fn test_recode_extend_takes_first_dataset_description() {
        let source = Column::from_values(vec![json!("a")]);
        let mut mapping = Map::new();
        mapping.insert("a".to_string(), json!(1));
        let ctx = recode_extend(base_ctx("grade"), &source, &mapping, "older wording", true);
        assert_eq!(ctx.description, "older wording");
    }

    #[test]
    fn test_add_to_dict_merges_and_overwrites() {
        let mut additions = Map::new();
        additions.insert("9".to_string(), json!("unknown"));
        additions.insert("2".to_string(), json!("NO"));
        let ctx = add_to_dict(categorical_ctx("consent"), &additions).unwrap();
        let options = ctx.options.unwrap();
        let map = options.as_categorical().unwrap();
        assert_eq!(map.get("9"), Some(&json!("unknown")));
        assert_eq!(map.get("2"), Some(&json!("NO")));
        assert_eq!(map.get("1"), Some(&json!("yes")));
    }

    #[test]
    fn test_add_to_dict_is_idempotent() {
        let mut additions = Map::new();
        additions.insert("9".to_string(), json!("unknown"));
        let once = add_to_dict(categorical_ctx("consent"), &additions).unwrap();
        let twice = add_to_dict(once.clone(), &additions).unwrap();
        assert_eq!(once.options, twice.options);
    }

    #[test]
    fn test_add_to_dict_requires_categorical() {
        let additions = Map::new();
        let err = add_to_dict(base_ctx("consent"), &additions).unwrap_err();
        assert_eq!(err, ActionError::NotCategorical);

        let continuous = FieldContext::new(
            "consent",
            Some(FieldOptions::continuous(0.0, 1.0)),
            "",
        );
        let err = add_to_dict(continuous, &additions).unwrap_err();
        assert_eq!(err, ActionError::NotCategorical);
    }

    #[test]
    fn test_new_options_replaces_wholesale() {
        let mut replacement = Map::new();
        replacement.insert("A".to_string(), json!("first"));
        let ctx = new_options(
            FieldContext::new("group", Some(FieldOptions::continuous(0.0, 5.0)), ""),
            &replacement,
        );
        let options = ctx.options.unwrap();
        assert!(options.is_categorical());
        assert_eq!(
            options.as_categorical().unwrap().get("A"),
            Some(&json!("first"))
        );
    }
}
