//! Domain models for the harmonization engine.
//!
//! This module contains the core data structures used throughout a pass:
//!
//! - [`Cell`] - a single value with first-class missingness
//! - [`Column`] - an ordered sequence of cells
//! - [`Table`] - named columns sharing one row count
//! - [`FieldKind`] - continuous vs categorical classification
//! - [`FieldOptions`] - per-field options descriptor (enumerated codes or
//!   numeric range)

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Map, Value};

use crate::error::{HarmonizeError, PayloadError};

// =============================================================================
// Cells
// =============================================================================

/// A single tabular value.
///
/// Missing is an explicit state, not a sentinel: external layers map their
/// own null/NaN conventions onto [`Cell::Missing`] before handing tables
/// over, and get JSON `null` back out.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Missing,
}

static NUMERIC_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").unwrap());

/// Lexical test for strings that denote a number.
pub fn is_numeric_literal(s: &str) -> bool {
    NUMERIC_LITERAL.is_match(s.trim())
}

/// Render a number the way mapping keys are written: integral values
/// without a trailing `.0`, so `1`, `1.0` and `"1"` address the same key.
pub(crate) fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl Cell {
    pub fn number(n: f64) -> Self {
        Cell::Number(n)
    }

    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Numeric view of the cell: numbers pass through, text passes if it
    /// reads as a numeric literal, everything else is `None`.
    pub fn coerce_numeric(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) if is_numeric_literal(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Canonical key used to address this value in a recode mapping.
    /// Missing cells have no key.
    pub fn key(&self) -> Option<String> {
        match self {
            Cell::Number(n) => Some(format_number(*n)),
            Cell::Text(s) => Some(s.clone()),
            Cell::Missing => None,
        }
    }

    /// Convert a JSON value into a cell. `null` becomes [`Cell::Missing`].
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Cell::Missing,
            Value::Number(n) => match n.as_f64() {
                Some(f) => Cell::Number(f),
                None => Cell::Text(n.to_string()),
            },
            Value::String(s) => Cell::Text(s.clone()),
            Value::Bool(b) => Cell::Text(b.to_string()),
            other => Cell::Text(other.to_string()),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Cell::Number(n) => json!(n),
            Cell::Text(s) => Value::String(s.clone()),
            Cell::Missing => Value::Null,
        }
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Cell::from_value(&value))
    }
}

// =============================================================================
// Columns
// =============================================================================

/// An ordered column of cells.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Column(Vec<Cell>);

impl Column {
    pub fn new() -> Self {
        Column(Vec::new())
    }

    pub fn from_cells(cells: Vec<Cell>) -> Self {
        Column(cells)
    }

    /// Build a column from JSON values (`null` → missing).
    pub fn from_values(values: Vec<Value>) -> Self {
        values.iter().map(Cell::from_value).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, cell: Cell) {
        self.0.push(cell);
    }

    pub fn get(&self, index: usize) -> Option<&Cell> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cell> {
        self.0.iter()
    }

    pub fn missing_count(&self) -> usize {
        self.0.iter().filter(|c| c.is_missing()).count()
    }
}

impl From<Vec<Cell>> for Column {
    fn from(cells: Vec<Cell>) -> Self {
        Column(cells)
    }
}

impl FromIterator<Cell> for Column {
    fn from_iter<I: IntoIterator<Item = Cell>>(iter: I) -> Self {
        Column(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Column {
    type Item = &'a Cell;
    type IntoIter = std::slice::Iter<'a, Cell>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// =============================================================================
// Tables
// =============================================================================

/// Named columns sharing one row count, in insertion order.
///
/// This is the format-agnostic in-memory form of the source and unified
/// data tables; reading and writing any on-disk format is the caller's
/// concern.
#[derive(Debug, Clone, Default)]
pub struct Table {
    row_count: usize,
    columns: Vec<(String, Column)>,
}

impl Table {
    pub fn new() -> Self {
        Table::default()
    }

    /// An empty table that will only accept columns of `row_count` rows.
    pub fn with_row_count(row_count: usize) -> Self {
        Table {
            row_count,
            columns: Vec::new(),
        }
    }

    /// Build a table from `(name, column)` pairs, validating row counts.
    pub fn from_columns(
        pairs: impl IntoIterator<Item = (String, Column)>,
    ) -> Result<Self, HarmonizeError> {
        let mut table = Table::new();
        for (name, column) in pairs {
            table.insert(name, column)?;
        }
        Ok(table)
    }

    /// Insert a column, replacing any existing column of the same name.
    ///
    /// The first column inserted into a fresh table fixes the row count.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        column: Column,
    ) -> Result<(), HarmonizeError> {
        let name = name.into();
        if self.columns.is_empty() && self.row_count == 0 {
            self.row_count = column.len();
        } else if column.len() != self.row_count {
            return Err(HarmonizeError::RowCountMismatch {
                column: name,
                actual: column.len(),
                expected: self.row_count,
            });
        }
        if let Some(slot) = self.columns.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = column;
        } else {
            self.columns.push((name, column));
        }
        Ok(())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(n, c)| (n.as_str(), c))
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

// =============================================================================
// Field Classification
// =============================================================================

/// How a unified field's legal values are described.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Summarized by a numeric min/max range.
    Continuous,
    /// Drawn from an enumerated code → label mapping.
    Categorical,
}

// =============================================================================
// Options Descriptors
// =============================================================================

/// Per-field options descriptor.
///
/// Serialized forms:
/// - categorical: `{"options": {"1": "yes", "2": "no"}, "is_category": true}`
/// - continuous: `{"min": 18.0, "max": 99.0}`
///
/// An absent descriptor renders as `{}`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOptions {
    Categorical { options: Map<String, Value> },
    Continuous { min: f64, max: f64 },
}

impl FieldOptions {
    pub fn categorical(options: Map<String, Value>) -> Self {
        FieldOptions::Categorical { options }
    }

    pub fn continuous(min: f64, max: f64) -> Self {
        FieldOptions::Continuous { min, max }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldOptions::Categorical { .. } => FieldKind::Categorical,
            FieldOptions::Continuous { .. } => FieldKind::Continuous,
        }
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self, FieldOptions::Categorical { .. })
    }

    /// The enumerated mapping, if categorical.
    pub fn as_categorical(&self) -> Option<&Map<String, Value>> {
        match self {
            FieldOptions::Categorical { options } => Some(options),
            FieldOptions::Continuous { .. } => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            FieldOptions::Categorical { options } => json!({
                "options": options,
                "is_category": true,
            }),
            FieldOptions::Continuous { min, max } => json!({
                "min": min,
                "max": max,
            }),
        }
    }

    /// Serialize a possibly-absent descriptor for the unified dictionary.
    pub fn render(descriptor: Option<&FieldOptions>) -> String {
        match descriptor {
            Some(d) => d.to_value().to_string(),
            None => "{}".to_string(),
        }
    }

    /// Parse a serialized descriptor from an instruction row.
    ///
    /// Absent or empty payloads are not an error: the field simply has no
    /// descriptor yet. Malformed payloads also fall back to no descriptor,
    /// but report why.
    pub fn parse(raw: Option<&str>) -> (Option<Self>, Option<PayloadError>) {
        let raw = match raw {
            Some(r) if !r.trim().is_empty() => r,
            _ => return (None, None),
        };

        let value: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => return (None, Some(PayloadError::Syntax(e.to_string()))),
        };

        let obj = match value.as_object() {
            Some(o) => o,
            None => {
                return (
                    None,
                    Some(PayloadError::Shape("expected a JSON object".into())),
                )
            }
        };

        if let Some(options) = obj.get("options") {
            return match options.as_object() {
                Some(map) => (Some(FieldOptions::categorical(map.clone())), None),
                None => (
                    None,
                    Some(PayloadError::Shape("'options' is not an object".into())),
                ),
            };
        }

        if obj.is_empty() {
            return (None, None);
        }

        match (
            obj.get("min").and_then(Value::as_f64),
            obj.get("max").and_then(Value::as_f64),
        ) {
            (Some(min), Some(max)) => (Some(FieldOptions::continuous(min, max)), None),
            _ => (
                None,
                Some(PayloadError::Shape(
                    "expected an 'options' mapping or a min/max range".into(),
                )),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_literal() {
        assert!(is_numeric_literal("42"));
        assert!(is_numeric_literal("-3.5"));
        assert!(is_numeric_literal(".5"));
        assert!(is_numeric_literal("1e6"));
        assert!(is_numeric_literal(" 7 "));
        assert!(!is_numeric_literal("na"));
        assert!(!is_numeric_literal("12a"));
        assert!(!is_numeric_literal(""));
    }

    #[test]
    fn test_cell_key_renders_integers_plainly() {
        assert_eq!(Cell::number(1.0).key().unwrap(), "1");
        assert_eq!(Cell::number(2.5).key().unwrap(), "2.5");
        assert_eq!(Cell::text("1").key().unwrap(), "1");
        assert!(Cell::Missing.key().is_none());
    }

    #[test]
    fn test_cell_coercion() {
        assert_eq!(Cell::text("7").coerce_numeric(), Some(7.0));
        assert_eq!(Cell::number(7.0).coerce_numeric(), Some(7.0));
        assert_eq!(Cell::text("abc").coerce_numeric(), None);
        assert_eq!(Cell::Missing.coerce_numeric(), None);
    }

    #[test]
    fn test_cell_json_round_trip() {
        assert_eq!(Cell::from_value(&json!(null)), Cell::Missing);
        assert_eq!(Cell::from_value(&json!(3)), Cell::number(3.0));
        assert_eq!(Cell::from_value(&json!("x")), Cell::text("x"));
        assert_eq!(Cell::Missing.to_value(), Value::Null);
    }

    #[test]
    fn test_table_insert_and_replace() {
        let mut table = Table::new();
        table
            .insert("a", Column::from_values(vec![json!(1), json!(2)]))
            .unwrap();
        table
            .insert("b", Column::from_values(vec![json!("x"), json!("y")]))
            .unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.width(), 2);
        assert_eq!(table.column_names(), vec!["a", "b"]);

        // same name replaces in place
        table
            .insert("a", Column::from_values(vec![json!(9), json!(8)]))
            .unwrap();
        assert_eq!(table.width(), 2);
        assert_eq!(table.column("a").unwrap().get(0), Some(&Cell::number(9.0)));
    }

    #[test]
    fn test_table_rejects_row_count_mismatch() {
        let mut table = Table::with_row_count(3);
        let err = table
            .insert("short", Column::from_values(vec![json!(1)]))
            .unwrap_err();
        assert!(err.to_string().contains("expects 3"));
    }

    #[test]
    fn test_options_parse_categorical() {
        let raw = r#"{"options": {"1": "yes", "2": "no"}}"#;
        let (parsed, err) = FieldOptions::parse(Some(raw));
        assert!(err.is_none());
        let parsed = parsed.unwrap();
        assert!(parsed.is_categorical());
        assert_eq!(
            parsed.as_categorical().unwrap().get("1"),
            Some(&json!("yes"))
        );
    }

    #[test]
    fn test_options_parse_continuous_and_empty() {
        let (parsed, err) = FieldOptions::parse(Some(r#"{"min": 0, "max": 10}"#));
        assert!(err.is_none());
        assert_eq!(parsed, Some(FieldOptions::continuous(0.0, 10.0)));

        let (parsed, err) = FieldOptions::parse(Some("{}"));
        assert!(parsed.is_none());
        assert!(err.is_none());

        let (parsed, err) = FieldOptions::parse(None);
        assert!(parsed.is_none());
        assert!(err.is_none());
    }

    #[test]
    fn test_options_parse_malformed() {
        let (parsed, err) = FieldOptions::parse(Some("{'single': 'quotes'}"));
        assert!(parsed.is_none());
        assert!(matches!(err, Some(PayloadError::Syntax(_))));

        let (parsed, err) = FieldOptions::parse(Some(r#"{"weird": true}"#));
        assert!(parsed.is_none());
        assert!(matches!(err, Some(PayloadError::Shape(_))));
    }

    #[test]
    fn test_options_render() {
        let mut map = Map::new();
        map.insert("1".to_string(), json!("yes"));
        let rendered = FieldOptions::render(Some(&FieldOptions::categorical(map)));
        assert!(rendered.contains("\"options\""));
        assert!(rendered.contains("\"is_category\":true"));

        assert_eq!(FieldOptions::render(None), "{}");
    }
}
