/// Result values returned by registry functions.
///
/// Every handler produces an [`Output`]; the renderers in `cli::output` only
/// ever look at this shape, never at the function that produced it.
use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

/// What a registry function hands back.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// Rows of named columns.
    Table(Table),
    /// A string-keyed map, kept in insertion order.
    #[allow(dead_code)]
    Mapping(Map<String, Value>),
    /// Any single value.
    #[allow(dead_code)]
    Scalar(Value),
}

/// A row/column shape mismatch while building a [`Table`].
#[derive(Debug, Error, PartialEq, Eq)]
#[error("row has {got} cells but the table has {expected} columns")]
pub struct ShapeError {
    /// Column count of the table.
    pub expected: usize,
    /// Cell count of the rejected row.
    pub got: usize,
}

/// Ordered columns plus rows of JSON-compatible cells.
///
/// Every row has exactly `columns.len()` cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// An empty table with the given column names.
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row.
    ///
    /// # Errors
    ///
    /// Returns `ShapeError` if the row length differs from the column count.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), ShapeError> {
        if row.len() != self.columns.len() {
            return Err(ShapeError {
                expected: self.columns.len(),
                got: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows as column-name → cell objects, in column order.
    #[must_use]
    pub fn records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }
}

impl fmt::Display for Output {
    /// The default string form, used by `pretty` for non-tables and by `raw`
    /// for everything.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table(table) => write!(f, "{}", crate::cli::output::plain_table(table)),
            Self::Mapping(map) => write!(f, "{}", Value::Object(map.clone())),
            Self::Scalar(value) => f.write_str(&scalar_text(value)),
        }
    }
}

/// String form of a single value: strings bare, everything else as JSON text.
#[must_use]
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_push_row_rejects_wrong_width() {
        let mut table = Table::new(["a", "b"]);
        assert_eq!(
            table.push_row(vec![json!(1)]),
            Err(ShapeError {
                expected: 2,
                got: 1
            })
        );
        assert!(table.is_empty());
    }

    #[test]
    fn test_records_keep_column_order() {
        let mut table = Table::new(["日期", "开盘", "收盘"]);
        table
            .push_row(vec![json!("2024-01-02"), json!(9.39), json!(9.21)])
            .unwrap();
        let records = table.records();
        assert_eq!(records.len(), 1);
        let keys: Vec<&String> = records[0].keys().collect();
        assert_eq!(keys, ["日期", "开盘", "收盘"]);
    }

    #[test]
    fn test_scalar_text() {
        assert_eq!(scalar_text(&json!("平安银行")), "平安银行");
        assert_eq!(scalar_text(&json!(3.5)), "3.5");
        assert_eq!(scalar_text(&Value::Null), "null");
    }

    #[test]
    fn test_display_mapping_is_compact_json() {
        let mut map = Map::new();
        map.insert("code".to_owned(), json!("000001"));
        map.insert("open".to_owned(), json!(true));
        assert_eq!(
            Output::Mapping(map).to_string(),
            r#"{"code":"000001","open":true}"#
        );
    }
}
