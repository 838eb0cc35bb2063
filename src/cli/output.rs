/// Output formatting: JSON, CSV, pretty and raw renderings of a call result.
use std::io::Write;

use comfy_table::presets::{NOTHING, UTF8_BORDERS_ONLY};
use comfy_table::{Cell, CellAlignment, Table as TextTable};
use serde_json::Value;

use super::args::OutputFormat;
use crate::registry::InvokeError;
use crate::types::{Output, Table, scalar_text};

/// Render a result in the requested format.
///
/// # Errors
///
/// - `InvokeError::UnsupportedFormat` — CSV for a non-table result
/// - `InvokeError::Json` — JSON serialization failed
pub fn render(output: &Output, format: OutputFormat) -> Result<String, InvokeError> {
    match format {
        OutputFormat::Json => render_json(output),
        OutputFormat::Csv => match output {
            Output::Table(table) => Ok(render_csv(table)),
            _ => Err(InvokeError::UnsupportedFormat),
        },
        OutputFormat::Pretty => Ok(match output {
            Output::Table(table) => pretty_table(table),
            other => other.to_string(),
        }),
        OutputFormat::Raw => Ok(output.to_string()),
    }
}

fn render_json(output: &Output) -> Result<String, InvokeError> {
    let text = match output {
        Output::Table(table) => serde_json::to_string_pretty(&table.records())?,
        Output::Mapping(map) => serde_json::to_string_pretty(map)?,
        Output::Scalar(value) => serde_json::to_string(&scalar_text(value))?,
    };
    Ok(text)
}

// --- CSV ---

/// Header line plus one line per row, no index column.
fn render_csv(table: &Table) -> String {
    let mut out = String::new();
    push_csv_line(&mut out, table.columns().iter().map(String::as_str));
    for row in table.rows() {
        let cells: Vec<String> = row.iter().map(csv_cell).collect();
        push_csv_line(&mut out, cells.iter().map(String::as_str));
    }
    // The caller prints with a trailing newline.
    out.pop();
    out
}

fn push_csv_line<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&csv_quote(field));
    }
    out.push('\n');
}

fn csv_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => scalar_text(other),
    }
}

/// Minimal quoting: only fields containing a separator, quote or line break.
fn csv_quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_owned()
    }
}

// --- Text tables ---

/// Bordered table used by `pretty`.
#[must_use]
pub fn pretty_table(table: &Table) -> String {
    text_table(table, UTF8_BORDERS_ONLY)
}

/// Borderless aligned table; the default string form of a table.
#[must_use]
pub fn plain_table(table: &Table) -> String {
    text_table(table, NOTHING)
}

fn text_table(table: &Table, preset: &str) -> String {
    if table.is_empty() {
        return format!("Empty table\nColumns: [{}]", table.columns().join(", "));
    }

    let mut text = TextTable::new();
    text.load_preset(preset);

    let mut header = vec![Cell::new("")];
    header.extend(table.columns().iter().map(Cell::new));
    text.set_header(header);

    for (index, row) in table.rows().iter().enumerate() {
        let mut cells = vec![Cell::new(index).set_alignment(CellAlignment::Right)];
        cells.extend(row.iter().map(text_cell));
        text.add_row(cells);
    }

    text.to_string()
}

fn text_cell(value: &Value) -> Cell {
    match value {
        Value::Null => Cell::new("NaN").set_alignment(CellAlignment::Right),
        Value::Number(n) => Cell::new(n).set_alignment(CellAlignment::Right),
        other => Cell::new(scalar_text(other)),
    }
}

// --- Error output ---

/// Write a one-line diagnostic to stderr.
pub fn write_error(err: &InvokeError) {
    let stderr = std::io::stderr();
    let mut out = stderr.lock();
    let _ = writeln!(out, "Error: {err}");
}

// --- Debug timer ---

/// A RAII timer that emits a `debug` event with the elapsed milliseconds on
/// drop.
pub struct StageTimer {
    stage: &'static str,
    start: std::time::Instant,
}

impl StageTimer {
    #[must_use]
    pub fn new(stage: &'static str) -> Self {
        Self {
            stage,
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for StageTimer {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        tracing::debug!(stage = self.stage, elapsed_ms, "stage finished");
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::{Map, json};

    use super::*;

    fn bars() -> Table {
        let mut table = Table::new(["日期", "股票代码", "开盘", "收盘", "成交量"]);
        table
            .push_row(vec![json!("2024-01-02"), json!("000001"), json!(9.39), json!(9.21), json!(1_158_366)])
            .unwrap();
        table
            .push_row(vec![json!("2024-01-03"), json!("000001"), json!(9.19), json!(9.2), Value::Null])
            .unwrap();
        table
    }

    #[test]
    fn test_json_table_is_array_of_records() {
        let text = render(&Output::Table(bars()), OutputFormat::Json).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        let rows = parsed.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        let keys: Vec<&String> = rows[0].as_object().unwrap().keys().collect();
        assert_eq!(keys, ["日期", "股票代码", "开盘", "收盘", "成交量"]);
        assert_eq!(rows[1]["成交量"], Value::Null);
        // Non-ASCII preserved, two-space indent.
        assert!(text.contains("\"日期\": \"2024-01-02\""));
        assert!(text.starts_with("[\n  {\n    \""));
    }

    #[test]
    fn test_json_mapping_and_scalar() {
        let mut map = Map::new();
        map.insert("name".to_owned(), json!("平安银行"));
        let text = render(&Output::Mapping(map), OutputFormat::Json).unwrap();
        assert_eq!(text, "{\n  \"name\": \"平安银行\"\n}");

        let text = render(&Output::Scalar(json!(1.5)), OutputFormat::Json).unwrap();
        assert_eq!(text, "\"1.5\"");
        let text = render(&Output::Scalar(json!("上证")), OutputFormat::Json).unwrap();
        assert_eq!(text, "\"上证\"");
    }

    #[test]
    fn test_csv_header_matches_columns() {
        let table = bars();
        let text = render(&Output::Table(table.clone()), OutputFormat::Csv).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        let header: Vec<&str> = lines[0].split(',').collect();
        assert_eq!(header, table.columns());
        assert_eq!(lines[1], "2024-01-02,000001,9.39,9.21,1158366");
        assert_eq!(lines[2], "2024-01-03,000001,9.19,9.2,");
        assert!(!text.ends_with('\n'));
    }

    #[test]
    fn test_csv_quotes_when_needed() {
        let mut table = Table::new(["item", "value"]);
        table
            .push_row(vec![json!("行业"), json!("银行, 金融")])
            .unwrap();
        table.push_row(vec![json!("say"), json!("\"hi\"")]).unwrap();
        let text = render(&Output::Table(table), OutputFormat::Csv).unwrap();
        assert_eq!(text, "item,value\n行业,\"银行, 金融\"\nsay,\"\"\"hi\"\"\"");
    }

    #[test]
    fn test_csv_rejects_non_tables() {
        let err = render(&Output::Scalar(json!(3)), OutputFormat::Csv).unwrap_err();
        assert!(matches!(err, InvokeError::UnsupportedFormat));
        let err = render(&Output::Mapping(Map::new()), OutputFormat::Csv).unwrap_err();
        assert!(matches!(err, InvokeError::UnsupportedFormat));
    }

    #[test]
    fn test_pretty_and_raw_non_empty() {
        let output = Output::Table(bars());
        for format in [OutputFormat::Pretty, OutputFormat::Raw] {
            let text = render(&output, format).unwrap();
            assert!(!text.trim().is_empty());
            assert!(text.contains("股票代码"));
            assert!(text.contains("9.39"));
            assert!(text.contains("NaN"));
        }
    }

    #[test]
    fn test_pretty_has_borders_raw_does_not() {
        let output = Output::Table(bars());
        let pretty = render(&output, OutputFormat::Pretty).unwrap();
        let raw = render(&output, OutputFormat::Raw).unwrap();
        assert!(pretty.contains('─'));
        assert!(!raw.contains('─'));
    }

    #[test]
    fn test_scalar_default_string_form() {
        let output = Output::Scalar(json!("1.10.3"));
        assert_eq!(render(&output, OutputFormat::Pretty).unwrap(), "1.10.3");
        assert_eq!(render(&output, OutputFormat::Raw).unwrap(), "1.10.3");
    }

    #[test]
    fn test_empty_table() {
        let output = Output::Table(Table::new(["日期", "开盘"]));
        let text = render(&output, OutputFormat::Pretty).unwrap();
        assert_eq!(text, "Empty table\nColumns: [日期, 开盘]");
        assert_eq!(render(&output, OutputFormat::Raw).unwrap(), text);
        assert_eq!(render(&output, OutputFormat::Json).unwrap(), "[]");
        assert_eq!(render(&output, OutputFormat::Csv).unwrap(), "日期,开盘");
    }
}
