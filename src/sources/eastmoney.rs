/// Shared pieces of the Eastmoney quote endpoints: kline decoding, market
/// prefixes, numeric cells.
use anyhow::{Context, bail};
use serde::Deserialize;
use serde_json::{Number, Value};

use crate::types::Table;

pub const KLINE_URL: &str = "https://push2his.eastmoney.com/api/qt/stock/kline/get";

/// Kline fields: date, open, close, high, low, volume, amount, amplitude,
/// change %, change, turnover.
pub const KLINE_FIELDS: &str = "f51,f52,f53,f54,f55,f56,f57,f58,f59,f60,f61";

/// Column names for the kline fields, in field order.
pub const KLINE_COLUMNS: [&str; 11] = [
    "日期", "开盘", "收盘", "最高", "最低", "成交量", "成交额", "振幅", "涨跌幅", "涨跌额", "换手率",
];

#[derive(Deserialize, Debug)]
pub struct KlineResponse {
    pub data: Option<KlineData>,
}

#[derive(Deserialize, Debug)]
pub struct KlineData {
    pub code: String,
    #[serde(default)]
    pub klines: Vec<String>,
}

/// `period` → `klt` code.
///
/// # Errors
///
/// Fails for anything but daily, weekly or monthly.
pub fn period_code(period: &str) -> anyhow::Result<&'static str> {
    match period {
        "daily" => Ok("101"),
        "weekly" => Ok("102"),
        "monthly" => Ok("103"),
        other => bail!("invalid period '{other}': expected one of daily, weekly, monthly"),
    }
}

/// `adjust` → `fqt` code.
///
/// # Errors
///
/// Fails for anything but "", qfq or hfq.
pub fn adjust_code(adjust: &str) -> anyhow::Result<&'static str> {
    match adjust {
        "" => Ok("0"),
        "qfq" => Ok("1"),
        "hfq" => Ok("2"),
        other => bail!("invalid adjust '{other}': expected one of \"\", qfq, hfq"),
    }
}

/// Shanghai codes start with 6; everything else trades in Shenzhen.
#[must_use]
pub fn stock_secid(symbol: &str) -> String {
    let market = u8::from(symbol.starts_with('6'));
    format!("{market}.{symbol}")
}

/// Numeric cell from Eastmoney text: `-` and empty become null, integers stay
/// integers, anything unparsable stays text.
#[must_use]
pub fn number_cell(raw: &str) -> Value {
    let raw = raw.trim();
    if raw.is_empty() || raw == "-" {
        return Value::Null;
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Value::from(i);
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map_or_else(|| Value::String(raw.to_owned()), Value::Number)
}

/// Numeric JSON cell: the `-` placeholder becomes null.
#[must_use]
pub fn json_cell(value: Option<&Value>) -> Value {
    match value {
        None => Value::Null,
        Some(Value::String(s)) if s.trim() == "-" || s.trim().is_empty() => Value::Null,
        Some(other) => other.clone(),
    }
}

/// Decode kline rows into a table.
///
/// With `code_column`, the security code is inserted as the second column,
/// right after the date.
///
/// # Errors
///
/// Fails when a kline line has the wrong number of fields.
pub fn kline_table(klines: &[String], code_column: Option<(&str, &str)>) -> anyhow::Result<Table> {
    let mut columns: Vec<&str> = KLINE_COLUMNS.to_vec();
    if let Some((name, _)) = code_column {
        columns.insert(1, name);
    }
    let mut table = Table::new(columns);

    for line in klines {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != KLINE_COLUMNS.len() {
            bail!(
                "malformed kline '{line}': expected {} fields, got {}",
                KLINE_COLUMNS.len(),
                fields.len()
            );
        }
        let mut row = Vec::with_capacity(fields.len() + 1);
        row.push(Value::String(fields[0].to_owned()));
        if let Some((_, code)) = code_column {
            row.push(Value::String(code.to_owned()));
        }
        row.extend(fields[1..].iter().map(|f| number_cell(f)));
        table.push_row(row).context("kline row does not fit the table")?;
    }
    Ok(table)
}
