/// A-share quote functions: daily history, market-wide spot, company profile.
use anyhow::{Context, bail};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::Session;
use super::eastmoney::{
    KLINE_FIELDS, KLINE_URL, KlineResponse, adjust_code, json_cell, kline_table, number_cell, period_code,
    stock_secid,
};
use crate::registry::Kwargs;
use crate::types::{Output, Table};

const HIST_UT: &str = "7eea3edcaed734bea9cbfc24409ed989";

const SPOT_URL: &str = "https://82.push2.eastmoney.com/api/qt/clist/get";
const SPOT_UT: &str = "bd1d9ddb04089700cf9c27f6f7426281";
/// Shanghai + Shenzhen main boards, ChiNext, STAR, Beijing.
const SPOT_MARKETS: &str = "m:0 t:6,m:0 t:80,m:1 t:2,m:1 t:23,m:0 t:81 s:2048";
const SPOT_PAGE_SIZE: usize = 100;

/// Column name → Eastmoney field, in output order (after `序号`).
const SPOT_COLUMNS: [(&str, &str); 22] = [
    ("代码", "f12"),
    ("名称", "f14"),
    ("最新价", "f2"),
    ("涨跌幅", "f3"),
    ("涨跌额", "f4"),
    ("成交量", "f5"),
    ("成交额", "f6"),
    ("振幅", "f7"),
    ("最高", "f15"),
    ("最低", "f16"),
    ("今开", "f17"),
    ("昨收", "f18"),
    ("量比", "f10"),
    ("换手率", "f8"),
    ("市盈率-动态", "f9"),
    ("市净率", "f23"),
    ("总市值", "f20"),
    ("流通市值", "f21"),
    ("涨速", "f22"),
    ("5分钟涨跌", "f11"),
    ("60日涨跌幅", "f24"),
    ("年初至今涨跌幅", "f25"),
];

const SINA_COUNT_URL: &str =
    "https://vip.stock.finance.sina.com.cn/quotes_service/api/json_v2.php/Market_Center.getHQNodeStockCount";
const SINA_DATA_URL: &str =
    "https://vip.stock.finance.sina.com.cn/quotes_service/api/json_v2.php/Market_Center.getHQNodeData";
const SINA_NODE: &str = "hs_a";
const SINA_PAGE_SIZE: usize = 80;

/// Column name → Sina field, in output order.
const SINA_COLUMNS: [(&str, &str); 14] = [
    ("代码", "symbol"),
    ("名称", "name"),
    ("最新价", "trade"),
    ("涨跌额", "pricechange"),
    ("涨跌幅", "changepercent"),
    ("买入", "buy"),
    ("卖出", "sell"),
    ("昨收", "settlement"),
    ("今开", "open"),
    ("最高", "high"),
    ("最低", "low"),
    ("成交量", "volume"),
    ("成交额", "amount"),
    ("时间戳", "ticktime"),
];

/// Sina fields kept as text; the rest arrive as numeric strings.
const SINA_TEXT_FIELDS: [&str; 3] = ["symbol", "name", "ticktime"];

const INFO_URL: &str = "https://push2.eastmoney.com/api/qt/stock/get";
const INFO_UT: &str = "fa5fd1943c7b386f172d6893dbfba10b";

/// Item label → Eastmoney field, in output order.
const INFO_ITEMS: [(&str, &str); 9] = [
    ("最新", "f43"),
    ("股票代码", "f57"),
    ("股票简称", "f58"),
    ("总股本", "f84"),
    ("流通股", "f85"),
    ("总市值", "f116"),
    ("流通市值", "f117"),
    ("行业", "f127"),
    ("上市时间", "f189"),
];

/// `stock_zh_a_hist`: daily/weekly/monthly bars for one A-share.
pub fn stock_zh_a_hist(session: &Session, kwargs: &Kwargs) -> anyhow::Result<Output> {
    let symbol = kwargs.str("symbol")?;
    let query = [
        ("fields1", "f1,f2,f3,f4,f5,f6".to_owned()),
        ("fields2", KLINE_FIELDS.to_owned()),
        ("ut", HIST_UT.to_owned()),
        ("klt", period_code(kwargs.str("period")?)?.to_owned()),
        ("fqt", adjust_code(kwargs.str("adjust")?)?.to_owned()),
        ("secid", stock_secid(symbol)),
        ("beg", compact_date(kwargs, "start_date")?),
        ("end", compact_date(kwargs, "end_date")?),
    ];
    let response: KlineResponse = session.get_json(KLINE_URL, &query, kwargs.opt_float("timeout")?)?;
    hist_table(symbol, response).map(Output::Table)
}

fn hist_table(symbol: &str, response: KlineResponse) -> anyhow::Result<Table> {
    match response.data {
        Some(data) => kline_table(&data.klines, Some(("股票代码", data.code.as_str()))),
        None => {
            tracing::debug!(symbol, "no kline data");
            kline_table(&[], Some(("股票代码", symbol)))
        }
    }
}

pub(super) fn compact_date(kwargs: &Kwargs, name: &str) -> anyhow::Result<String> {
    Ok(kwargs.date(name)?.format("%Y%m%d").to_string())
}

#[derive(Deserialize, Debug)]
struct SpotResponse {
    data: Option<SpotPage>,
}

#[derive(Deserialize, Debug)]
struct SpotPage {
    total: usize,
    #[serde(default)]
    diff: Vec<Map<String, Value>>,
}

/// `stock_zh_a_spot_em`: real-time quotes for every listed A-share.
pub fn stock_zh_a_spot_em(session: &Session, kwargs: &Kwargs) -> anyhow::Result<Output> {
    let timeout = kwargs.opt_float("timeout")?;
    let fields = SPOT_COLUMNS.iter().map(|(_, f)| *f).collect::<Vec<_>>().join(",");

    let mut quotes: Vec<Map<String, Value>> = Vec::new();
    for page in 1.. {
        let query = [
            ("pn", page.to_string()),
            ("pz", SPOT_PAGE_SIZE.to_string()),
            ("po", "1".to_owned()),
            ("np", "1".to_owned()),
            ("ut", SPOT_UT.to_owned()),
            ("fltt", "2".to_owned()),
            ("invt", "2".to_owned()),
            ("fid", "f3".to_owned()),
            ("fs", SPOT_MARKETS.to_owned()),
            ("fields", fields.clone()),
        ];
        let response: SpotResponse = session.get_json(SPOT_URL, &query, timeout)?;
        let Some(page_data) = response.data else { break };
        let fetched = page_data.diff.len();
        quotes.extend(page_data.diff);
        tracing::debug!(page, fetched, total = page_data.total, "spot page");
        if fetched == 0 || quotes.len() >= page_data.total {
            break;
        }
    }

    spot_table(&quotes).map(Output::Table)
}

fn spot_table(quotes: &[Map<String, Value>]) -> anyhow::Result<Table> {
    let mut columns = vec!["序号"];
    columns.extend(SPOT_COLUMNS.iter().map(|(name, _)| *name));
    let mut table = Table::new(columns);

    for (index, quote) in quotes.iter().enumerate() {
        let mut row = vec![Value::from(index + 1)];
        row.extend(SPOT_COLUMNS.iter().map(|(_, field)| json_cell(quote.get(*field))));
        table.push_row(row)?;
    }
    Ok(table)
}

/// `stock_zh_a_spot`: real-time quotes for every A-share from Sina.
pub fn stock_zh_a_spot(session: &Session, kwargs: &Kwargs) -> anyhow::Result<Output> {
    let timeout = kwargs.opt_float("timeout")?;
    let count: Value = session.get_json(SINA_COUNT_URL, &[("node", SINA_NODE.to_owned())], timeout)?;
    let pages = sina_count(&count)?.div_ceil(SINA_PAGE_SIZE);

    let mut quotes: Vec<Map<String, Value>> = Vec::new();
    for page in 1..=pages {
        let query = [
            ("page", page.to_string()),
            ("num", SINA_PAGE_SIZE.to_string()),
            ("sort", "symbol".to_owned()),
            ("asc", "1".to_owned()),
            ("node", SINA_NODE.to_owned()),
            ("symbol", String::new()),
            ("_s_r_a", "page".to_owned()),
        ];
        let rows: Option<Vec<Map<String, Value>>> = session.get_json(SINA_DATA_URL, &query, timeout)?;
        let rows = rows.unwrap_or_default();
        tracing::debug!(page, pages, fetched = rows.len(), "sina spot page");
        if rows.is_empty() {
            break;
        }
        quotes.extend(rows);
    }

    sina_table(&quotes).map(Output::Table)
}

/// The count endpoint answers with a quoted number, e.g. `"5386"`.
fn sina_count(value: &Value) -> anyhow::Result<usize> {
    let count = match value {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        _ => None,
    };
    count.with_context(|| format!("unexpected stock count {value}"))
}

fn sina_table(quotes: &[Map<String, Value>]) -> anyhow::Result<Table> {
    let mut table = Table::new(SINA_COLUMNS.iter().map(|(name, _)| *name));
    for quote in quotes {
        let row = SINA_COLUMNS
            .iter()
            .map(|(_, field)| match quote.get(*field) {
                Some(Value::String(s)) if !SINA_TEXT_FIELDS.contains(field) => number_cell(s),
                other => json_cell(other),
            })
            .collect();
        table.push_row(row)?;
    }
    Ok(table)
}

#[derive(Deserialize, Debug)]
struct InfoResponse {
    data: Option<Map<String, Value>>,
}

/// `stock_individual_info_em`: profile of one A-share as item/value rows.
pub fn stock_individual_info_em(session: &Session, kwargs: &Kwargs) -> anyhow::Result<Output> {
    let symbol = kwargs.str("symbol")?;
    let fields = INFO_ITEMS.iter().map(|(_, f)| *f).collect::<Vec<_>>().join(",");
    let query = [
        ("ut", INFO_UT.to_owned()),
        ("fltt", "2".to_owned()),
        ("invt", "2".to_owned()),
        ("fields", fields),
        ("secid", stock_secid(symbol)),
    ];
    let response: InfoResponse = session.get_json(INFO_URL, &query, kwargs.opt_float("timeout")?)?;
    let data = response
        .data
        .with_context(|| format!("no profile data for symbol '{symbol}'"))?;
    info_table(&data).map(Output::Table)
}

fn info_table(data: &Map<String, Value>) -> anyhow::Result<Table> {
    if data.is_empty() {
        bail!("empty profile response");
    }
    let mut table = Table::new(["item", "value"]);
    for (label, field) in INFO_ITEMS {
        table.push_row(vec![Value::from(label), json_cell(data.get(field))])?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::registry::ArgValue;

    #[test]
    fn test_hist_table_without_data_keeps_columns() {
        let response: KlineResponse = serde_json::from_str(r#"{"data":null}"#).unwrap();
        let table = hist_table("000001", response).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns().len(), 12);
        assert_eq!(table.columns()[1], "股票代码");
    }

    #[test]
    fn test_compact_date_accepts_both_forms() {
        let mut kwargs = Kwargs::new();
        kwargs.insert("start_date", ArgValue::Str("2024-01-10".to_owned()));
        kwargs.insert(
            "end_date",
            ArgValue::Date(chrono::NaiveDate::from_ymd_opt(2050, 1, 1).unwrap()),
        );
        assert_eq!(compact_date(&kwargs, "start_date").unwrap(), "20240110");
        assert_eq!(compact_date(&kwargs, "end_date").unwrap(), "20500101");
    }

    #[test]
    fn test_spot_table() {
        let body = r#"{"data":{"total":2,"diff":[
            {"f2":10.5,"f3":1.2,"f12":"000001","f14":"平安银行","f9":"-"},
            {"f2":"-","f3":"-","f12":"600000","f14":"浦发银行"}]}}"#;
        let response: SpotResponse = serde_json::from_str(body).unwrap();
        let page = response.data.unwrap();
        assert_eq!(page.total, 2);

        let table = spot_table(&page.diff).unwrap();
        assert_eq!(table.columns().len(), 23);
        assert_eq!(table.columns()[..4], ["序号", "代码", "名称", "最新价"]);
        assert_eq!(table.rows()[0][..4], [json!(1), json!("000001"), json!("平安银行"), json!(10.5)]);
        assert_eq!(table.rows()[1][3], Value::Null);
        // 市盈率-动态 placeholder
        assert_eq!(table.rows()[0][15], Value::Null);
    }

    #[test]
    fn test_sina_count() {
        assert_eq!(sina_count(&json!("5386")).unwrap(), 5386);
        assert_eq!(sina_count(&json!(80)).unwrap(), 80);
        assert!(sina_count(&json!(null)).is_err());
        assert!(sina_count(&json!("many")).is_err());
    }

    #[test]
    fn test_sina_table() {
        let body = r#"[{"symbol":"sh600000","code":"600000","name":"浦发银行","trade":"7.120",
            "pricechange":"-0.050","changepercent":"-0.697","buy":"7.120","sell":"7.130",
            "settlement":"7.170","open":"7.160","high":"7.190","low":"7.100","volume":31337400,
            "amount":223918155,"ticktime":"15:00:00","per":5.33,"pb":0.35}]"#;
        let rows: Vec<Map<String, Value>> = serde_json::from_str(body).unwrap();
        let table = sina_table(&rows).unwrap();
        assert_eq!(table.columns().len(), SINA_COLUMNS.len());
        assert_eq!(table.columns()[..3], ["代码", "名称", "最新价"]);
        assert_eq!(
            table.rows()[0][..4],
            [json!("sh600000"), json!("浦发银行"), json!(7.12), json!(-0.05)]
        );
        assert_eq!(table.rows()[0][11], json!(31_337_400));
        assert_eq!(table.rows()[0][13], json!("15:00:00"));
    }

    #[test]
    fn test_info_table() {
        let body = r#"{"data":{"f43":10.5,"f57":"000001","f58":"平安银行","f84":19405918198.0,
            "f85":19405553574.0,"f116":203762140079.0,"f117":203758311527.0,"f127":"银行","f189":19910403}}"#;
        let response: InfoResponse = serde_json::from_str(body).unwrap();
        let table = info_table(&response.data.unwrap()).unwrap();
        assert_eq!(table.columns(), ["item", "value"]);
        assert_eq!(table.rows().len(), INFO_ITEMS.len());
        assert_eq!(table.rows()[2], [json!("股票简称"), json!("平安银行")]);
        assert_eq!(table.rows()[8], [json!("上市时间"), json!(19_910_403)]);
    }

    #[test]
    fn test_info_table_rejects_empty() {
        assert!(info_table(&Map::new()).is_err());
    }
}
