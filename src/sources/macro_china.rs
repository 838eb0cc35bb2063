/// China macro indicators from the Eastmoney data center.
use anyhow::Context;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::Session;
use super::eastmoney::json_cell;
use crate::registry::Kwargs;
use crate::types::{Output, Table};

const DATACENTER_URL: &str = "https://datacenter-web.eastmoney.com/api/data/v1/get";

/// Column name → report field, in output order.
const GDP_COLUMNS: [(&str, &str); 9] = [
    ("季度", "TIME"),
    ("国内生产总值-绝对值", "DOMESTICL_PRODUCT_BASE"),
    ("国内生产总值-同比增长", "SUM_SAME"),
    ("第一产业-绝对值", "FIRST_PRODUCT_BASE"),
    ("第一产业-同比增长", "FIRST_SAME"),
    ("第二产业-绝对值", "SECOND_PRODUCT_BASE"),
    ("第二产业-同比增长", "SECOND_SAME"),
    ("第三产业-绝对值", "THIRD_PRODUCT_BASE"),
    ("第三产业-同比增长", "THIRD_SAME"),
];

#[derive(Deserialize, Debug)]
struct ReportResponse {
    result: Option<ReportPage>,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize, Debug)]
struct ReportPage {
    #[serde(default)]
    data: Vec<Map<String, Value>>,
}

/// `macro_china_gdp`: quarterly GDP, newest first.
pub fn macro_china_gdp(session: &Session, kwargs: &Kwargs) -> anyhow::Result<Output> {
    let columns = GDP_COLUMNS.iter().map(|(_, f)| *f).collect::<Vec<_>>().join(",");
    let query = [
        ("columns", format!("REPORT_DATE,{columns}")),
        ("pageNumber", "1".to_owned()),
        ("pageSize", "1000".to_owned()),
        ("sortColumns", "REPORT_DATE".to_owned()),
        ("sortTypes", "-1".to_owned()),
        ("source", "WEB".to_owned()),
        ("client", "WEB".to_owned()),
        ("reportName", "RPT_ECONOMY_GDP".to_owned()),
    ];
    let response: ReportResponse = session.get_json(DATACENTER_URL, &query, kwargs.opt_float("timeout")?)?;
    gdp_table(response).map(Output::Table)
}

fn gdp_table(response: ReportResponse) -> anyhow::Result<Table> {
    let page = response
        .result
        .with_context(|| format!("GDP report unavailable: {}", response.message))?;
    let mut table = Table::new(GDP_COLUMNS.iter().map(|(name, _)| *name));
    for record in &page.data {
        let row = GDP_COLUMNS
            .iter()
            .map(|(_, field)| json_cell(record.get(*field)))
            .collect();
        table.push_row(row)?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_gdp_table() {
        let body = r#"{"version":"x","result":{"pages":1,"data":[
            {"REPORT_DATE":"2024-09-30 00:00:00","TIME":"2024年第1-3季度","DOMESTICL_PRODUCT_BASE":949746.4,
             "FIRST_PRODUCT_BASE":57733.0,"SECOND_PRODUCT_BASE":361362.0,"THIRD_PRODUCT_BASE":530651.4,
             "SUM_SAME":4.8,"FIRST_SAME":3.4,"SECOND_SAME":5.4,"THIRD_SAME":4.7}],"count":1},
            "success":true,"message":"ok","code":0}"#;
        let response: ReportResponse = serde_json::from_str(body).unwrap();
        let table = gdp_table(response).unwrap();
        assert_eq!(table.columns()[0], "季度");
        assert_eq!(table.columns().len(), GDP_COLUMNS.len());
        assert_eq!(
            table.rows()[0][..3],
            [json!("2024年第1-3季度"), json!(949_746.4), json!(4.8)]
        );
    }

    #[test]
    fn test_gdp_without_result() {
        let response: ReportResponse =
            serde_json::from_str(r#"{"result":null,"success":false,"message":"返回数据为空"}"#).unwrap();
        let err = gdp_table(response).unwrap_err();
        assert!(err.to_string().contains("返回数据为空"));
    }
}
