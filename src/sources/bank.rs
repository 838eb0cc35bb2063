/// Banking regulator penalty notices (NFRA document listings).
use anyhow::{Context, bail};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::Session;
use super::eastmoney::json_cell;
use crate::registry::Kwargs;
use crate::types::{Output, Table, scalar_text};

const LIST_URL: &str = "https://www.nfra.gov.cn/cbircweb/DocInfo/SelectDocByItemIdAndChild";
const DETAIL_URL: &str = "https://www.nfra.gov.cn/cn/view/pages/ItemDetail.html";
const PAGE_SIZE: u32 = 18;

/// Publishing level → listing item id.
const ITEMS: [(&str, &str); 3] = [("机关", "4113"), ("本级", "4114"), ("分局本级", "4115")];

/// Column name → document field, in output order.
const DOC_COLUMNS: [(&str, &str); 3] = [("文档ID", "docId"), ("标题", "docSubtitle"), ("发布时间", "publishDate")];

#[derive(Deserialize, Debug)]
struct ListResponse {
    data: Option<ListPage>,
}

#[derive(Deserialize, Debug)]
struct ListPage {
    #[serde(default)]
    rows: Vec<Map<String, Value>>,
}

fn item_id(item: &str) -> anyhow::Result<&'static str> {
    match ITEMS.iter().find(|(name, _)| *name == item) {
        Some((_, id)) => Ok(*id),
        None => bail!("invalid item '{item}': expected one of 机关, 本级, 分局本级"),
    }
}

/// `bank_fjcf_table_detail`: one page of penalty notices for a publishing level.
pub fn bank_fjcf_table_detail(session: &Session, kwargs: &Kwargs) -> anyhow::Result<Output> {
    let page = kwargs.int("page")?;
    if page < 1 {
        bail!("invalid page {page}: pages start at 1");
    }
    let item = item_id(kwargs.str("item")?)?;
    let with_link = kwargs.bool("with_link")?;

    let query = [
        ("itemId", item.to_owned()),
        ("pageSize", PAGE_SIZE.to_string()),
        ("pageIndex", page.to_string()),
    ];
    let response: ListResponse = session.get_json(LIST_URL, &query, kwargs.opt_float("timeout")?)?;
    let page_data = response
        .data
        .with_context(|| format!("no penalty listing for page {page}"))?;
    notice_table(&page_data.rows, item, with_link).map(Output::Table)
}

fn notice_table(rows: &[Map<String, Value>], item: &str, with_link: bool) -> anyhow::Result<Table> {
    let mut columns: Vec<&str> = DOC_COLUMNS.iter().map(|(name, _)| *name).collect();
    if with_link {
        columns.push("链接");
    }
    let mut table = Table::new(columns);

    for doc in rows {
        let mut row: Vec<Value> = DOC_COLUMNS
            .iter()
            .map(|(_, field)| json_cell(doc.get(*field)))
            .collect();
        if with_link {
            row.push(match doc.get("docId") {
                Some(Value::Null) | None => Value::Null,
                Some(id) => {
                    let id = scalar_text(id);
                    Value::String(format!("{DETAIL_URL}?docId={id}&itemId={item}&generaltype=9"))
                }
            });
        }
        table.push_row(row)?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    const BODY: &str = r#"{"rptCode":200,"msg":"ok","data":{"total":2,"rows":[
        {"docId":1170935,"docSubtitle":"XX银行股份有限公司分行行政处罚信息公开表","publishDate":"2024-06-14 17:30:00"},
        {"docId":1170921,"docSubtitle":"张某某行政处罚信息公开表","publishDate":"2024-06-14 17:29:00"}]}}"#;

    #[test]
    fn test_item_id() {
        assert_eq!(item_id("分局本级").unwrap(), "4115");
        assert_eq!(item_id("机关").unwrap(), "4113");
        assert!(item_id("总局").unwrap_err().to_string().contains("分局本级"));
    }

    #[test]
    fn test_notice_table() {
        let response: ListResponse = serde_json::from_str(BODY).unwrap();
        let rows = response.data.unwrap().rows;
        let table = notice_table(&rows, "4115", false).unwrap();
        assert_eq!(table.columns(), ["文档ID", "标题", "发布时间"]);
        assert_eq!(table.rows().len(), 2);
        assert_eq!(table.rows()[0][0], json!(1_170_935));
        assert_eq!(table.rows()[1][2], json!("2024-06-14 17:29:00"));
    }

    #[test]
    fn test_notice_table_with_link() {
        let response: ListResponse = serde_json::from_str(BODY).unwrap();
        let rows = response.data.unwrap().rows;
        let table = notice_table(&rows, "4115", true).unwrap();
        assert_eq!(table.columns()[3], "链接");
        assert_eq!(
            table.rows()[0][3],
            json!("https://www.nfra.gov.cn/cn/view/pages/ItemDetail.html?docId=1170935&itemId=4115&generaltype=9")
        );
    }

    #[test]
    fn test_missing_data_decodes() {
        let response: ListResponse = serde_json::from_str(r#"{"data":null}"#).unwrap();
        assert!(response.data.is_none());
    }
}
