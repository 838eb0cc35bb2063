/// Index history.
use super::Session;
use super::eastmoney::{KLINE_FIELDS, KLINE_URL, KlineResponse, kline_table, period_code};
use super::stock::compact_date;
use crate::registry::Kwargs;
use crate::types::Output;

const INDEX_UT: &str = "7eea3edcaed734bea9cbfc24409ed989";

/// Index codes are ambiguous across exchanges; try each market in turn.
const INDEX_MARKETS: [u8; 4] = [1, 0, 2, 47];

/// `index_zh_a_hist`: bars for one index, without a code column.
pub fn index_zh_a_hist(session: &Session, kwargs: &Kwargs) -> anyhow::Result<Output> {
    let symbol = kwargs.str("symbol")?;
    let klt = period_code(kwargs.str("period")?)?;
    let beg = compact_date(kwargs, "start_date")?;
    let end = compact_date(kwargs, "end_date")?;
    let timeout = kwargs.opt_float("timeout")?;

    for market in INDEX_MARKETS {
        let query = [
            ("secid", format!("{market}.{symbol}")),
            ("ut", INDEX_UT.to_owned()),
            ("fields1", "f1,f2,f3,f4,f5,f6".to_owned()),
            ("fields2", KLINE_FIELDS.to_owned()),
            ("klt", klt.to_owned()),
            ("fqt", "0".to_owned()),
            ("beg", beg.clone()),
            ("end", end.clone()),
        ];
        let response: KlineResponse = session.get_json(KLINE_URL, &query, timeout)?;
        if let Some(data) = response.data {
            tracing::debug!(symbol, market, "index resolved");
            return kline_table(&data.klines, None).map(Output::Table);
        }
    }

    tracing::debug!(symbol, "no market carries this index");
    kline_table(&[], None).map(Output::Table)
}
