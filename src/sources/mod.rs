/// Built-in data functions and the HTTP session they share.
pub mod bank;
pub mod eastmoney;
pub mod index;
pub mod macro_china;
pub mod session;
pub mod stock;

pub use session::Session;

use serde_json::Value;

use crate::registry::{ArgValue, Catalog, ParamSpec, ParamType};

fn str_default(name: &str, value: &str) -> ParamSpec {
    ParamSpec::with_default(name, ParamType::Str, ArgValue::Str(value.to_owned()))
}

fn date_default(name: &str, value: &str) -> ParamSpec {
    ParamSpec::with_default(name, ParamType::Date, ArgValue::Str(value.to_owned()))
}

fn timeout() -> ParamSpec {
    ParamSpec::optional("timeout", ParamType::Float)
}

/// The catalog of every built-in function, plus the `__version__` attribute.
#[must_use]
pub fn builtin_catalog() -> Catalog {
    let mut catalog = Catalog::new();

    catalog.register_function(
        "stock_zh_a_hist",
        "A-share historical bars (daily, weekly, monthly)",
        vec![
            ParamSpec::required("symbol", ParamType::Str),
            str_default("period", "daily"),
            date_default("start_date", "19700101"),
            date_default("end_date", "20500101"),
            str_default("adjust", ""),
            timeout(),
        ],
        stock::stock_zh_a_hist,
    );
    catalog.register_function(
        "stock_zh_a_spot_em",
        "Real-time quotes for all A-shares",
        vec![timeout()],
        stock::stock_zh_a_spot_em,
    );
    catalog.register_function(
        "stock_zh_a_spot",
        "Real-time quotes for all A-shares (Sina)",
        vec![timeout()],
        stock::stock_zh_a_spot,
    );
    catalog.register_function(
        "stock_individual_info_em",
        "Profile of one A-share (code, name, shares, industry, listing date)",
        vec![ParamSpec::required("symbol", ParamType::Str), timeout()],
        stock::stock_individual_info_em,
    );
    catalog.register_function(
        "index_zh_a_hist",
        "Index historical bars (daily, weekly, monthly)",
        vec![
            ParamSpec::required("symbol", ParamType::Str),
            str_default("period", "daily"),
            date_default("start_date", "19700101"),
            date_default("end_date", "22220101"),
            timeout(),
        ],
        index::index_zh_a_hist,
    );
    catalog.register_function(
        "macro_china_gdp",
        "China quarterly GDP",
        vec![timeout()],
        macro_china::macro_china_gdp,
    );
    catalog.register_function(
        "bank_fjcf_table_detail",
        "Banking regulator penalty notices, one page per call",
        vec![
            ParamSpec::with_default("page", ParamType::Int, ArgValue::Int(1)),
            str_default("item", "分局本级"),
            ParamSpec::with_default("with_link", ParamType::Bool, ArgValue::Bool(false)),
            timeout(),
        ],
        bank::bank_fjcf_table_detail,
    );

    catalog.register_attribute("__version__", Value::from(env!("CARGO_PKG_VERSION")));
    catalog
}
