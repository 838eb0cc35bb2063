/// Parameter descriptors, typed argument values and the keyword-argument bag
/// handed to registry functions.
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;

use anyhow::{Context, anyhow, bail};
use chrono::NaiveDate;

/// Names bound implicitly by the callee; never exposed as flags.
pub const INSTANCE_PARAMS: [&str; 2] = ["self", "cls"];

/// Declared type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Str,
    Int,
    Float,
    Bool,
    /// `YYYYMMDD` or `YYYY-MM-DD`.
    Date,
}

impl ParamType {
    /// Lower-case name shown in help text.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Date => "date",
        }
    }
}

/// A parsed, type-coerced argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y%m%d")),
        }
    }
}

/// Default of an optional parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// Optional, and left out of the call when not supplied.
    Null,
    /// Optional, filled with this value when not supplied.
    Value(ArgValue),
}

/// Declared metadata for one parameter.
///
/// A parameter without a default is required.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    /// `None` means "untyped"; such parameters are parsed as strings.
    pub ty: Option<ParamType>,
    pub default: Option<DefaultValue>,
}

impl ParamSpec {
    /// A required parameter.
    #[must_use]
    pub fn required(name: &str, ty: ParamType) -> Self {
        Self {
            name: name.to_owned(),
            ty: Some(ty),
            default: None,
        }
    }

    /// An optional parameter with a concrete default.
    #[must_use]
    pub fn with_default(name: &str, ty: ParamType, default: ArgValue) -> Self {
        Self {
            name: name.to_owned(),
            ty: Some(ty),
            default: Some(DefaultValue::Value(default)),
        }
    }

    /// An optional parameter that defaults to "not passed".
    #[must_use]
    pub fn optional(name: &str, ty: ParamType) -> Self {
        Self {
            name: name.to_owned(),
            ty: Some(ty),
            default: Some(DefaultValue::Null),
        }
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    /// Effective type: untyped parameters are strings.
    #[must_use]
    pub fn value_type(&self) -> ParamType {
        self.ty.unwrap_or(ParamType::Str)
    }

    /// Whether the parameter is bound implicitly and must not become a flag.
    #[must_use]
    pub fn is_instance_binding(&self) -> bool {
        INSTANCE_PARAMS.contains(&self.name.as_str())
    }
}

/// Boolean flag parser: `"true"` in any case is true, anything else false.
///
/// # Errors
///
/// Never fails.
pub fn parse_bool(raw: &str) -> Result<bool, Infallible> {
    Ok(raw.eq_ignore_ascii_case("true"))
}

/// Date flag parser accepting `YYYYMMDD` and `YYYY-MM-DD`.
///
/// # Errors
///
/// Returns the parse error of the last attempted layout.
pub fn parse_date(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(raw, "%Y%m%d").or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
}

/// Keyword arguments for one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Kwargs {
    values: BTreeMap<String, ArgValue>,
}

impl Kwargs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: ArgValue) {
        self.values.insert(name.to_owned(), value);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    fn require(&self, name: &str) -> anyhow::Result<&ArgValue> {
        self.get(name)
            .ok_or_else(|| anyhow!("missing keyword argument '{name}'"))
    }

    /// # Errors
    ///
    /// Fails when the argument is absent or not a string.
    pub fn str(&self, name: &str) -> anyhow::Result<&str> {
        self.opt_str(name)?
            .with_context(|| format!("missing keyword argument '{name}'"))
    }

    /// # Errors
    ///
    /// Fails when the argument is present but not a string.
    pub fn opt_str(&self, name: &str) -> anyhow::Result<Option<&str>> {
        match self.get(name) {
            None => Ok(None),
            Some(ArgValue::Str(s)) => Ok(Some(s)),
            Some(other) => bail!("argument '{name}' expected str, got {other:?}"),
        }
    }

    /// # Errors
    ///
    /// Fails when the argument is absent or not an integer.
    pub fn int(&self, name: &str) -> anyhow::Result<i64> {
        match self.require(name)? {
            ArgValue::Int(i) => Ok(*i),
            other => bail!("argument '{name}' expected int, got {other:?}"),
        }
    }

    /// Floats accept integer values too.
    ///
    /// # Errors
    ///
    /// Fails when the argument is present but not numeric.
    #[allow(clippy::cast_precision_loss)]
    pub fn opt_float(&self, name: &str) -> anyhow::Result<Option<f64>> {
        match self.get(name) {
            None => Ok(None),
            Some(ArgValue::Float(x)) => Ok(Some(*x)),
            Some(ArgValue::Int(i)) => Ok(Some(*i as f64)),
            Some(other) => bail!("argument '{name}' expected float, got {other:?}"),
        }
    }

    /// # Errors
    ///
    /// Fails when the argument is absent or not a boolean.
    pub fn bool(&self, name: &str) -> anyhow::Result<bool> {
        match self.require(name)? {
            ArgValue::Bool(b) => Ok(*b),
            other => bail!("argument '{name}' expected bool, got {other:?}"),
        }
    }

    /// Dates given as strings are parsed on access.
    ///
    /// # Errors
    ///
    /// Fails when the argument is absent or not a date.
    pub fn date(&self, name: &str) -> anyhow::Result<NaiveDate> {
        match self.require(name)? {
            ArgValue::Date(d) => Ok(*d),
            ArgValue::Str(s) => {
                parse_date(s).with_context(|| format!("argument '{name}' is not a date: '{s}'"))
            }
            other => bail!("argument '{name}' expected date, got {other:?}"),
        }
    }
}

#[cfg(test)]
impl Kwargs {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_is_case_insensitive() {
        for raw in ["true", "TRUE", "True", "tRuE"] {
            assert_eq!(parse_bool(raw), Ok(true), "{raw}");
        }
        for raw in ["false", "1", "yes", "", "truee", " true"] {
            assert_eq!(parse_bool(raw), Ok(false), "{raw}");
        }
    }

    #[test]
    fn test_parse_date_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        assert_eq!(parse_date("20240110").unwrap(), expected);
        assert_eq!(parse_date("2024-01-10").unwrap(), expected);
        assert!(parse_date("2024/01/10").is_err());
        assert!(parse_date("20241310").is_err());
    }

    #[test]
    fn test_date_display_is_compact() {
        let d = ArgValue::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(d.to_string(), "20240101");
    }

    #[test]
    fn test_required_vs_optional() {
        assert!(ParamSpec::required("symbol", ParamType::Str).is_required());
        assert!(!ParamSpec::optional("timeout", ParamType::Float).is_required());
        let untyped = ParamSpec {
            name: "item".to_owned(),
            ty: None,
            default: None,
        };
        assert_eq!(untyped.value_type(), ParamType::Str);
    }

    #[test]
    fn test_kwargs_accessors() {
        let mut kwargs = Kwargs::new();
        kwargs.insert("symbol", ArgValue::Str("000001".to_owned()));
        kwargs.insert("page", ArgValue::Int(5));
        kwargs.insert("start_date", ArgValue::Str("2024-01-02".to_owned()));

        assert_eq!(kwargs.str("symbol").unwrap(), "000001");
        assert_eq!(kwargs.int("page").unwrap(), 5);
        assert_eq!(kwargs.opt_float("page").unwrap(), Some(5.0));
        assert_eq!(kwargs.opt_float("timeout").unwrap(), None);
        assert_eq!(
            kwargs.date("start_date").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
        assert!(kwargs.str("missing").is_err());
        assert!(kwargs.int("symbol").is_err());
    }
}
