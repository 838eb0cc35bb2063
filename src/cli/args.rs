/// Per-function flag schemas, built at runtime from registry descriptors.
///
/// Every registry function gets its own clap `Command`: one long flag per
/// declared parameter plus the reserved `--format` selector.
use std::ffi::OsString;
use std::fmt::Write as _;

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{Arg, ArgAction, ArgMatches, Command, ValueEnum};

use crate::registry::params::{parse_bool, parse_date};
use crate::registry::{ArgValue, Catalog, DefaultValue, Function, InvokeError, Kwargs, ParamSpec, ParamType};

/// Program name used in usage and help text.
pub const PROGRAM: &str = "akshare-cli";

/// Id and long name of the output selector.
pub const FORMAT_FLAG: &str = "format";

/// Flag names owned by the invoker; parameters with these names are skipped.
const RESERVED_FLAGS: [&str; 2] = [FORMAT_FLAG, "help"];

/// Output format variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// JSON array of row objects (tables) or the value itself.
    Json,
    /// Header plus comma-separated rows. Tables only.
    Csv,
    /// Aligned table with borders.
    #[default]
    Pretty,
    /// Default string form of the value.
    Raw,
}

/// Top-level shape of the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// No function name given.
    Missing,
    /// `--help` / `-h` in place of a function name.
    Help,
    /// Call `function` with the remaining arguments.
    Call { function: String, args: Vec<String> },
}

/// Decode raw process arguments.
///
/// # Errors
///
/// Returns `InvokeError::InvalidArguments` for the first argument that is not
/// valid UTF-8.
pub fn utf8_args<I>(args: I) -> Result<Vec<String>, InvokeError>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            arg.into_string().map_err(|raw| {
                InvokeError::InvalidArguments(format!(
                    "argument is not valid UTF-8: {}",
                    raw.to_string_lossy()
                ))
            })
        })
        .collect()
}

impl Invocation {
    /// Split `argv` (program name already removed) into function name and flags.
    #[must_use]
    pub fn from_argv(argv: &[String]) -> Self {
        match argv.split_first() {
            None => Self::Missing,
            Some((first, _)) if first == "--help" || first == "-h" => Self::Help,
            Some((first, rest)) => Self::Call {
                function: first.clone(),
                args: rest.to_vec(),
            },
        }
    }
}

/// A flag schema for one function.
#[derive(Debug)]
pub struct Schema {
    command: Command,
    /// Parameters that were registered as flags, in declaration order.
    params: Vec<ParamSpec>,
}

/// Parsed command line for one call.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentSet {
    /// Keyword arguments for the call, defaults filled in.
    pub kwargs: Kwargs,
    /// Output selector; never part of `kwargs`.
    pub format: OutputFormat,
}

/// Result of parsing a function's command line.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    Args(ArgumentSet),
    /// `--help` was requested; holds the rendered help text.
    Help(String),
}

/// Build the flag schema for `function` from its parameter descriptors.
#[must_use]
pub fn build_schema(function: &Function, descriptors: &[ParamSpec]) -> Schema {
    let mut command = Command::new(function.name.clone())
        .bin_name(format!("{PROGRAM} {}", function.name))
        .about(format!("Call {}(). {}", function.name, function.summary))
        .disable_version_flag(true)
        .args_override_self(true);

    let mut params = Vec::with_capacity(descriptors.len());
    for spec in descriptors {
        if spec.is_instance_binding() {
            continue;
        }
        if RESERVED_FLAGS.contains(&spec.name.as_str()) {
            tracing::warn!(
                function = %function.name,
                param = %spec.name,
                "parameter shadows a reserved flag; not exposed"
            );
            continue;
        }
        command = command.arg(param_arg(spec));
        params.push(spec.clone());
    }

    command = command.arg(
        Arg::new(FORMAT_FLAG)
            .long(FORMAT_FLAG)
            .value_name("FORMAT")
            .value_parser(clap::value_parser!(OutputFormat))
            .default_value("pretty")
            .help("Output format"),
    );

    Schema { command, params }
}

fn param_arg(spec: &ParamSpec) -> Arg {
    let ty = spec.value_type();
    let mut help = format!("Parameter '{}' (type: {})", spec.name, ty.name());
    if let Some(DefaultValue::Value(default)) = &spec.default {
        let _ = write!(help, " [default: {default}]");
    }

    let arg = Arg::new(spec.name.clone())
        .long(spec.name.clone())
        .value_name(spec.name.to_uppercase())
        .action(ArgAction::Set)
        .allow_negative_numbers(true)
        .required(spec.is_required())
        .help(help);

    match ty {
        ParamType::Str => arg.value_parser(clap::value_parser!(String)),
        ParamType::Int => arg.value_parser(clap::value_parser!(i64)),
        ParamType::Float => arg.value_parser(clap::value_parser!(f64)),
        ParamType::Bool => arg.value_parser(parse_bool),
        ParamType::Date => arg.value_parser(parse_date),
    }
}

/// Parse `argv` (everything after the function name) against `schema`.
///
/// Optional parameters that were not supplied take their declared default;
/// a `Null` default leaves them out of the call.
///
/// # Errors
///
/// - `InvokeError::MissingRequiredArgument` — a required flag is absent
/// - `InvokeError::TypeCoercion` — a value does not parse as its type
/// - `InvokeError::InvalidArguments` — anything else clap rejects
pub fn parse_args(schema: Schema, argv: &[String]) -> Result<Parsed, InvokeError> {
    let Schema { command, params } = schema;
    let name = command.get_name().to_owned();

    let matches = match command.try_get_matches_from(std::iter::once(name).chain(argv.iter().cloned())) {
        Ok(m) => m,
        Err(err) if err.kind() == ErrorKind::DisplayHelp => {
            return Ok(Parsed::Help(err.render().to_string()));
        }
        Err(err) => return Err(convert_clap_error(&err)),
    };

    let format = matches
        .get_one::<OutputFormat>(FORMAT_FLAG)
        .copied()
        .unwrap_or_default();

    let mut kwargs = Kwargs::new();
    for spec in &params {
        if let Some(value) = supplied_value(&matches, spec) {
            kwargs.insert(&spec.name, value);
        } else if let Some(DefaultValue::Value(default)) = &spec.default {
            kwargs.insert(&spec.name, default.clone());
        }
    }

    Ok(Parsed::Args(ArgumentSet { kwargs, format }))
}

fn supplied_value(matches: &ArgMatches, spec: &ParamSpec) -> Option<ArgValue> {
    let id = spec.name.as_str();
    match spec.value_type() {
        ParamType::Str => matches.get_one::<String>(id).cloned().map(ArgValue::Str),
        ParamType::Int => matches.get_one::<i64>(id).copied().map(ArgValue::Int),
        ParamType::Float => matches.get_one::<f64>(id).copied().map(ArgValue::Float),
        ParamType::Bool => matches.get_one::<bool>(id).copied().map(ArgValue::Bool),
        ParamType::Date => matches
            .get_one::<chrono::NaiveDate>(id)
            .copied()
            .map(ArgValue::Date),
    }
}

/// Map a clap rejection onto the invoker's error taxonomy.
fn convert_clap_error(err: &clap::Error) -> InvokeError {
    match err.kind() {
        ErrorKind::MissingRequiredArgument => {
            let flags = match err.get(ContextKind::InvalidArg) {
                Some(ContextValue::Strings(args)) => args.iter().map(|a| flag_name(a)).collect(),
                Some(ContextValue::String(arg)) => vec![flag_name(arg)],
                _ => Vec::new(),
            };
            InvokeError::MissingRequiredArgument { flags }
        }
        ErrorKind::ValueValidation => InvokeError::TypeCoercion {
            flag: context_string(err, ContextKind::InvalidArg)
                .map(|a| flag_name(&a))
                .unwrap_or_default(),
            value: context_string(err, ContextKind::InvalidValue).unwrap_or_default(),
            reason: std::error::Error::source(err)
                .map_or_else(|| "invalid value".to_owned(), ToString::to_string),
        },
        _ => InvokeError::InvalidArguments(first_line(err)),
    }
}

fn context_string(err: &clap::Error, kind: ContextKind) -> Option<String> {
    match err.get(kind) {
        Some(ContextValue::String(s)) => Some(s.clone()),
        _ => None,
    }
}

/// `--symbol <SYMBOL>` → `--symbol`.
fn flag_name(rendered: &str) -> String {
    rendered
        .split_whitespace()
        .next()
        .unwrap_or(rendered)
        .to_owned()
}

fn first_line(err: &clap::Error) -> String {
    let rendered = err.render().to_string();
    let line = rendered.lines().next().unwrap_or_default();
    line.strip_prefix("error: ").unwrap_or(line).to_owned()
}

/// Two-line usage printed when no function name is given.
#[must_use]
pub fn short_usage() -> String {
    format!(
        "Usage: {PROGRAM} <function_name> [--param1 value1] [--param2 value2]\n       {PROGRAM} --help"
    )
}

/// Full usage text for `--help`, listing every registered function.
#[must_use]
pub fn usage(catalog: &Catalog) -> String {
    let mut text = format!(
        "{PROGRAM} - call financial-data functions from the command line

Usage:
    {PROGRAM} <function_name> [--param1 value1] [--param2 value2] [--format output_format]
    {PROGRAM} <function_name> --help

Output formats: json, csv, pretty (default), raw

Examples:
    {PROGRAM} stock_zh_a_hist --symbol 000001 --start_date 20240101 --end_date 20240131
    {PROGRAM} macro_china_gdp --format json
    {PROGRAM} index_zh_a_hist --symbol 000300 --period weekly --format csv
    {PROGRAM} bank_fjcf_table_detail --page 1 --item 分局本级

Functions:
"
    );
    let width = catalog
        .functions()
        .map(|f| f.name.chars().count())
        .max()
        .unwrap_or(0);
    for function in catalog.functions() {
        let _ = writeln!(text, "    {:<width$}  {}", function.name, function.summary);
    }
    text
}
