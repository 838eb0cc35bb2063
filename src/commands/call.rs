/// The call pipeline: Resolve → DescribeParameters → BuildSchema → ParseArgs →
/// Invoke → Render.
use super::Printed;
use crate::cli::args::{Parsed, build_schema, parse_args};
use crate::cli::output::{StageTimer, render};
use crate::config::Config;
use crate::registry::{Catalog, Function, InvokeError, Kwargs, describe_parameters};
use crate::sources::Session;
use crate::types::Output;

/// Run one registry call and render its result.
///
/// Nothing is printed here; on error the caller prints only the diagnostic.
///
/// # Errors
///
/// Returns the `InvokeError` of the first stage that fails.
pub fn run(catalog: &Catalog, config: &Config, name: &str, argv: &[String]) -> Result<Printed, InvokeError> {
    let function = {
        let _t = StageTimer::new("resolve");
        catalog.resolve(name)?
    };

    let descriptors = describe_parameters(function);
    if function.signature.is_none() {
        tracing::debug!(function = name, "no signature; only --format is accepted");
    }

    let parsed = {
        let _t = StageTimer::new("parse_args");
        parse_args(build_schema(function, descriptors), argv)?
    };
    let args = match parsed {
        Parsed::Help(text) => return Ok(Printed::success(text.trim_end().to_owned())),
        Parsed::Args(args) => args,
    };
    tracing::debug!(function = name, kwargs = ?args.kwargs, format = ?args.format, "arguments bound");

    let session = Session::new(&config.http).map_err(|e| InvokeError::Config(format!("{e:#}")))?;

    let output = {
        let _t = StageTimer::new("invoke");
        invoke(function, &session, &args.kwargs)?
    };

    let _t = StageTimer::new("render");
    render(&output, args.format).map(Printed::success)
}

/// Call the handler with keyword arguments.
///
/// # Errors
///
/// Returns `InvokeError::Invocation` carrying the handler's message.
pub fn invoke(function: &Function, session: &Session, kwargs: &Kwargs) -> Result<Output, InvokeError> {
    (function.handler)(session, kwargs).map_err(|err| InvokeError::invocation(&function.name, &err))
}
