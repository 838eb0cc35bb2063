/// Errors from resolving, binding, invoking and rendering a registry call.
use thiserror::Error;

/// Everything that can stop an invocation.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// No registry entry with this name.
    #[error("Function '{name}' not found in registry")]
    NotFound {
        /// The requested function name.
        name: String,
    },

    /// The entry exists but is a plain attribute.
    #[error("'{name}' is not callable")]
    NotCallable {
        /// The requested name.
        name: String,
    },

    /// Required flags were not supplied.
    #[error("the following arguments are required: {}", flags.join(", "))]
    MissingRequiredArgument {
        /// Missing flags, e.g. `--symbol`.
        flags: Vec<String>,
    },

    /// A flag value could not be converted to the declared type.
    #[error("argument {flag}: invalid value '{value}' ({reason})")]
    TypeCoercion {
        /// The offending flag.
        flag: String,
        /// The raw value as typed.
        value: String,
        /// Why the conversion failed.
        reason: String,
    },

    /// Any other command-line rejection (unknown flag, bad `--format` choice).
    #[error("{0}")]
    InvalidArguments(String),

    /// CSV was requested for a result that is not a table.
    #[error("CSV output only supported for tables")]
    UnsupportedFormat,

    /// The registry function failed.
    #[error("{message}")]
    Invocation {
        /// Function that failed.
        function: String,
        /// Full cause chain of the failure.
        message: String,
    },

    /// Serializing the result failed.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file could not be read or parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl InvokeError {
    /// Machine-readable error code (snake_case), used in log events.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::NotCallable { .. } => "not_callable",
            Self::MissingRequiredArgument { .. } => "missing_required_argument",
            Self::TypeCoercion { .. } => "type_coercion",
            Self::InvalidArguments(_) => "invalid_arguments",
            Self::UnsupportedFormat => "unsupported_format",
            Self::Invocation { .. } => "invocation_error",
            Self::Json(_) => "json_error",
            Self::Config(_) => "config_error",
        }
    }

    /// Wrap a handler failure, keeping its whole cause chain in the message.
    #[must_use]
    pub fn invocation(function: &str, err: &anyhow::Error) -> Self {
        Self::Invocation {
            function: function.to_owned(),
            message: format!("{err:#}"),
        }
    }
}
