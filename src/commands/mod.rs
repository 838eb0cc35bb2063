/// Command dispatch: routes an `Invocation` to usage output or a registry call.
pub mod call;

use crate::cli::Invocation;
use crate::cli::args::{short_usage, usage};
use crate::config::Config;
use crate::registry::{Catalog, InvokeError};

/// Text for stdout plus the process exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Printed {
    pub text: String,
    pub exit_code: i32,
}

impl Printed {
    #[must_use]
    pub fn success(text: String) -> Self {
        Self { text, exit_code: 0 }
    }
}

/// Dispatch a parsed `Invocation`.
///
/// Configuration is only loaded for registry calls, so usage output works
/// even with a broken config file.
///
/// # Errors
///
/// Returns `InvokeError` from config loading or any stage of a registry call.
pub fn dispatch<F>(invocation: &Invocation, catalog: &Catalog, load_config: F) -> Result<Printed, InvokeError>
where
    F: FnOnce() -> Result<Config, InvokeError>,
{
    match invocation {
        Invocation::Missing => Ok(Printed {
            text: short_usage(),
            exit_code: 1,
        }),
        Invocation::Help => Ok(Printed::success(usage(catalog))),
        Invocation::Call { function, args } => call::run(catalog, &load_config()?, function, args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_function_prints_usage_and_fails() {
        let printed = dispatch(&Invocation::Missing, &Catalog::new(), || Ok(Config::default())).unwrap();
        assert_eq!(printed.exit_code, 1);
        assert!(printed.text.starts_with("Usage:"));
    }

    #[test]
    fn test_help_succeeds() {
        let printed = dispatch(&Invocation::Help, &Catalog::new(), || Ok(Config::default())).unwrap();
        assert_eq!(printed.exit_code, 0);
        assert!(printed.text.contains("Usage"));
    }

    #[test]
    fn test_call_unknown_function() {
        let invocation = Invocation::Call {
            function: "nonexistent_function".to_owned(),
            args: Vec::new(),
        };
        let err = dispatch(&invocation, &Catalog::new(), || Ok(Config::default())).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_help_ignores_config() {
        let broken = || Err(InvokeError::Config("unreadable".to_owned()));
        let printed = dispatch(&Invocation::Help, &Catalog::new(), broken).unwrap();
        assert_eq!(printed.exit_code, 0);

        let invocation = Invocation::Call {
            function: "anything".to_owned(),
            args: Vec::new(),
        };
        let err = dispatch(&invocation, &Catalog::new(), broken).unwrap_err();
        assert!(matches!(err, InvokeError::Config(_)));
    }
}
