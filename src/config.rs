/// Optional TOML configuration for the HTTP session.
use std::path::Path;

use serde::Deserialize;

use crate::registry::InvokeError;

/// Environment variable holding the config file path.
pub const CONFIG_ENV: &str = "AKSHARE_CLI_CONFIG";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Deserialize, Debug, PartialEq, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields, default)]
pub struct HttpConfig {
    pub user_agent: String,
    /// Per-request timeout in seconds. Unset means no timeout.
    pub timeout_secs: Option<f64>,
    /// Proxy URL applied to every request.
    pub proxy: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            timeout_secs: None,
            proxy: None,
        }
    }
}

impl Config {
    /// # Errors
    ///
    /// Returns the TOML error for malformed input or unknown keys.
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load from the file named by `AKSHARE_CLI_CONFIG`, or defaults when unset.
    ///
    /// # Errors
    ///
    /// Returns `InvokeError::Config` if the file cannot be read or parsed.
    pub fn from_env() -> Result<Self, InvokeError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    /// # Errors
    ///
    /// Returns `InvokeError::Config` if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, InvokeError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| InvokeError::Config(format!("{}: {e}", path.display())))?;
        Self::parse(&text).map_err(|e| InvokeError::Config(format!("{}: {e}", path.display())))
    }
}
