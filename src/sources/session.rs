/// Blocking HTTP session shared by every data source.
use std::time::Duration;

use anyhow::{Context, bail};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;

use crate::config::HttpConfig;

/// HTTP client plus the configured request defaults.
#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
}

impl Session {
    /// Build a session from the `[http]` config section.
    ///
    /// # Errors
    ///
    /// Fails on an invalid proxy URL, a negative timeout, or when the TLS
    /// backend cannot be initialised.
    pub fn new(config: &HttpConfig) -> anyhow::Result<Self> {
        let timeout = config.timeout_secs.map(seconds).transpose()?;
        let mut builder = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(timeout);
        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy).with_context(|| format!("invalid proxy '{proxy}'"))?;
            builder = builder.proxy(proxy);
        }
        let client = builder.build().context("failed to build HTTP client")?;
        Ok(Self { client })
    }

    /// GET `url` with `query` and decode the JSON body.
    ///
    /// `timeout` (seconds) overrides the session timeout for this request.
    ///
    /// # Errors
    ///
    /// Fails on transport errors, non-success status codes, or a body that
    /// does not decode as `T`.
    pub fn get_json<T>(&self, url: &str, query: &[(&str, String)], timeout: Option<f64>) -> anyhow::Result<T>
    where
        T: DeserializeOwned,
    {
        tracing::debug!(url, ?query, "GET");
        let mut request = self.client.get(url).query(query);
        if let Some(secs) = timeout {
            request = request.timeout(seconds(secs)?);
        }
        let response = request
            .send()
            .with_context(|| format!("request to {url} failed"))?
            .error_for_status()
            .with_context(|| format!("request to {url} was rejected"))?;
        response
            .json()
            .with_context(|| format!("unexpected response body from {url}"))
    }
}

fn seconds(secs: f64) -> anyhow::Result<Duration> {
    match Duration::try_from_secs_f64(secs) {
        Ok(d) => Ok(d),
        Err(_) => bail!("invalid timeout {secs}: expected a non-negative number of seconds"),
    }
}
