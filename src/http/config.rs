//! Client configuration
//!
//! `ClientConfig` is a plain value object. It is validated once when built
//! and copied into the agent, which never mutates it afterwards.

use super::retry::RetryPolicy;
use crate::error::{Error, Result};
use crate::types::StringMap;
use std::collections::HashSet;
use std::time::Duration;

/// Status codes retried when no explicit set is configured
pub const DEFAULT_RETRY_STATUS_CODES: [u16; 5] = [429, 500, 502, 503, 504];

/// Connection parameters for a [`RequestAgent`](super::RequestAgent)
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL every relative endpoint is joined onto
    pub base_url: String,
    /// Per-attempt request timeout
    pub timeout: Duration,
    /// Minimum spacing between two requests of one agent
    pub rate_limit_delay: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Seconds multiplied by `2^(n-1)` before retry `n`
    pub backoff_factor: f64,
    /// Response statuses that trigger a retry
    pub retry_status_codes: HashSet<u16>,
    /// Verify server TLS certificates
    pub verify_tls: bool,
    /// Headers sent with every request, keyed by lowercase name
    pub default_headers: StringMap,
    /// User agent string
    pub user_agent: String,
}

impl ClientConfig {
    /// Create a config with default settings for `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::builder(base_url).build()
    }

    /// Create a new config builder
    pub fn builder(base_url: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(base_url)
    }

    /// Check the invariants a config must hold before an agent uses it
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::config("base_url must not be empty"));
        }
        Ok(())
    }

    /// Retry policy derived from this config
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff_factor: self.backoff_factor,
            retry_status_codes: self.retry_status_codes.clone(),
        }
    }

    fn with_base_url(base_url: String) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(30),
            rate_limit_delay: Duration::ZERO,
            max_retries: 3,
            backoff_factor: 0.5,
            retry_status_codes: DEFAULT_RETRY_STATUS_CODES.into_iter().collect(),
            verify_tls: true,
            default_headers: StringMap::new(),
            user_agent: format!("bdd-api-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Builder for client config
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    fn new(base_url: impl Into<String>) -> Self {
        Self {
            config: ClientConfig::with_base_url(base_url.into()),
        }
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the minimum spacing between requests
    pub fn rate_limit_delay(mut self, delay: Duration) -> Self {
        self.config.rate_limit_delay = delay;
        self
    }

    /// Set max retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set the exponential backoff factor (seconds)
    pub fn backoff_factor(mut self, factor: f64) -> Self {
        self.config.backoff_factor = factor;
        self
    }

    /// Replace the set of retried status codes
    pub fn retry_status_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.config.retry_status_codes = codes.into_iter().collect();
        self
    }

    /// Enable or disable TLS certificate verification
    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.config.verify_tls = verify;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config
            .default_headers
            .insert(key.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Add several default headers
    pub fn headers<K, V>(mut self, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.config
            .default_headers
            .extend(
                headers
                    .into_iter()
                    .map(|(k, v)| (k.into().to_ascii_lowercase(), v.into())),
            );
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Validate and build the config
    pub fn build(self) -> Result<ClientConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
