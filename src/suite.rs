//! Test-suite configuration
//!
//! A suite file selects an environment and locale, maps environments to
//! base URLs, and names endpoint aliases used by feature files:
//!
//! ```yaml
//! environment: qa
//! locale: cn
//! fixtures_dir: tests/resources
//! environments:
//!   qa:
//!     base_url: https://qa.example.com/api
//! endpoints:
//!   healthCheck: health
//! client:
//!   timeout_secs: 10
//!   max_retries: 3
//!   headers:
//!     X-Client: bdd
//! ```

use crate::error::{Error, Result};
use crate::fixtures::FixtureStore;
use crate::http::ClientConfig;
use crate::types::StringMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A suite run description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// Selected environment name
    pub environment: String,

    /// Locale used for fixture lookup
    #[serde(default)]
    pub locale: Option<String>,

    /// Environment name to settings
    pub environments: HashMap<String, EnvironmentDef>,

    /// Endpoint alias to path
    #[serde(default)]
    pub endpoints: StringMap,

    /// Client knobs applied to every environment
    #[serde(default)]
    pub client: ClientDef,

    /// Root of the fixture files
    #[serde(default = "default_fixtures_dir")]
    pub fixtures_dir: PathBuf,
}

/// Per-environment settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentDef {
    pub base_url: String,

    /// Headers added on top of the shared client headers
    #[serde(default)]
    pub headers: StringMap,
}

/// Client settings; unset fields keep the client defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientDef {
    #[serde(default)]
    pub timeout_secs: Option<f64>,
    #[serde(default)]
    pub rate_limit_delay_ms: Option<u64>,
    #[serde(default)]
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub backoff_factor: Option<f64>,
    #[serde(default)]
    pub retry_status_codes: Option<Vec<u16>>,
    #[serde(default)]
    pub verify_tls: Option<bool>,
    #[serde(default)]
    pub headers: StringMap,
}

fn default_fixtures_dir() -> PathBuf {
    PathBuf::from("tests/resources")
}

impl SuiteConfig {
    /// Load a suite file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read suite file '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse a suite from YAML
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let suite: SuiteConfig = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Failed to parse suite YAML: {e}")))?;
        suite.validate()?;
        Ok(suite)
    }

    /// Select another environment
    pub fn with_environment(mut self, environment: impl Into<String>) -> Result<Self> {
        self.environment = environment.into();
        self.validate()?;
        Ok(self)
    }

    /// Base URL of the selected environment
    pub fn base_url(&self) -> Result<&str> {
        Ok(&self.selected()?.base_url)
    }

    /// Validated client config for the selected environment
    pub fn client_config(&self) -> Result<ClientConfig> {
        let env = self.selected()?;
        let client = &self.client;

        let mut builder = ClientConfig::builder(env.base_url.clone())
            .headers(client.headers.clone())
            .headers(env.headers.clone());

        if let Some(secs) = client.timeout_secs {
            let timeout = Duration::try_from_secs_f64(secs)
                .map_err(|e| Error::config(format!("Invalid timeout_secs {secs}: {e}")))?;
            builder = builder.timeout(timeout);
        }
        if let Some(ms) = client.rate_limit_delay_ms {
            builder = builder.rate_limit_delay(Duration::from_millis(ms));
        }
        if let Some(retries) = client.max_retries {
            builder = builder.max_retries(retries);
        }
        if let Some(factor) = client.backoff_factor {
            builder = builder.backoff_factor(factor);
        }
        if let Some(codes) = &client.retry_status_codes {
            builder = builder.retry_status_codes(codes.iter().copied());
        }
        if let Some(verify) = client.verify_tls {
            builder = builder.verify_tls(verify);
        }

        builder.build()
    }

    /// Path for an endpoint alias, or the alias itself when unknown
    pub fn endpoint<'a>(&'a self, alias: &'a str) -> &'a str {
        self.endpoints.get(alias).map_or(alias, String::as_str)
    }

    /// Fixture store for this suite's directory and locale
    pub fn fixtures(&self) -> FixtureStore {
        let store = FixtureStore::new(&self.fixtures_dir);
        match &self.locale {
            Some(locale) => store.with_locale(locale.clone()),
            None => store,
        }
    }

    fn selected(&self) -> Result<&EnvironmentDef> {
        self.environments.get(&self.environment).ok_or_else(|| {
            let mut known: Vec<&str> = self.environments.keys().map(String::as_str).collect();
            known.sort_unstable();
            Error::config(format!(
                "Unknown environment '{}'. Known environments: {}",
                self.environment,
                known.join(", ")
            ))
        })
    }

    fn validate(&self) -> Result<()> {
        if self.environment.trim().is_empty() {
            return Err(Error::config("Suite environment cannot be empty"));
        }
        if self.environments.is_empty() {
            return Err(Error::config("Suite must define at least one environment"));
        }
        for (name, env) in &self.environments {
            if env.base_url.trim().is_empty() {
                return Err(Error::config(format!(
                    "Environment '{name}' base_url cannot be empty"
                )));
            }
        }
        self.selected()?;
        Ok(())
    }
}
