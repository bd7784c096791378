//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat, TargetArgs};
use crate::error::{Error, Result, ResultExt};
use crate::fixtures::FixtureStore;
use crate::http::{ApiResponse, ClientConfig, RequestAgent, RequestOptions};
use crate::matcher;
use crate::suite::SuiteConfig;
use crate::types::{JsonValue, Method};
use serde_json::json;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::debug;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Request {
                method,
                endpoint,
                query,
                json,
            } => self.request(method, endpoint, query, json.as_deref()).await,
            Commands::Check {
                endpoint,
                fixture,
                fixtures_dir,
                locale,
                status,
            } => {
                self.check(
                    endpoint,
                    fixture,
                    fixtures_dir.clone(),
                    locale.as_deref(),
                    *status,
                )
                .await
            }
        }
    }

    /// Send one request and print the response
    async fn request(
        &self,
        method: &str,
        endpoint: &str,
        query: &[String],
        json_body: Option<&str>,
    ) -> Result<()> {
        let method: Method = method.parse()?;
        let suite = load_suite(&self.cli.target)?;
        let agent = open_agent(&self.cli.target, suite.as_ref())?;
        let endpoint = resolve_endpoint(suite.as_ref(), endpoint);

        let mut options = RequestOptions::new();
        for pair in query {
            let (key, value) = split_pair(pair, '=')?;
            options = options.query(key, value);
        }
        if let Some(body) = json_body {
            let body: JsonValue = serde_json::from_str(body).context("Invalid --json body")?;
            options = options.json(body);
        }

        let started = Instant::now();
        let response = agent.request(method, endpoint, options).await;
        agent.close();
        let response = response?;

        self.output_message(&response_message(&response, started.elapsed()));
        Ok(())
    }

    /// GET an endpoint and match its body against a fixture
    async fn check(
        &self,
        endpoint: &str,
        fixture: &str,
        fixtures_dir: Option<PathBuf>,
        locale: Option<&str>,
        expected_status: u16,
    ) -> Result<()> {
        let suite = load_suite(&self.cli.target)?;
        let store = fixture_store(suite.as_ref(), fixtures_dir, locale);
        let expected = store.load(fixture)?;

        let agent = open_agent(&self.cli.target, suite.as_ref())?;
        let endpoint = resolve_endpoint(suite.as_ref(), endpoint);

        let started = Instant::now();
        let response = agent.get(endpoint, RequestOptions::new()).await;
        agent.close();
        let response = response?;
        let elapsed = started.elapsed();

        let mut errors = Vec::new();
        if response.status_code() != expected_status {
            errors.push(format!(
                "status: expected {expected_status}, got {}",
                response.status_code()
            ));
        }
        match response.json::<JsonValue>() {
            Ok(body) => errors.extend(matcher::mismatches(&body, &expected)),
            Err(e) => errors.push(format!("body: {e}")),
        }

        let status = if errors.is_empty() { "SUCCEEDED" } else { "FAILED" };
        self.output_message(&json!({
            "type": "CHECK",
            "check": {
                "status": status,
                "url": response.url(),
                "httpStatus": response.status_code(),
                "attempts": response.attempts(),
                "elapsedMs": elapsed.as_millis() as u64,
                "fixture": fixture,
                "errors": errors,
            }
        }));

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Mismatch { errors })
        }
    }

    /// Output a message
    fn output_message(&self, msg: &JsonValue) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

fn load_suite(target: &TargetArgs) -> Result<Option<SuiteConfig>> {
    let Some(path) = &target.suite else {
        return Ok(None);
    };
    let suite = SuiteConfig::load(path)?;
    let suite = match &target.env {
        Some(env) => suite.with_environment(env.clone())?,
        None => suite,
    };
    debug!(suite = %path.display(), environment = %suite.environment, "Suite loaded");
    Ok(Some(suite))
}

/// Build the agent config from the suite or `--base-url`, then apply overrides
fn build_config(target: &TargetArgs, suite: Option<&SuiteConfig>) -> Result<ClientConfig> {
    let mut config = match (suite, &target.base_url) {
        (Some(suite), _) => suite.client_config()?,
        (None, Some(base_url)) => ClientConfig::new(base_url.clone())?,
        (None, None) => {
            return Err(Error::config(
                "No target specified (use --base-url or --suite)",
            ))
        }
    };

    if let Some(secs) = target.timeout_secs {
        config.timeout = Duration::try_from_secs_f64(secs)
            .map_err(|e| Error::config(format!("Invalid timeout {secs}: {e}")))?;
    }
    if let Some(retries) = target.max_retries {
        config.max_retries = retries;
    }
    if let Some(factor) = target.backoff_factor {
        config.backoff_factor = factor;
    }
    if let Some(ms) = target.rate_limit_ms {
        config.rate_limit_delay = Duration::from_millis(ms);
    }
    if target.insecure {
        config.verify_tls = false;
    }

    config.validate()?;
    Ok(config)
}

fn open_agent(target: &TargetArgs, suite: Option<&SuiteConfig>) -> Result<RequestAgent> {
    let mut agent = RequestAgent::open(build_config(target, suite)?)?;

    for header in &target.headers {
        let (name, value) = split_pair(header, ':')?;
        agent.set_header(name, value)?;
    }
    if let Some(token) = &target.bearer {
        agent.set_oauth_token(token.clone());
    }
    if let Some(credentials) = &target.basic {
        let (username, password) = split_pair(credentials, ':')?;
        agent.set_basic_auth(username, password)?;
    }

    Ok(agent)
}

fn fixture_store(
    suite: Option<&SuiteConfig>,
    fixtures_dir: Option<PathBuf>,
    locale: Option<&str>,
) -> FixtureStore {
    let root = fixtures_dir
        .or_else(|| suite.map(|s| s.fixtures_dir.clone()))
        .unwrap_or_else(|| PathBuf::from("tests/resources"));
    let locale = locale
        .map(String::from)
        .or_else(|| suite.and_then(|s| s.locale.clone()));

    let store = FixtureStore::new(root);
    match locale {
        Some(locale) => store.with_locale(locale),
        None => store,
    }
}

fn resolve_endpoint<'a>(suite: Option<&'a SuiteConfig>, endpoint: &'a str) -> &'a str {
    suite.map_or(endpoint, |s| s.endpoint(endpoint))
}

/// Split `key<sep>value`, trimming both sides
fn split_pair(input: &str, separator: char) -> Result<(&str, &str)> {
    let (key, value) = input
        .split_once(separator)
        .ok_or_else(|| Error::config(format!("Expected 'key{separator}value', got '{input}'")))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(Error::config(format!("Empty key in '{input}'")));
    }
    Ok((key, value.trim()))
}

fn response_message(response: &ApiResponse, elapsed: Duration) -> JsonValue {
    let body = if response.bytes().is_empty() {
        JsonValue::Null
    } else {
        response
            .json::<JsonValue>()
            .unwrap_or_else(|_| JsonValue::String(response.text()))
    };

    json!({
        "type": "RESPONSE",
        "response": {
            "status": response.status_code(),
            "url": response.url(),
            "attempts": response.attempts(),
            "elapsedMs": elapsed.as_millis() as u64,
            "contentType": response.header("content-type"),
            "body": body,
        }
    })
}
