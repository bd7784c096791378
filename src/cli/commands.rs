//! CLI commands and argument parsing

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// BDD API client CLI
#[derive(Parser, Debug)]
#[command(name = "bdd-api-client")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where requests go and how the agent behaves
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Base URL of the API under test
    #[arg(short, long, global = true, conflicts_with = "suite")]
    pub base_url: Option<String>,

    /// Suite file (YAML)
    #[arg(short, long, global = true)]
    pub suite: Option<PathBuf>,

    /// Environment selected from the suite file
    #[arg(short, long, global = true, requires = "suite")]
    pub env: Option<String>,

    /// Extra header as `name:value` (repeatable)
    #[arg(short = 'H', long = "header", global = true)]
    pub headers: Vec<String>,

    /// Bearer token
    #[arg(long, global = true, conflicts_with = "basic")]
    pub bearer: Option<String>,

    /// Basic credentials as `user:password`
    #[arg(long, global = true)]
    pub basic: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout_secs: Option<f64>,

    /// Retries after the first attempt
    #[arg(long, global = true)]
    pub max_retries: Option<u32>,

    /// Exponential backoff factor in seconds
    #[arg(long, global = true)]
    pub backoff_factor: Option<f64>,

    /// Minimum milliseconds between requests
    #[arg(long, global = true)]
    pub rate_limit_ms: Option<u64>,

    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    pub insecure: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send one request and print the response
    Request {
        /// HTTP method
        method: String,

        /// Endpoint path, suite alias or absolute URL
        endpoint: String,

        /// Query parameter as `key=value` (repeatable)
        #[arg(short, long = "query")]
        query: Vec<String>,

        /// Inline JSON body
        #[arg(long)]
        json: Option<String>,
    },

    /// GET an endpoint and match the body against a fixture
    Check {
        /// Endpoint path, suite alias or absolute URL
        endpoint: String,

        /// Fixture reference, e.g. `healthCheck.validHealthCheckResponse`
        #[arg(long)]
        fixture: String,

        /// Fixture directory (defaults to the suite's)
        #[arg(long)]
        fixtures_dir: Option<PathBuf>,

        /// Fixture locale (defaults to the suite's)
        #[arg(long)]
        locale: Option<String>,

        /// Expected status code
        #[arg(long, default_value = "200")]
        status: u16,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    #[default]
    Json,
    /// Human-readable output
    Pretty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request() {
        let cli = Cli::parse_from([
            "bdd-api-client",
            "--base-url",
            "http://localhost",
            "-H",
            "X-A:1",
            "request",
            "post",
            "users",
            "--json",
            r#"{"name":"alice"}"#,
            "-q",
            "page=2",
        ]);
        assert_eq!(cli.target.base_url.as_deref(), Some("http://localhost"));
        assert_eq!(cli.target.headers, vec!["X-A:1"]);
        match cli.command {
            Commands::Request {
                method,
                endpoint,
                query,
                json,
            } => {
                assert_eq!(method, "post");
                assert_eq!(endpoint, "users");
                assert_eq!(query, vec!["page=2"]);
                assert!(json.is_some());
            }
            Commands::Check { .. } => panic!("expected request"),
        }
    }

    #[test]
    fn test_parse_check() {
        let cli = Cli::parse_from([
            "bdd-api-client",
            "check",
            "healthCheck",
            "--fixture",
            "healthCheck.validHealthCheckResponse",
            "--suite",
            "suite.yaml",
            "--env",
            "qa",
        ]);
        assert_eq!(cli.target.env.as_deref(), Some("qa"));
        assert!(matches!(cli.command, Commands::Check { status: 200, .. }));
    }

    #[test]
    fn test_base_url_conflicts_with_suite() {
        let result = Cli::try_parse_from([
            "bdd-api-client",
            "--base-url",
            "http://a",
            "--suite",
            "s.yaml",
            "check",
            "x",
            "--fixture",
            "f",
        ]);
        assert!(result.is_err());
    }
}
