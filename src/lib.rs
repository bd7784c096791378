// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # BDD API Client
//!
//! HTTP plumbing for behaviour-driven API test suites: a request agent with
//! retry, pacing, hooks and authentication, a registry of named agents, and
//! the fixture, matching and variable helpers step definitions build on.
//!
//! ## Features
//!
//! - **Request Agent**: GET/POST/PUT/PATCH/DELETE/HEAD/OPTIONS against a base URL
//! - **Retry**: Exponential backoff on retryable statuses and transient failures
//! - **Pacing**: Minimum spacing between requests of one agent
//! - **Auth**: Bearer and Basic credentials with redacted logging
//! - **Hooks**: Request and response callbacks in registration order
//! - **Suites**: YAML environments, endpoint aliases and localized fixtures
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bdd_api_client::{ClientConfig, RequestAgent, RequestOptions, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ClientConfig::builder("https://api.example.com")
//!         .max_retries(3)
//!         .build()?;
//!     let mut agent = RequestAgent::open(config)?;
//!     agent.set_oauth_token("token");
//!
//!     let response = agent.get("health", RequestOptions::new()).await?;
//!     assert_eq!(response.status_code(), 200);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  Step definitions / CLI                       │
//! └──────────────────────────────────────────────────────────────┘
//!          │                    │                    │
//! ┌────────┴───────┬────────────┴───────┬────────────┴──────────┐
//! │  Registry      │  Request Agent     │  Suite helpers        │
//! ├────────────────┼────────────────────┼───────────────────────┤
//! │ name → agent   │ URL + headers      │ SuiteConfig (YAML)    │
//! │ create/get     │ hooks              │ FixtureStore          │
//! │ close_all      │ pacer, retry       │ matcher, vars         │
//! └────────────────┴────────────────────┴───────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the client
pub mod error;

/// Common types and type aliases
pub mod types;

/// Credentials and header redaction
pub mod auth;

/// HTTP request agent with retry, pacing and hooks
pub mod http;

/// Named agent registry
pub mod registry;

/// Expected-response matching
pub mod matcher;

/// JSON fixture loading
pub mod fixtures;

/// Scoped scenario variables
pub mod vars;

/// Suite configuration (environments, endpoints, fixtures)
pub mod suite;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use http::{ApiResponse, ClientConfig, RequestAgent, RequestOptions};
pub use registry::ClientRegistry;
pub use suite::SuiteConfig;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
