//! HTTP client module
//!
//! Provides the request agent used by step definitions.
//!
//! # Features
//!
//! - **Automatic Retries**: Configurable status set with exponential backoff
//! - **Pacing**: Minimum spacing between requests of one agent
//! - **Hooks**: Request and response callbacks in registration order
//! - **Authentication**: Bearer token and Basic helpers

mod client;
mod config;
mod hooks;
mod options;
mod rate_limit;
mod response;
mod retry;

pub use client::RequestAgent;
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_RETRY_STATUS_CODES};
pub use hooks::{RequestHook, ResponseHook};
pub use options::{Body, FilePart, PreparedRequest, RequestOptions, DEFAULT_PART_MIME};
pub use rate_limit::Pacer;
pub use response::ApiResponse;
pub use retry::RetryPolicy;
