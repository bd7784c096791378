//! Error types for the API client
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! HTTP error statuses are not errors: the agent hands 4xx/5xx responses
//! back to the caller once retries are done.

use thiserror::Error;

/// The main error type for the API client
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Request to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request hook failed: {message}")]
    Hook { message: String },

    // ============================================================================
    // Registry Errors
    // ============================================================================
    #[error("Client '{name}' is already registered")]
    DuplicateName { name: String },

    #[error("Client '{name}' is not registered")]
    NotFound { name: String },

    // ============================================================================
    // Suite Errors
    // ============================================================================
    #[error("Fixture '{reference}': {message}")]
    Fixture { reference: String, message: String },

    #[error("Response did not match expected fixture:\n{}", errors.join("\n"))]
    Mismatch { errors: Vec<String> },

    #[error("Cannot resolve variable '{name}'")]
    Variable { name: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an invalid config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a hook error
    pub fn hook(message: impl Into<String>) -> Self {
        Self::Hook {
            message: message.into(),
        }
    }

    /// Create a fixture error
    pub fn fixture(reference: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fixture {
            reference: reference.into(),
            message: message.into(),
        }
    }

    /// Create an unresolved variable error
    pub fn variable(name: impl Into<String>) -> Self {
        Self::Variable { name: name.into() }
    }

    /// Check if this error is one the retry loop treats as transient
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transport { .. } | Error::Timeout { .. })
    }
}

/// Result type alias for the API client
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("base_url must not be empty");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: base_url must not be empty"
        );

        let err = Error::DuplicateName {
            name: "users".to_string(),
        };
        assert_eq!(err.to_string(), "Client 'users' is already registered");

        let err = Error::Timeout {
            url: "http://localhost/slow".to_string(),
            timeout_ms: 250,
        };
        assert_eq!(
            err.to_string(),
            "Request to http://localhost/slow timed out after 250ms"
        );
    }

    #[test]
    fn test_mismatch_display_lists_every_error() {
        let err = Error::Mismatch {
            errors: vec!["$.a: first".to_string(), "$.b: second".to_string()],
        };
        let text = err.to_string();
        assert!(text.contains("$.a: first"));
        assert!(text.contains("$.b: second"));
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::transport("http://x", "connection refused").is_retryable());
        assert!(Error::Timeout {
            url: "http://x".to_string(),
            timeout_ms: 1000
        }
        .is_retryable());

        assert!(!Error::config("test").is_retryable());
        assert!(!Error::hook("boom").is_retryable());
        assert!(!Error::NotFound {
            name: "x".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Invalid configuration: inner"));
    }
}
