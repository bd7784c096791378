//! Authentication headers
//!
//! Supports: Bearer (OAuth access token) and HTTP Basic.
//!
//! Also decides which headers are masked when requests are logged.

use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue};

/// Headers whose values never reach the logs
const SENSITIVE_HEADERS: [&str; 4] = ["authorization", "proxy-authorization", "cookie", "x-api-key"];

/// Credentials that resolve to an `Authorization` header
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// OAuth2 bearer token
    Bearer { token: String },
    /// HTTP Basic username and password
    Basic { username: String, password: String },
}

impl Credentials {
    /// Bearer credentials
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    /// Basic credentials
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Value of the `Authorization` header for these credentials
    pub fn header_value(&self) -> String {
        match self {
            Credentials::Bearer { token } => format!("Bearer {token}"),
            Credentials::Basic { username, password } => {
                let encoded = base64::engine::general_purpose::STANDARD
                    .encode(format!("{username}:{password}"));
                format!("Basic {encoded}")
            }
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Bearer { .. } => f.write_str("Credentials::Bearer(***)"),
            Credentials::Basic { username, .. } => f
                .debug_struct("Credentials::Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
        }
    }
}

/// Whether a header value must be masked in logs
pub fn is_sensitive_header(name: &str) -> bool {
    SENSITIVE_HEADERS
        .iter()
        .any(|sensitive| sensitive.eq_ignore_ascii_case(name))
}

/// Render headers for logging with sensitive values masked
pub fn redact_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let shown = if is_sensitive_header(name.as_str()) {
                "***".to_string()
            } else {
                display_value(value)
            };
            (name.as_str().to_string(), shown)
        })
        .collect()
}

fn display_value(value: &HeaderValue) -> String {
    value
        .to_str()
        .map_or_else(|_| format!("{value:?}"), str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_header() {
        let creds = Credentials::bearer("my-bearer-token");
        assert_eq!(creds.header_value(), "Bearer my-bearer-token");
    }

    #[test]
    fn test_basic_header() {
        let creds = Credentials::basic("user", "pass");
        let header = creds.header_value();
        assert!(header.starts_with("Basic "));

        let encoded = header.strip_prefix("Basic ").unwrap();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), "user:pass");
    }

    #[test]
    fn test_debug_hides_secrets() {
        let rendered = format!("{:?}", Credentials::bearer("secret-token"));
        assert!(!rendered.contains("secret-token"));

        let rendered = format!("{:?}", Credentials::basic("alice", "hunter2"));
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_redact_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Bearer abc"));
        headers.insert("X-Api-Key", HeaderValue::from_static("k"));
        headers.insert("X-Trace", HeaderValue::from_static("t-1"));

        let redacted = redact_headers(&headers);
        assert!(redacted.contains(&("authorization".to_string(), "***".to_string())));
        assert!(redacted.contains(&("x-api-key".to_string(), "***".to_string())));
        assert!(redacted.contains(&("x-trace".to_string(), "t-1".to_string())));
    }

    #[test]
    fn test_sensitive_header_is_case_insensitive() {
        assert!(is_sensitive_header("AUTHORIZATION"));
        assert!(is_sensitive_header("Cookie"));
        assert!(!is_sensitive_header("Accept"));
    }
}
