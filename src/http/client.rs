//! Request agent with retry, pacing and hooks
//!
//! Every call runs the same pipeline:
//! - resolve the URL against the base URL
//! - merge headers (built-in, config defaults, agent headers, bearer token, per-request)
//! - run request hooks
//! - wait for the pacer
//! - send, retrying retryable statuses and transient transport failures
//! - run response hooks on the final response

use super::config::ClientConfig;
use super::hooks::{RequestHook, ResponseHook};
use super::options::{insert_header, Body, FilePart, PreparedRequest, RequestOptions};
use super::rate_limit::Pacer;
use super::response::ApiResponse;
use super::retry::RetryPolicy;
use crate::auth::{redact_headers, Credentials};
use crate::error::{Error, Result};
use crate::types::Method;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use tracing::{debug, error, info, warn};

/// Longest body excerpt written to the log
const LOGGED_BODY_CHARS: usize = 500;

/// HTTP request agent bound to one [`ClientConfig`]
///
/// Dropping the agent releases its connection pool; [`RequestAgent::close`]
/// does the same explicitly.
pub struct RequestAgent {
    client: Client,
    config: ClientConfig,
    retry: RetryPolicy,
    pacer: Pacer,
    headers: HeaderMap,
    bearer_token: Option<String>,
    request_hooks: Vec<Box<dyn RequestHook>>,
    response_hooks: Vec<Box<dyn ResponseHook>>,
}

impl RequestAgent {
    /// Validate the config and open a connection pool for it
    pub fn open(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(!config.verify_tls)
            .pool_max_idle_per_host(10)
            .build()?;

        info!(base_url = %config.base_url, "HTTP client opened");

        Ok(Self {
            client,
            retry: config.retry_policy(),
            pacer: Pacer::new(config.rate_limit_delay),
            config,
            headers: HeaderMap::new(),
            bearer_token: None,
            request_hooks: Vec::new(),
            response_hooks: Vec::new(),
        })
    }

    /// Release the connection pool
    pub fn close(self) {
        info!(base_url = %self.config.base_url, "HTTP client closed");
    }

    /// The config this agent was opened with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Agent-level headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Set an agent-level header
    pub fn set_header(&mut self, key: &str, value: &str) -> Result<()> {
        insert_header(&mut self.headers, key, value)?;
        debug!(header = key, "Header set");
        Ok(())
    }

    /// Set several agent-level headers
    pub fn set_headers<K, V>(&mut self, headers: impl IntoIterator<Item = (K, V)>) -> Result<()>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in headers {
            self.set_header(key.as_ref(), value.as_ref())?;
        }
        Ok(())
    }

    /// Remove an agent-level header
    pub fn remove_header(&mut self, key: &str) {
        self.headers.remove(key);
    }

    /// Send `Authorization: Bearer <token>` with subsequent requests
    pub fn set_oauth_token(&mut self, token: impl Into<String>) {
        self.bearer_token = Some(token.into());
        info!("OAuth token set");
    }

    /// Stop sending the bearer token
    pub fn clear_oauth_token(&mut self) {
        self.bearer_token = None;
    }

    /// Current bearer token
    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }

    /// Store a Basic `Authorization` header, replacing the bearer token
    pub fn set_basic_auth(&mut self, username: &str, password: &str) -> Result<()> {
        let value = Credentials::basic(username, password).header_value();
        let value = HeaderValue::from_str(&value)
            .map_err(|e| Error::config(format!("Invalid basic credentials: {e}")))?;
        self.headers.insert(AUTHORIZATION, value);
        self.bearer_token = None;
        info!("Basic authentication configured");
        Ok(())
    }

    /// Append a hook run before every request
    pub fn register_request_hook(&mut self, hook: impl RequestHook + 'static) {
        self.request_hooks.push(Box::new(hook));
    }

    /// Append a hook run on every final response
    pub fn register_response_hook(&mut self, hook: impl ResponseHook + 'static) {
        self.response_hooks.push(Box::new(hook));
    }

    /// Make a GET request
    pub async fn get(&self, endpoint: &str, options: RequestOptions) -> Result<ApiResponse> {
        self.request(Method::GET, endpoint, options).await
    }

    /// Make a POST request
    pub async fn post(&self, endpoint: &str, options: RequestOptions) -> Result<ApiResponse> {
        self.request(Method::POST, endpoint, options).await
    }

    /// Make a PUT request
    pub async fn put(&self, endpoint: &str, options: RequestOptions) -> Result<ApiResponse> {
        self.request(Method::PUT, endpoint, options).await
    }

    /// Make a PATCH request
    pub async fn patch(&self, endpoint: &str, options: RequestOptions) -> Result<ApiResponse> {
        self.request(Method::PATCH, endpoint, options).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, endpoint: &str, options: RequestOptions) -> Result<ApiResponse> {
        self.request(Method::DELETE, endpoint, options).await
    }

    /// Make a HEAD request
    pub async fn head(&self, endpoint: &str, options: RequestOptions) -> Result<ApiResponse> {
        self.request(Method::HEAD, endpoint, options).await
    }

    /// Make an OPTIONS request
    pub async fn options(&self, endpoint: &str, options: RequestOptions) -> Result<ApiResponse> {
        self.request(Method::OPTIONS, endpoint, options).await
    }

    /// Make a generic request
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        let prepared = self.prepare(method, endpoint, options)?;

        self.pacer.wait().await;

        log_request(&prepared);
        let response = match self.dispatch(&prepared).await {
            Ok(response) => response,
            Err(e) => {
                error!(method = %prepared.method, url = %prepared.url, "Request failed: {e}");
                return Err(e);
            }
        };

        for hook in &self.response_hooks {
            hook.on_response(&response)?;
        }

        log_response(&response);
        Ok(response)
    }

    /// Resolve the URL, merge headers and run request hooks
    pub fn prepare(
        &self,
        method: Method,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<PreparedRequest> {
        let mut prepared = PreparedRequest {
            method,
            url: self.build_url(endpoint),
            headers: self.merge_headers(&options)?,
            query: options.query,
            body: options.body,
            timeout: options.timeout.unwrap_or(self.config.timeout),
        };

        for hook in &self.request_hooks {
            hook.on_request(&mut prepared)?;
        }
        if !self.request_hooks.is_empty() {
            debug!(count = self.request_hooks.len(), "Request hooks applied");
        }

        Ok(prepared)
    }

    /// Build full URL from endpoint
    pub fn build_url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return endpoint.to_string();
        }

        let base = self.config.base_url.trim_end_matches('/');
        let path = endpoint.trim_start_matches('/');
        format!("{base}/{path}")
    }

    /// Later layers win: built-in, config defaults, agent headers, bearer, per-request
    fn merge_headers(&self, options: &RequestOptions) -> Result<HeaderMap> {
        let mut merged = HeaderMap::new();
        merged.insert(ACCEPT, HeaderValue::from_static("application/json"));

        for (key, value) in &self.config.default_headers {
            insert_header(&mut merged, key, value)?;
        }

        for (key, value) in &self.headers {
            merged.insert(key.clone(), value.clone());
        }

        if let Some(ref token) = self.bearer_token {
            let value = Credentials::bearer(token.as_str()).header_value();
            insert_header(&mut merged, AUTHORIZATION.as_str(), &value)?;
        }

        for (key, value) in &options.headers {
            insert_header(&mut merged, key, value)?;
        }

        Ok(merged)
    }

    /// Send with retries and read the final response
    async fn dispatch(&self, prepared: &PreparedRequest) -> Result<ApiResponse> {
        let mut retries: u32 = 0;

        loop {
            let attempt = retries.saturating_add(1);

            let request = self
                .build_request(prepared)
                .map_err(|e| classify(e, prepared))?;

            match request.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();

                    if self.retry.should_retry_status(status) && self.retry.has_budget(retries) {
                        retries += 1;
                        let delay = self.retry.backoff(retries);
                        warn!(
                            "Request failed with {}, attempt {}/{}, retrying in {:?}",
                            status,
                            attempt,
                            self.retry.max_retries.saturating_add(1),
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    return ApiResponse::read(response, attempt)
                        .await
                        .map_err(|e| classify(e, prepared));
                }
                Err(e) => {
                    if is_transient(&e) && self.retry.has_budget(retries) {
                        retries += 1;
                        let delay = self.retry.backoff(retries);
                        warn!(
                            "Transport error ({}), attempt {}/{}, retrying in {:?}",
                            e,
                            attempt,
                            self.retry.max_retries.saturating_add(1),
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    return Err(classify(e, prepared));
                }
            }
        }
    }

    /// Build one attempt of the prepared request
    fn build_request(&self, prepared: &PreparedRequest) -> reqwest::Result<RequestBuilder> {
        let mut req = self
            .client
            .request(prepared.method.into(), &prepared.url)
            .headers(prepared.headers.clone())
            .timeout(prepared.timeout);

        if !prepared.query.is_empty() {
            req = req.query(&prepared.query);
        }

        Ok(match prepared.body {
            Some(Body::Json(ref value)) => req.json(value),
            Some(Body::Form(ref fields)) => req.form(fields),
            Some(Body::Text(ref text)) => req.body(text.clone()),
            Some(Body::Bytes(ref bytes)) => req.body(bytes.clone()),
            Some(Body::Multipart(ref parts)) => req.multipart(multipart_form(parts)?),
            None => req,
        })
    }
}

impl std::fmt::Debug for RequestAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestAgent")
            .field("config", &self.config)
            .field("pacer", &self.pacer)
            .field("has_bearer_token", &self.bearer_token.is_some())
            .field("request_hooks", &self.request_hooks.len())
            .field("response_hooks", &self.response_hooks.len())
            .finish_non_exhaustive()
    }
}

/// Fresh multipart form for one attempt
fn multipart_form(parts: &[FilePart]) -> reqwest::Result<Form> {
    parts.iter().try_fold(Form::new(), |form, part| {
        let file = Part::bytes(part.content.to_vec())
            .file_name(part.file_name.clone())
            .mime_str(&part.mime)?;
        Ok(form.part(part.field.clone(), file))
    })
}

/// Connection-level failures worth another attempt
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_connect() || e.is_timeout() || (e.is_request() && !e.is_builder())
}

/// Map a transport failure onto the error taxonomy
fn classify(e: reqwest::Error, prepared: &PreparedRequest) -> Error {
    if e.is_timeout() {
        return Error::Timeout {
            url: prepared.url.clone(),
            timeout_ms: prepared.timeout.as_millis() as u64,
        };
    }
    if e.is_builder() {
        return Error::Http(e);
    }
    Error::transport(prepared.url.clone(), error_chain(&e))
}

/// Error message including its sources
fn error_chain(e: &dyn std::error::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn log_request(prepared: &PreparedRequest) {
    info!("{} {}", prepared.method, prepared.url);

    if !prepared.query.is_empty() {
        info!("   Params: {:?}", prepared.query);
    }

    info!("   Headers: {:?}", redact_headers(&prepared.headers));

    match prepared.body {
        Some(Body::Json(ref value)) => info!("   Body: {value}"),
        Some(Body::Form(ref fields)) => info!("   Body: {fields:?}"),
        Some(Body::Text(ref text)) => info!("   Body: {}", truncate(text, LOGGED_BODY_CHARS)),
        Some(Body::Bytes(ref bytes)) => info!("   Body: <{} bytes>", bytes.len()),
        Some(Body::Multipart(ref parts)) => {
            for part in parts {
                info!(
                    "   File: {}={} ({}, {} bytes)",
                    part.field,
                    part.file_name,
                    part.mime,
                    part.content.len()
                );
            }
        }
        None => {}
    }
}

fn log_response(response: &ApiResponse) {
    info!(
        "Response Status: {} (attempts: {})",
        response.status_code(),
        response.attempts()
    );
    info!("   Response: {}", truncate(&response.text(), LOGGED_BODY_CHARS));
}

/// Cut a string to at most `max` characters
fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
