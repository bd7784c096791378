//! Request and response hooks
//!
//! Hooks run synchronously in registration order. An error returned by a
//! hook aborts the request and reaches the caller unchanged.

use super::options::PreparedRequest;
use super::response::ApiResponse;
use crate::error::Result;

/// Called with the prepared request before it is paced and sent
pub trait RequestHook: Send + Sync {
    /// Inspect or modify the outgoing request
    fn on_request(&self, request: &mut PreparedRequest) -> Result<()>;
}

impl<F> RequestHook for F
where
    F: Fn(&mut PreparedRequest) -> Result<()> + Send + Sync,
{
    fn on_request(&self, request: &mut PreparedRequest) -> Result<()> {
        self(request)
    }
}

/// Called with the final response, successful or not
pub trait ResponseHook: Send + Sync {
    /// Observe the final response
    fn on_response(&self, response: &ApiResponse) -> Result<()>;
}

impl<F> ResponseHook for F
where
    F: Fn(&ApiResponse) -> Result<()> + Send + Sync,
{
    fn on_response(&self, response: &ApiResponse) -> Result<()> {
        self(response)
    }
}
