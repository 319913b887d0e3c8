//! Request/response hooks attached to an `ApiClient`.
//!
//! Hooks observe traffic; they never alter a request or a result. The
//! default `TracingInterceptor` is what `ClientConfig::log_traffic` toggles.

use std::fmt;

use tracing::{debug, error, warn};

use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

/// Observer invoked around every request an `ApiClient` sends.
pub trait Interceptor: Send + Sync + fmt::Debug {
    /// Called right before the request goes out.
    fn on_request(&self, _request: &HttpRequest) {}

    /// Called once the response body has been decoded into an envelope,
    /// whatever its code.
    fn on_response(&self, _request: &HttpRequest, _response: &HttpResponse, _envelope: &Envelope) {}

    /// Called for every failure. `request` is `None` when the request could
    /// not even be built.
    fn on_error(&self, _request: Option<&HttpRequest>, _error: &ApiError) {}
}

/// Logs traffic through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingInterceptor;

impl Interceptor for TracingInterceptor {
    fn on_request(&self, request: &HttpRequest) {
        debug!(
            http.method = %request.method,
            http.url = %request.path,
            http.body = request.body.as_deref().unwrap_or(""),
            "outgoing request"
        );
    }

    fn on_response(&self, request: &HttpRequest, response: &HttpResponse, envelope: &Envelope) {
        debug!(
            http.method = %request.method,
            http.url = %request.path,
            http.status_code = response.status,
            http.content_type = response.header("content-type").unwrap_or(""),
            envelope.code = envelope.code,
            envelope.msg = envelope.msg.as_deref().unwrap_or(""),
            envelope.data = %envelope.data,
            "response envelope"
        );
    }

    fn on_error(&self, request: Option<&HttpRequest>, err: &ApiError) {
        let url = request.map(|r| r.path.as_str()).unwrap_or("");
        if err.is_application() {
            warn!(http.url = url, error = %err, "request failed");
        } else {
            error!(http.url = url, error = %err, "request error");
        }
    }
}
