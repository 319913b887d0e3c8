//! Error types for the knowledge-graph API client.
//!
//! # Design
//! Failures fall into two classes. Transport failures (`Transport`,
//! `HttpStatus`) happen before the envelope can be inspected and are passed
//! through as-is. Application failures (`Application`) come from a
//! well-formed envelope whose `code` is not 200. The remaining variants cover
//! local encode/decode problems and bad configuration.

use thiserror::Error;

/// Errors returned by `GraphClient` parse methods and `ApiClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The envelope reported a non-200 `code`. Displays as the bare message
    /// so callers can show it to users directly.
    #[error("{message}")]
    Application { code: i64, message: String },

    /// The server answered with a non-2xx HTTP status.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The request never produced a response: connection refused, DNS
    /// failure, timeout elapsed.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The response body was not an envelope, or `data` had the wrong shape.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Invalid base URL, header or environment value.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// True for failures at the network/HTTP layer.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_) | ApiError::HttpStatus { .. })
    }

    /// True when the backend signalled failure through the envelope.
    pub fn is_application(&self) -> bool {
        matches!(self, ApiError::Application { .. })
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            ApiError::Transport(err) => err.is_timeout(),
            _ => false,
        }
    }
}
