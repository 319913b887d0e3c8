//! Async client for the knowledge-graph question-answering API.
//!
//! # Overview
//! Every backend response is wrapped in an envelope `{code, msg, data}`.
//! Calls resolve to `data` when `code == 200` and fail with `msg` otherwise.
//! Transport failures (network, timeout, non-2xx) pass through untouched.
//!
//! # Design
//! - `GraphClient` is sans-IO: `build_*` produces an `HttpRequest`,
//!   `parse_*` consumes an `HttpResponse`. Any host can drive it.
//! - `ApiClient` drives `GraphClient` over `reqwest` and runs the
//!   `Interceptor` hooks; `TracingInterceptor` is attached unless
//!   `ClientConfig::log_traffic` is off.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod interceptor;
pub mod transport;
pub mod types;

pub use client::{encode_segment, GraphClient};
pub use config::{ClientConfig, GraphLimit};
pub use envelope::{Envelope, FALLBACK_MESSAGE};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use interceptor::{Interceptor, TracingInterceptor};
pub use transport::{ApiClient, RequestOptions};
pub use types::{GraphData, GraphEdge, GraphNode, QaAnswer, QaRequest, Recommendation};
