//! Stateless HTTP request builder and response parser for the knowledge-graph API.
//!
//! # Design
//! `GraphClient` holds only the base URL and the graph limit policy, and
//! carries no mutable state between calls. Each endpoint is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method
//! that consumes an `HttpResponse`. The caller executes the round-trip.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::GraphLimit;
use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{GraphData, QaAnswer, QaRequest, Recommendation};

/// Characters left as-is inside a path segment; matches `encodeURIComponent`.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a value for use as a single path segment.
pub fn encode_segment(raw: &str) -> String {
    utf8_percent_encode(raw, PATH_SEGMENT).to_string()
}

/// Synchronous, stateless client for the knowledge-graph API.
///
/// Builds `HttpRequest` values and parses `HttpResponse` values without
/// touching the network.
#[derive(Debug, Clone)]
pub struct GraphClient {
    base_url: String,
    graph_limit: GraphLimit,
}

impl GraphClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            graph_limit: GraphLimit::default(),
        }
    }

    pub fn with_graph_limit(mut self, limit: GraphLimit) -> Self {
        self.graph_limit = limit;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn graph_limit(&self) -> GraphLimit {
        self.graph_limit
    }

    fn get(&self, path: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}{path}", self.base_url),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Core graph. Adds `?limit=n` only when the limit is capped.
    pub fn build_get_graph_data(&self) -> HttpRequest {
        match self.graph_limit {
            GraphLimit::ServerDefault => self.get("/graph-data"),
            GraphLimit::Capped(n) => self.get(&format!("/graph-data?limit={n}")),
        }
    }

    pub fn build_get_full_graph_data(&self) -> HttpRequest {
        self.get("/graph-data/full")
    }

    pub fn build_get_graph_data_by_entity(&self, entity: &str) -> HttpRequest {
        self.get(&format!("/graph-data/entity/{}", encode_segment(entity)))
    }

    pub fn build_fuzzy_search_entity(&self, keyword: &str) -> HttpRequest {
        self.get(&format!("/graph-data/entity/fuzzy/{}", encode_segment(keyword)))
    }

    pub fn build_qa(&self, input: &QaRequest) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/qa", self.base_url),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }

    pub fn build_get_entities(&self) -> HttpRequest {
        self.get("/entities")
    }

    pub fn build_get_recommendations(&self, entity: &str) -> HttpRequest {
        self.get(&format!("/recommendations/{}", encode_segment(entity)))
    }

    pub fn build_get_learning_path(&self, entity: &str) -> HttpRequest {
        self.get(&format!("/learning-path/{}", encode_segment(entity)))
    }

    /// Shared by every graph-data endpoint.
    pub fn parse_graph_data(&self, response: HttpResponse) -> Result<GraphData, ApiError> {
        parse_envelope(response)
    }

    pub fn parse_qa(&self, response: HttpResponse) -> Result<QaAnswer, ApiError> {
        parse_envelope(response)
    }

    pub fn parse_entities(&self, response: HttpResponse) -> Result<Vec<String>, ApiError> {
        parse_envelope(response)
    }

    pub fn parse_recommendations(&self, response: HttpResponse) -> Result<Vec<Recommendation>, ApiError> {
        parse_envelope(response)
    }

    /// The learning-path payload has no fixed schema.
    pub fn parse_learning_path(&self, response: HttpResponse) -> Result<Value, ApiError> {
        parse_envelope(response)
    }
}

/// Reject non-2xx responses before looking at the body.
pub(crate) fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::HttpStatus {
        status: response.status,
        body: response.body.clone(),
    })
}

fn parse_envelope<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    Envelope::decode(&response.body)?.into_result()
}
