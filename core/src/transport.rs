//! Async executor that runs `GraphClient` requests over `reqwest`.
//!
//! # Design
//! `ApiClient` owns one pooled `reqwest::Client` built from a `ClientConfig`
//! and never mutates it, so clones share the pool and calls can run
//! concurrently. Every operation goes through `call`, which is the only
//! place interceptors fire and the only place envelopes are unwrapped.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::instrument;
use url::Url;

use crate::client::{check_status, GraphClient};
use crate::config::ClientConfig;
use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::interceptor::{Interceptor, TracingInterceptor};
use crate::types::{GraphData, QaAnswer, QaRequest, Recommendation};

/// Per-call overrides. Only `qa` accepts them.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub timeout: Option<Duration>,
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Async client for the knowledge-graph API.
///
/// Each method resolves to the envelope's `data` field, or fails with a
/// transport error (passed through) or an application error (non-200 code).
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    endpoints: GraphClient,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl ApiClient {
    /// Build a client. Fails only on an invalid base URL or header; the
    /// network is not touched until the first call.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        Url::parse(&config.base_url)
            .map_err(|e| ApiError::Config(format!("invalid base URL {:?}: {e}", config.base_url)))?;

        let headers = header_map(&config.headers)?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;

        let mut interceptors: Vec<Arc<dyn Interceptor>> = Vec::new();
        if config.log_traffic {
            interceptors.push(Arc::new(TracingInterceptor));
        }

        Ok(Self {
            http,
            endpoints: GraphClient::new(&config.base_url).with_graph_limit(config.graph_limit),
            interceptors,
        })
    }

    /// `ClientConfig::from_env()` followed by `new`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Attach another hook. Hooks run in the order they were added.
    pub fn with_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// The request builder this client executes.
    pub fn endpoints(&self) -> &GraphClient {
        &self.endpoints
    }

    #[instrument(name = "get_graph_data", skip(self))]
    pub async fn get_graph_data(&self) -> Result<GraphData, ApiError> {
        let request = self.endpoints.build_get_graph_data();
        self.call(Ok(request), &RequestOptions::default()).await
    }

    #[instrument(name = "get_full_graph_data", skip(self))]
    pub async fn get_full_graph_data(&self) -> Result<GraphData, ApiError> {
        let request = self.endpoints.build_get_full_graph_data();
        self.call(Ok(request), &RequestOptions::default()).await
    }

    #[instrument(name = "get_graph_data_by_entity", skip(self))]
    pub async fn get_graph_data_by_entity(&self, entity: &str) -> Result<GraphData, ApiError> {
        let request = self.endpoints.build_get_graph_data_by_entity(entity);
        self.call(Ok(request), &RequestOptions::default()).await
    }

    #[instrument(name = "fuzzy_search_entity", skip(self))]
    pub async fn fuzzy_search_entity(&self, keyword: &str) -> Result<GraphData, ApiError> {
        let request = self.endpoints.build_fuzzy_search_entity(keyword);
        self.call(Ok(request), &RequestOptions::default()).await
    }

    /// Ask a question. A bare string is sent as `{"question": ...}`; a
    /// `QaRequest` is forwarded as-is.
    pub async fn qa(&self, input: impl Into<QaRequest>) -> Result<QaAnswer, ApiError> {
        self.qa_with_options(input, &RequestOptions::default()).await
    }

    pub async fn qa_with_options(
        &self,
        input: impl Into<QaRequest>,
        options: &RequestOptions,
    ) -> Result<QaAnswer, ApiError> {
        self.send_qa(input.into(), options).await
    }

    #[instrument(name = "qa", skip(self, input, options), fields(question = %input.question))]
    async fn send_qa(&self, input: QaRequest, options: &RequestOptions) -> Result<QaAnswer, ApiError> {
        let request = self.endpoints.build_qa(&input);
        self.call(request, options).await
    }

    #[instrument(name = "get_entities", skip(self))]
    pub async fn get_entities(&self) -> Result<Vec<String>, ApiError> {
        let request = self.endpoints.build_get_entities();
        self.call(Ok(request), &RequestOptions::default()).await
    }

    #[instrument(name = "get_recommendations", skip(self))]
    pub async fn get_recommendations(&self, entity: &str) -> Result<Vec<Recommendation>, ApiError> {
        let request = self.endpoints.build_get_recommendations(entity);
        self.call(Ok(request), &RequestOptions::default()).await
    }

    #[instrument(name = "get_learning_path", skip(self))]
    pub async fn get_learning_path(&self, entity: &str) -> Result<Value, ApiError> {
        let request = self.endpoints.build_get_learning_path(entity);
        self.call(Ok(request), &RequestOptions::default()).await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        request: Result<HttpRequest, ApiError>,
        options: &RequestOptions,
    ) -> Result<T, ApiError> {
        let prepared = request.and_then(|request| {
            let headers = request.headers.iter().chain(&options.headers);
            Ok((header_map(headers)?, request))
        });
        let (headers, request) = match prepared {
            Ok(prepared) => prepared,
            Err(err) => {
                self.notify_error(None, &err);
                return Err(err);
            }
        };

        for interceptor in &self.interceptors {
            interceptor.on_request(&request);
        }

        let result = self.execute(&request, headers, options.timeout).await.and_then(|response| {
            let envelope = Envelope::decode(&response.body)?;
            for interceptor in &self.interceptors {
                interceptor.on_response(&request, &response, &envelope);
            }
            envelope.into_result()
        });

        if let Err(err) = &result {
            self.notify_error(Some(&request), err);
        }
        result
    }

    /// One HTTP round-trip. Non-2xx statuses become `ApiError::HttpStatus`.
    async fn execute(
        &self,
        request: &HttpRequest,
        headers: HeaderMap,
        timeout: Option<Duration>,
    ) -> Result<HttpResponse, ApiError> {
        let mut builder = match request.method {
            HttpMethod::Get => self.http.get(&request.path),
            HttpMethod::Post => self.http.post(&request.path),
        };
        builder = builder.headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(ApiError::Transport)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(ApiError::Transport)?;

        let response = HttpResponse { status, headers, body };
        check_status(&response)?;
        Ok(response)
    }

    fn notify_error(&self, request: Option<&HttpRequest>, err: &ApiError) {
        for interceptor in &self.interceptors {
            interceptor.on_error(request, err);
        }
    }
}

/// Validate header pairs up front so a bad name or value is a `Config`
/// error rather than a failed send. Later pairs replace earlier ones.
fn header_map<'a>(pairs: impl IntoIterator<Item = &'a (String, String)>) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        let name = HeaderName::try_from(name.as_str())
            .map_err(|e| ApiError::Config(format!("invalid header name {name:?}: {e}")))?;
        let value = HeaderValue::try_from(value.as_str())
            .map_err(|e| ApiError::Config(format!("invalid header value {value:?}: {e}")))?;
        headers.insert(name, value);
    }
    Ok(headers)
}
