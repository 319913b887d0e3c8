//! Client configuration.
//!
//! # Design
//! `ClientConfig` is plain data, fixed once an `ApiClient` is built. Defaults
//! match the deployed frontend (local backend, 120 s timeout, JSON content
//! type). `from_env` lets binaries override any field without code changes.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ApiError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

pub const ENV_BASE_URL: &str = "KG_API_BASE_URL";
pub const ENV_TIMEOUT_MS: &str = "KG_API_TIMEOUT_MS";
pub const ENV_GRAPH_LIMIT: &str = "KG_API_GRAPH_LIMIT";
pub const ENV_LOG_TRAFFIC: &str = "KG_API_LOG_TRAFFIC";

/// How many nodes `get_graph_data` asks the backend for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GraphLimit {
    /// Send no `limit` parameter; the backend picks its own cap.
    #[default]
    ServerDefault,
    /// Send `?limit=n`.
    Capped(u32),
}

impl FromStr for GraphLimit {
    type Err = ApiError;

    /// Accepts a positive integer, or `default` / `none` / `unbounded`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty()
            || s.eq_ignore_ascii_case("default")
            || s.eq_ignore_ascii_case("none")
            || s.eq_ignore_ascii_case("unbounded")
        {
            return Ok(GraphLimit::ServerDefault);
        }
        match s.parse::<u32>() {
            Ok(0) => Err(ApiError::Config("graph limit must be positive".to_string())),
            Ok(n) => Ok(GraphLimit::Capped(n)),
            Err(e) => Err(ApiError::Config(format!("invalid graph limit {s:?}: {e}"))),
        }
    }
}

impl fmt::Display for GraphLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphLimit::ServerDefault => f.write_str("default"),
            GraphLimit::Capped(n) => write!(f, "{n}"),
        }
    }
}

/// Everything needed to construct an `ApiClient`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Sent with every request.
    pub headers: Vec<(String, String)>,
    pub graph_limit: GraphLimit,
    /// Attach the tracing interceptor.
    pub log_traffic: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            graph_limit: GraphLimit::ServerDefault,
            log_traffic: true,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Defaults overridden by any `KG_API_*` variables that are set.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_BASE_URL) {
            config.base_url = url;
        }
        if let Some(ms) = lookup(ENV_TIMEOUT_MS) {
            let ms: u64 = ms
                .trim()
                .parse()
                .map_err(|e| ApiError::Config(format!("{ENV_TIMEOUT_MS}={ms:?}: {e}")))?;
            config.timeout = Duration::from_millis(ms);
        }
        if let Some(limit) = lookup(ENV_GRAPH_LIMIT) {
            config.graph_limit = limit.parse()?;
        }
        if let Some(flag) = lookup(ENV_LOG_TRAFFIC) {
            config.log_traffic = parse_flag(&flag)
                .ok_or_else(|| ApiError::Config(format!("{ENV_LOG_TRAFFIC}={flag:?}: expected a boolean")))?;
        }
        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_graph_limit(mut self, limit: GraphLimit) -> Self {
        self.graph_limit = limit;
        self
    }

    pub fn with_log_traffic(mut self, enabled: bool) -> Self {
        self.log_traffic = enabled;
        self
    }

    /// Adds a default header, replacing any existing one with the same
    /// (case-insensitive) name.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
