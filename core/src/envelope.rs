//! The `{code, msg, data}` wrapper every backend response carries.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// Envelope code that marks a successful response.
pub const SUCCESS_CODE: i64 = 200;

/// Message used when a failed envelope carries no (or an empty) `msg`.
pub const FALLBACK_MESSAGE: &str = "request failed";

/// A decoded response envelope. `data` stays untyped until the code has been
/// checked, because failed envelopes often carry a placeholder payload that
/// does not match the success shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub code: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    pub fn decode(body: &str) -> Result<Self, ApiError> {
        serde_json::from_str(body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    /// The message a failure built from this envelope would carry.
    pub fn failure_message(&self) -> &str {
        match self.msg.as_deref() {
            Some(msg) if !msg.is_empty() => msg,
            _ => FALLBACK_MESSAGE,
        }
    }

    /// Unwrap the payload, or turn a non-200 code into `ApiError::Application`.
    pub fn into_result<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        if !self.is_success() {
            return Err(ApiError::Application {
                code: self.code,
                message: self.failure_message().to_string(),
            });
        }
        serde_json::from_value(self.data).map_err(|e| ApiError::Deserialization(e.to_string()))
    }
}
