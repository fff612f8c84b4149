//! Error types for the portal client.
//!
//! # Design
//! Every failure the portal client can observe is a value of [`ApiError`],
//! never a panic. Callers that need the loose JSON shape the portal tooling
//! traditionally emits (`{"error": true, "status_code": .., "message": ..}`)
//! can render one with [`ApiError::to_record`].

use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::transport::TransportError;

/// Message used for every transport-level failure record.
pub const CONNECTION_ERROR: &str = "Connection error occurred";

/// Errors returned by session and resource operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A resource call was attempted without a token. No request was sent.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Logout was attempted without a token. No request was sent.
    #[error("Not logged in")]
    NotLoggedIn,

    /// The portal answered with something other than 200 or 201.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response (DNS, TLS, refused, timeout).
    #[error("Connection error occurred: {0}")]
    Transport(String),

    /// Task statuses outside the allow-list.
    #[error("Invalid status values: {}", .0.join(", "))]
    InvalidStatuses(Vec<String>),

    /// A success response whose body was not the JSON we expected.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        ApiError::Transport(err.to_string())
    }
}

impl ApiError {
    /// HTTP status attached to the failure, if the portal answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable message as it appears in an error record. For HTTP
    /// failures this is the raw response body.
    pub fn message(&self) -> String {
        match self {
            ApiError::Http { body, .. } => body.clone(),
            ApiError::Transport(_) => CONNECTION_ERROR.to_string(),
            other => other.to_string(),
        }
    }

    /// Transport exception description, if any.
    pub fn exception(&self) -> Option<&str> {
        match self {
            ApiError::Transport(description) => Some(description.as_str()),
            _ => None,
        }
    }

    /// Render the uniform error record.
    pub fn to_record(&self) -> Value {
        let mut record = Map::new();
        record.insert("error".to_string(), Value::Bool(true));
        if let Some(status) = self.status_code() {
            record.insert("status_code".to_string(), json!(status));
        }
        if let Some(exception) = self.exception() {
            record.insert("exception".to_string(), json!(exception));
        }
        if let ApiError::InvalidStatuses(values) = self {
            record.insert("invalid_statuses".to_string(), json!(values));
        }
        record.insert("message".to_string(), Value::String(self.message()));
        Value::Object(record)
    }
}
