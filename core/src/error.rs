//! Error types for the Wekan API client.
//!
//! # Design
//! Transport and JSON failures are wrapped without added context so the
//! underlying cause reaches the caller unchanged. A reply with a non-2xx
//! status is only an error for the typed operations; the generic call
//! returns it as `ApiResponse::Failure`.

use serde_json::Value;
use thiserror::Error;

/// Errors returned by `WekanApi` parsers and `WekanClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, I/O or protocol failure below HTTP.
    #[error(transparent)]
    Transport(#[from] ureq::Error),

    /// The response body was not valid JSON or did not match the expected
    /// shape.
    #[error("invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),

    /// A JSON object lacked a key the client needs (e.g. `token` on login).
    #[error("missing field `{field}` in response")]
    MissingField { field: &'static str },

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: Value },

    /// No board carries the requested title.
    #[error("board not found: {0}")]
    BoardNotFound(String),

    /// No list on the resolved board carries the requested title.
    #[error("list not found: {0}")]
    ListNotFound(String),

    #[error("invalid proxy `{0}`")]
    InvalidProxy(String),

    #[error("configuration error: {0}")]
    Config(String),
}
