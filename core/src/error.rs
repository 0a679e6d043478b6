//! Error types for the marketplace API client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers frequently distinguish
//! "the resource does not exist" from "the server returned an unexpected
//! status." Every other non-2xx response lands in `Http`, carrying the
//! server's `error` message when one was supplied and a per-operation
//! fallback otherwise, so callers can branch on kind instead of matching
//! message strings.

use serde::Deserialize;
use thiserror::Error;

use crate::http::HttpResponse;

/// Errors returned by the resource clients and the transport.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404 — the requested resource does not exist.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The HTTP round trip itself failed (connect, DNS, I/O).
    #[error("network error: {0}")]
    Network(String),

    /// The response body could not be deserialized into the expected type.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The request payload could not be serialized to JSON.
    #[error("encode failed: {0}")]
    Encode(String),
}

/// Shape of the backend's error bodies: `{"error": "..."}`.
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Extract the server-supplied `error` field from a response body, if the
/// body is JSON carrying one.
pub(crate) fn server_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body).ok().map(|e| e.error)
}

/// Map non-success status codes to the appropriate `ApiError` variant.
///
/// `fallback` is the generic per-operation message used when the response
/// body does not carry a server message.
pub(crate) fn check_status(
    response: &HttpResponse,
    expected: u16,
    fallback: &str,
) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::Http {
        status: response.status,
        message: server_message(&response.body).unwrap_or_else(|| fallback.to_string()),
    })
}
