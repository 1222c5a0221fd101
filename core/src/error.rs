//! Error types for the to-do API client.
//!
//! # Design
//! `NotFound` and `Validation` get dedicated variants because callers
//! distinguish "the item does not exist" and "the request was rejected" from
//! an unexpected status. Every other non-2xx response lands in `HttpError`.
//! The server's `{error}` message is carried when the body has one.

use thiserror::Error;

/// Errors returned by `TodoClient` parse methods and by transports.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404, or the item is not in the local mirror.
    #[error("todo not found")]
    NotFound,

    /// The server returned 400.
    #[error("request rejected: {0}")]
    Validation(String),

    /// The server returned a non-2xx status other than 400 or 404.
    #[error("HTTP {status}: {message}")]
    HttpError { status: u16, message: String },

    /// The request never produced a response.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),
}
