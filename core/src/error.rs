//! Error types for the Instagram API client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because single-entity lookups must
//! distinguish "the server has nothing for this id" from every other
//! failure. When the server answers with a JSON envelope whose `meta` reports
//! an error, the server's own `error_type` and `error_message` are kept in
//! `Api`. Non-2xx responses that are not envelopes land in `HttpError` with
//! the raw status code and body for debugging.

use thiserror::Error;

/// Errors returned by `Session` operations and the layers beneath it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A paginated operation was asked for zero pages.
    #[error("the page number must be greater than 0")]
    InvalidPage,

    /// A single-entity lookup returned an envelope without `data`.
    #[error("{resource} with id = {id} cannot be accessed or may not exist")]
    NotFound { resource: &'static str, id: String },

    /// The envelope's `meta.code` reported a failure.
    #[error("API error {code} ({error_type}): {message}")]
    Api {
        code: u16,
        error_type: String,
        message: String,
    },

    /// The server returned a non-2xx status and a body that is not an envelope.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The request never produced a response.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// An envelope field the operation depends on is absent.
    #[error("response is missing `{0}`")]
    MissingField(&'static str),

    /// A URI template placeholder had no matching path parameter.
    #[error("no value supplied for uri placeholder `{0}`")]
    UnresolvedPlaceholder(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::DeserializationError(e.to_string())
    }
}
