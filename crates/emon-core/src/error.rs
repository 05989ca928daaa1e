//! Error types for emon-core.
//!
//! The variants follow the failure classes a dashboard client has to tell
//! apart when talking to the monitoring API.
//!
//! | Variant | Class | Typical handling |
//! |---------|-------|------------------|
//! | [`Error::Network`] | transport failure, no response | inline error; the live poller retries on its next tick |
//! | [`Error::Unauthorized`] | token rejected | the session logs out |
//! | [`Error::Validation`] | payload rejected with a message | show [`Error::user_message`] next to the form |
//! | [`Error::NotFound`] | entity absent | inline error |
//! | [`Error::Api`] | any other non-2xx answer | inline error |
//!
//! On the profile-fetch path the session treats every failure the same way
//! and drops the token; it cannot tell "bad token" from "server unreachable".

use emon_types::ParseError;
use thiserror::Error;

/// Fallback shown for rejected form submissions that carry no message.
pub const GENERIC_FORM_ERROR: &str = "The request was rejected. Check the form and try again.";

/// Errors produced by the API gateway and the session layer.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The server could not be reached or the connection broke.
    #[error("Server not reachable at {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The server rejected the credentials or the token.
    #[error("Not authorized")]
    Unauthorized,

    /// The server rejected a submitted payload.
    #[error("Rejected by server ({status}): {}", message.as_deref().unwrap_or(GENERIC_FORM_ERROR))]
    Validation { status: u16, message: Option<String> },

    /// The requested entity does not exist.
    #[error("Not found: {url}")]
    NotFound { url: String },

    /// Any other non-success answer.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// The body could not be decoded into the expected shape.
    #[error("Unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Local input could not be parsed.
    #[error(transparent)]
    InvalidInput(#[from] ParseError),

    /// The token slot could not be read or written.
    #[error("Token storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl Error {
    /// Wrap a transport failure.
    pub fn network(url: impl Into<String>, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::Network {
            url: url.into(),
            source: Box::new(source),
        }
    }

    /// Text suitable for showing next to a submitted form.
    ///
    /// Validation failures return the server's message verbatim; everything
    /// else falls back to the error's display text.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation {
                message: Some(message),
                ..
            } => message.clone(),
            Error::Validation { message: None, .. } => GENERIC_FORM_ERROR.to_string(),
            other => other.to_string(),
        }
    }

    /// Whether the server answered that the credential is bad.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Error::Unauthorized)
    }

    /// Whether retrying later could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Network { .. } => true,
            Error::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Result type alias using emon-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
