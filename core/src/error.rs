//! Error types for the resource client.
//!
//! # Design
//! Every failure carries two messages. `Display` gives the technical one for
//! logs and diagnostics; `user_message()` gives a fixed remediation line meant
//! for end users. Transport and status failures also keep the descriptor, the
//! request that was sent, and the response if one arrived, boxed in a
//! `Failure` so `ApiError` stays small.
//!
//! Status handling is deliberately coarse: 401 is `Authentication`, every
//! other status >= 400 is `Http`. Callers that need 403/404/429 semantics
//! match on `ApiError::status()`.

use crate::descriptor::Descriptor;
use crate::http::{HttpRequest, HttpResponse};

pub const CONFIGURATION_USER_MESSAGE: &str =
    "The client is not configured for this request. Sign in and retry.";
pub const CONNECTION_USER_MESSAGE: &str =
    "Could not reach the server. Check your connection and retry.";
pub const AUTHENTICATION_USER_MESSAGE: &str = "You are not signed in. Sign in and retry.";
pub const HTTP_USER_MESSAGE: &str =
    "The request could not be completed. Please try again later.";
pub const DATA_USER_MESSAGE: &str = "The server sent data this client does not understand.";

/// Diagnostic payload of a failed round trip.
#[derive(Debug, Clone)]
pub struct Failure {
    pub message: String,
    pub descriptor: Descriptor,
    /// The request as sent, with the Authorization value redacted.
    pub request: HttpRequest,
    /// `None` when the transport failed before a response arrived.
    pub response: Option<HttpResponse>,
}

/// Errors returned by `ResourceClient`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The call could not be built from the client's configuration, e.g. a
    /// stored token was requested but none is set. No request was sent.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// The transport failed before any response arrived.
    #[error("connection failed: {}", .0.message)]
    Connection(Box<Failure>),

    /// The server returned 401.
    #[error("authentication failed: {}", .0.message)]
    Authentication(Box<Failure>),

    /// The server returned a status >= 400 other than 401.
    #[error("request failed: {}", .0.message)]
    Http(Box<Failure>),

    /// A body or query value could not be encoded as JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// A success body could not be decoded into the expected type.
    #[error("deserialization failed: {source}")]
    Deserialization {
        #[source]
        source: serde_json::Error,
        body: String,
    },
}

impl ApiError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        ApiError::Configuration {
            message: message.into(),
        }
    }

    /// Fixed remediation text for end users. Never contains request data.
    pub fn user_message(&self) -> &'static str {
        match self {
            ApiError::Configuration { .. } => CONFIGURATION_USER_MESSAGE,
            ApiError::Connection(_) => CONNECTION_USER_MESSAGE,
            ApiError::Authentication(_) => AUTHENTICATION_USER_MESSAGE,
            ApiError::Http(_) => HTTP_USER_MESSAGE,
            ApiError::Serialization(_) | ApiError::Deserialization { .. } => DATA_USER_MESSAGE,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            ApiError::Connection(failure)
            | ApiError::Authentication(failure)
            | ApiError::Http(failure) => Some(failure),
            _ => None,
        }
    }

    /// HTTP status of the response that caused this error, if any.
    pub fn status(&self) -> Option<u16> {
        self.failure()
            .and_then(|failure| failure.response.as_ref())
            .map(|response| response.status)
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, ApiError::Connection(_))
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, ApiError::Authentication(_))
    }
}
