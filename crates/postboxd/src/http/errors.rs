//! Route failures and their transport-level responses.

use serde_json::json;
use thiserror::Error;

use super::message::{HttpResponse, WWW_AUTHENTICATE};
use crate::auth::AuthenticationError;
use crate::classify::{ErrorClassifier, ErrorRule, LogDirective};
use crate::pipeline::FailureKind;
use crate::provision::ProvisioningError;

/// Errors that end a routed request early.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The body could not be decoded.
    #[error("malformed request: {message}")]
    BadRequest {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Authentication failed.
    #[error("authentication failed: {0}")]
    Unauthorized(#[from] AuthenticationError),

    /// Provisioning failed.
    #[error("provisioning failed: {0}")]
    Provisioning(#[from] ProvisioningError),

    /// The `Accept` header asked for an unknown protocol version.
    #[error("unsupported JMAP version: {version}")]
    UnsupportedVersion { version: String },

    /// The response body could not be encoded.
    #[error("failed to serialize response: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Unexpected fault.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl RouteError {
    /// Failure class of the error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::BadRequest { .. } | Self::UnsupportedVersion { .. } => FailureKind::BadRequest,
            Self::Unauthorized(_) => FailureKind::Unauthorized,
            Self::Provisioning(_) | Self::Serialize(_) | Self::Internal { .. } => {
                FailureKind::Internal
            }
        }
    }

    /// Creates a bad-request error from a decoder failure.
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::BadRequest {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a bad-request error with a custom message.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an unsupported-version error.
    pub fn unsupported_version(version: impl Into<String>) -> Self {
        Self::UnsupportedVersion {
            version: version.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Catch-all table mapping escaping route errors to a failure class.
pub type TransportClassifier = ErrorClassifier<RouteError, FailureKind>;

/// Builds the transport classifier.
///
/// Malformed and unauthenticated requests are routine and logged at debug.
/// Everything else is unexpected and takes the error-level fallback.
#[must_use]
pub fn transport_rules() -> TransportClassifier {
    ErrorClassifier::new(
        vec![
            ErrorRule::new(
                "bad-request",
                |error| error.kind() == FailureKind::BadRequest,
                FailureKind::BadRequest,
                LogDirective::debug("rejected malformed request"),
            ),
            ErrorRule::new(
                "unauthorized",
                |error| error.kind() == FailureKind::Unauthorized,
                FailureKind::Unauthorized,
                LogDirective::debug("rejected unauthenticated request"),
            ),
        ],
        FailureKind::Internal,
        "unexpected error while handling request",
    )
}

/// Generic response for a failure class.
///
/// Bodies never carry error detail; the log line holds it instead.
#[must_use]
pub fn failure_response(kind: FailureKind) -> HttpResponse {
    let response = HttpResponse::new(kind.status_code());
    match kind {
        FailureKind::BadRequest => response,
        FailureKind::Unauthorized => response.with_header(WWW_AUTHENTICATE, "Bearer"),
        FailureKind::Internal => HttpResponse::json(kind.status_code(), &json!({"type": "serverError"}))
            .unwrap_or(response),
    }
}
