//! Method-level failures.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::mailbox::MailboxError;

/// Errors a method processor may report for one invocation.
#[derive(Debug, Error)]
pub enum MethodError {
    /// No processor is registered for the method name.
    #[error("unknown method: {name}")]
    UnknownMethod { name: String },

    /// The arguments did not match the method's schema.
    #[error("invalid arguments: {message}")]
    InvalidArguments {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// The mailbox store failed.
    #[error(transparent)]
    Mailbox(#[from] MailboxError),
}

impl MethodError {
    pub fn unknown_method(name: impl Into<String>) -> Self {
        Self::UnknownMethod { name: name.into() }
    }

    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps an argument decoding failure.
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::InvalidArguments {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Returns `true` for store errors that are expected business outcomes.
    pub fn is_domain(&self) -> bool {
        matches!(self, Self::Mailbox(error) if error.is_domain())
    }
}

/// Error result a classification rule selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorResponse {
    error_type: &'static str,
    describe: bool,
}

impl ErrorResponse {
    /// Error object of `error_type` with the error's message as description.
    pub const fn described(error_type: &'static str) -> Self {
        Self {
            error_type,
            describe: true,
        }
    }

    /// Error object of `error_type` without a description.
    pub const fn bare(error_type: &'static str) -> Self {
        Self {
            error_type,
            describe: false,
        }
    }

    pub fn error_type(&self) -> &'static str {
        self.error_type
    }

    /// Renders the `{type, description?}` object for `error`.
    pub fn to_value(&self, error: &MethodError) -> Value {
        let mut object = Map::new();
        object.insert("type".to_owned(), Value::from(self.error_type));
        if self.describe {
            object.insert("description".to_owned(), Value::from(error.to_string()));
        }
        Value::Object(object)
    }
}
