//! Per-request diagnostic context attached to tracing spans.
//!
//! Processors describe the request they are handling (action name, mailbox,
//! user) as ordered key/value pairs. The pipeline turns the context into a
//! span so every event emitted while the request runs carries it. The
//! context is metadata only; nothing branches on it.

use std::fmt;

use tracing::Span;

/// Tracing target for request spans.
pub(crate) const REQUEST_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::request");

/// Key naming the protocol action.
pub const ACTION: &str = "action";
/// Key naming the protocol family.
pub const PROTOCOL: &str = "protocol";
/// Key naming the authenticated user.
pub const USER: &str = "user";

/// Ordered key/value pairs describing one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticContext {
    entries: Vec<(&'static str, String)>,
}

impl DiagnosticContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces `key`.
    #[must_use]
    pub fn with(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        let value = value.to_string();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    /// Returns the value recorded for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| *existing == key)
            .map(|(_, value)| value.as_str())
    }

    /// Opens a span carrying this context.
    #[must_use]
    pub fn span(&self) -> Span {
        tracing::info_span!(target: REQUEST_TARGET, "request", context = %self)
    }
}

impl fmt::Display for DiagnosticContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in &self.entries {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}
