//! Failures reported by the mailbox store.

use thiserror::Error;

/// Errors surfaced by [`super::MailboxStore`] operations.
///
/// Every variant except [`MailboxError::Internal`] is a domain error: an
/// expected business-rule violation that the protocol layers answer with a
/// regular failure response. `Internal` covers faults outside the domain
/// model and is handled by each protocol's catch-all path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MailboxError {
    /// A mailbox already exists at the requested path.
    #[error("mailbox {path} already exists")]
    AlreadyExists { path: String },

    /// The mailbox name exceeds the store's length limit.
    #[error("mailbox name '{name}' exceeds {limit} characters")]
    NameTooLong { name: String, limit: usize },

    /// No mailbox exists at the requested path.
    #[error("mailbox {path} not found")]
    NotFound { path: String },

    /// The mailbox name is syntactically unacceptable.
    #[error("invalid mailbox name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// The store rejected the operation.
    #[error("mailbox store failure: {message}")]
    Store { message: String },

    /// Unexpected fault outside the domain model.
    #[error("internal store error: {message}")]
    Internal { message: String },
}

impl MailboxError {
    /// Returns `true` for expected business-rule violations.
    #[must_use]
    pub fn is_domain(&self) -> bool {
        !matches!(self, Self::Internal { .. })
    }

    /// Creates an already-exists error.
    pub fn already_exists(path: impl ToString) -> Self {
        Self::AlreadyExists {
            path: path.to_string(),
        }
    }

    /// Creates a name-too-long error.
    pub fn name_too_long(name: impl Into<String>, limit: usize) -> Self {
        Self::NameTooLong {
            name: name.into(),
            limit,
        }
    }

    /// Creates a not-found error.
    pub fn not_found(path: impl ToString) -> Self {
        Self::NotFound {
            path: path.to_string(),
        }
    }

    /// Creates an invalid-name error.
    pub fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a generic store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(MailboxError::already_exists("#private:a:INBOX"), true)]
    #[case(MailboxError::name_too_long("x", 1), true)]
    #[case(MailboxError::not_found("#private:a:Gone"), true)]
    #[case(MailboxError::invalid_name("", "empty"), true)]
    #[case(MailboxError::store("disk full"), true)]
    #[case(MailboxError::internal("lock poisoned"), false)]
    fn separates_domain_from_internal(#[case] error: MailboxError, #[case] domain: bool) {
        assert_eq!(error.is_domain(), domain);
    }
}
