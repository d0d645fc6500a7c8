//! Authenticated session handles passed to command processors.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::mailbox::{MailboxStore, PathConverter};

/// Identity of an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Wraps a raw user name.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the user name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Binds an authenticated identity to the mailbox store it may act on.
///
/// A context lives for one transport request (JMAP) or one connection
/// (IMAP). It is deliberately not `Clone`: processors borrow it for one
/// store operation at a time, so invocations sharing a context run in
/// sequence.
pub struct SessionContext {
    user: Username,
    store: Arc<dyn MailboxStore>,
    delimiter: char,
}

impl SessionContext {
    /// Creates a context for `user` backed by `store`.
    pub fn new(user: Username, store: Arc<dyn MailboxStore>, delimiter: char) -> Self {
        Self {
            user,
            store,
            delimiter,
        }
    }

    /// Authenticated identity.
    #[must_use]
    pub fn user(&self) -> &Username {
        &self.user
    }

    /// Mailbox store capability granted to this session.
    #[must_use]
    pub fn store(&self) -> &dyn MailboxStore {
        self.store.as_ref()
    }

    /// Hierarchy delimiter for client-relative names.
    #[must_use]
    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Resolver for client-relative mailbox names.
    #[must_use]
    pub fn path_converter(&self) -> PathConverter<'_> {
        PathConverter::for_session(self)
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("user", &self.user)
            .field("delimiter", &self.delimiter)
            .finish_non_exhaustive()
    }
}
