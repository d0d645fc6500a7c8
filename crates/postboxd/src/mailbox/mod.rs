//! Boundary to the mailbox storage engine.
//!
//! Processors only ever talk to storage through [`MailboxStore`]. The store
//! owns name validation, existence checks and persistence; failures come back
//! as [`MailboxError`] values which the protocol layers translate into
//! responses. [`InMemoryMailboxStore`] is a reference implementation used by
//! the binary and the test suites.

mod errors;
mod memory;
mod path;

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

use crate::session::Username;

pub use errors::MailboxError;
pub use memory::InMemoryMailboxStore;
pub use path::PathConverter;

/// Namespace holding a user's own mailboxes.
pub const PRIVATE_NAMESPACE: &str = "#private";

/// Name of the inbox, matched case-insensitively on input.
pub const INBOX: &str = "INBOX";

/// Fully qualified mailbox location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MailboxPath {
    namespace: String,
    user: Username,
    name: String,
}

impl MailboxPath {
    /// Builds a path in the private namespace of `user`.
    pub fn private(user: Username, name: impl Into<String>) -> Self {
        Self {
            namespace: PRIVATE_NAMESPACE.to_owned(),
            user,
            name: name.into(),
        }
    }

    /// Namespace component.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Owning user.
    #[must_use]
    pub fn user(&self) -> &Username {
        &self.user
    }

    /// Full hierarchical name, for example `INBOX.Sub`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last hierarchy component of the name.
    #[must_use]
    pub fn leaf(&self, delimiter: char) -> &str {
        self.name
            .rsplit(delimiter)
            .next()
            .unwrap_or(self.name.as_str())
    }

    /// Returns the path of the direct parent, if the name is nested.
    #[must_use]
    pub fn parent(&self, delimiter: char) -> Option<Self> {
        self.name
            .rsplit_once(delimiter)
            .map(|(parent, _)| self.sibling(parent))
    }

    /// Returns every ancestor, outermost first.
    #[must_use]
    pub fn ancestors(&self, delimiter: char) -> Vec<Self> {
        let mut ancestors = Vec::new();
        let mut current = self.parent(delimiter);
        while let Some(path) = current {
            current = path.parent(delimiter);
            ancestors.push(path);
        }
        ancestors.reverse();
        ancestors
    }

    /// Builds the path of a direct child named `leaf`.
    #[must_use]
    pub fn child(&self, leaf: &str, delimiter: char) -> Self {
        self.sibling(&format!("{}{delimiter}{leaf}", self.name))
    }

    fn sibling(&self, name: &str) -> Self {
        Self {
            namespace: self.namespace.clone(),
            user: self.user.clone(),
            name: name.to_owned(),
        }
    }
}

impl fmt::Display for MailboxPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.namespace, self.user, self.name)
    }
}

/// Store-assigned mailbox identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub struct MailboxId(u32);

impl MailboxId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for MailboxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<MailboxId> for String {
    fn from(id: MailboxId) -> Self {
        id.to_string()
    }
}

/// Summary of one mailbox as returned by listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailboxMetadata {
    /// Store identifier.
    pub id: MailboxId,
    /// Location of the mailbox.
    pub path: MailboxPath,
    /// Number of messages currently held.
    pub messages: u32,
}

/// Counters reported when a mailbox is selected or polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MailboxStatus {
    /// Number of messages currently held.
    pub messages: u32,
    /// Next UID the store will assign.
    pub uid_next: u32,
    /// UID validity value of the mailbox.
    pub uid_validity: u32,
}

/// Asynchronous mailbox storage operations used by the processors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailboxStore: Send + Sync {
    /// Creates the mailbox at `path`, creating missing ancestors.
    ///
    /// # Errors
    ///
    /// Returns [`MailboxError::AlreadyExists`] when the mailbox is present and
    /// [`MailboxError::NameTooLong`] when the name exceeds the store limit.
    async fn create_mailbox(&self, path: &MailboxPath) -> Result<MailboxId, MailboxError>;

    /// Reports whether a mailbox exists at `path`.
    ///
    /// # Errors
    ///
    /// Returns a store error when the lookup fails.
    async fn mailbox_exists(&self, path: &MailboxPath) -> Result<bool, MailboxError>;

    /// Returns the counters for the mailbox at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`MailboxError::NotFound`] when no such mailbox exists.
    async fn status(&self, path: &MailboxPath) -> Result<MailboxStatus, MailboxError>;

    /// Lists every mailbox owned by `user`, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns a store error when the listing fails.
    async fn list_mailboxes(&self, user: &Username) -> Result<Vec<MailboxMetadata>, MailboxError>;
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn path(name: &str) -> MailboxPath {
        MailboxPath::private(Username::new("alice"), name)
    }

    #[rstest]
    fn ancestors_are_outermost_first() {
        let ancestors = path("INBOX.Work.2024").ancestors('.');
        let names: Vec<&str> = ancestors.iter().map(MailboxPath::name).collect();
        assert_eq!(names, vec!["INBOX", "INBOX.Work"]);
    }

    #[rstest]
    fn top_level_has_no_parent() {
        assert_eq!(path("INBOX").parent('.'), None);
        assert_eq!(path("INBOX").leaf('.'), "INBOX");
    }

    #[rstest]
    fn child_and_leaf_agree() {
        let child = path("INBOX").child("Sub", '.');
        assert_eq!(child.name(), "INBOX.Sub");
        assert_eq!(child.leaf('.'), "Sub");
    }

    #[rstest]
    fn displays_fully_qualified() {
        assert_eq!(path("Sent").to_string(), "#private:alice:Sent");
    }

    #[rstest]
    fn mailbox_id_serialises_as_string() {
        let json = serde_json::to_string(&MailboxId::new(7)).expect("serialise id");
        assert_eq!(json, r#""7""#);
    }
}
