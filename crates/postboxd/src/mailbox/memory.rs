//! In-memory reference implementation of [`MailboxStore`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{MailboxError, MailboxId, MailboxMetadata, MailboxPath, MailboxStatus, MailboxStore};
use crate::session::Username;

#[derive(Debug, Clone, Copy)]
struct MailboxEntry {
    id: MailboxId,
    messages: u32,
    uid_next: u32,
}

#[derive(Debug, Default)]
struct StoreState {
    next_id: u32,
    mailboxes: BTreeMap<MailboxPath, MailboxEntry>,
}

impl StoreState {
    fn insert(&mut self, path: MailboxPath) -> MailboxId {
        self.next_id += 1;
        let id = MailboxId::new(self.next_id);
        self.mailboxes.insert(
            path,
            MailboxEntry {
                id,
                messages: 0,
                uid_next: 1,
            },
        );
        id
    }
}

/// Mailbox store holding all state in process memory.
///
/// Name length is measured in characters of the full hierarchical name.
/// Creating a nested mailbox creates its missing ancestors, mirroring what
/// IMAP clients expect from `CREATE a.b.c`.
#[derive(Debug)]
pub struct InMemoryMailboxStore {
    max_name_length: usize,
    delimiter: char,
    state: RwLock<StoreState>,
}

impl InMemoryMailboxStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(max_name_length: usize, delimiter: char) -> Self {
        Self {
            max_name_length,
            delimiter,
            state: RwLock::new(StoreState::default()),
        }
    }

    /// Records the arrival of one message, returning the new message count.
    ///
    /// Stands in for the delivery pipeline so sessions can observe mailbox
    /// changes made outside the current command.
    ///
    /// # Errors
    ///
    /// Returns [`MailboxError::NotFound`] when the mailbox does not exist.
    pub async fn deliver(&self, path: &MailboxPath) -> Result<u32, MailboxError> {
        let mut state = self.state.write().await;
        let entry = state
            .mailboxes
            .get_mut(path)
            .ok_or_else(|| MailboxError::not_found(path))?;
        entry.messages += 1;
        entry.uid_next += 1;
        Ok(entry.messages)
    }
}

#[async_trait]
impl MailboxStore for InMemoryMailboxStore {
    async fn create_mailbox(&self, path: &MailboxPath) -> Result<MailboxId, MailboxError> {
        if path.name().chars().count() > self.max_name_length {
            return Err(MailboxError::name_too_long(
                path.name(),
                self.max_name_length,
            ));
        }

        let mut state = self.state.write().await;
        if state.mailboxes.contains_key(path) {
            return Err(MailboxError::already_exists(path));
        }
        for ancestor in path.ancestors(self.delimiter) {
            if !state.mailboxes.contains_key(&ancestor) {
                state.insert(ancestor);
            }
        }
        Ok(state.insert(path.clone()))
    }

    async fn mailbox_exists(&self, path: &MailboxPath) -> Result<bool, MailboxError> {
        Ok(self.state.read().await.mailboxes.contains_key(path))
    }

    async fn status(&self, path: &MailboxPath) -> Result<MailboxStatus, MailboxError> {
        let state = self.state.read().await;
        let entry = state
            .mailboxes
            .get(path)
            .ok_or_else(|| MailboxError::not_found(path))?;
        Ok(MailboxStatus {
            messages: entry.messages,
            uid_next: entry.uid_next,
            uid_validity: entry.id.get(),
        })
    }

    async fn list_mailboxes(&self, user: &Username) -> Result<Vec<MailboxMetadata>, MailboxError> {
        let state = self.state.read().await;
        Ok(state
            .mailboxes
            .iter()
            .filter(|(path, _)| path.user() == user)
            .map(|(path, entry)| MailboxMetadata {
                id: entry.id,
                path: path.clone(),
                messages: entry.messages,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn store() -> InMemoryMailboxStore {
        InMemoryMailboxStore::new(16, '.')
    }

    fn path(user: &str, name: &str) -> MailboxPath {
        MailboxPath::private(Username::new(user), name)
    }

    #[rstest]
    #[tokio::test]
    async fn creates_and_reports_existence(store: InMemoryMailboxStore) {
        let inbox = path("alice", "INBOX");
        assert!(!store.mailbox_exists(&inbox).await.expect("lookup"));
        store.create_mailbox(&inbox).await.expect("create");
        assert!(store.mailbox_exists(&inbox).await.expect("lookup"));
    }

    #[rstest]
    #[tokio::test]
    async fn rejects_duplicates(store: InMemoryMailboxStore) {
        let inbox = path("alice", "INBOX");
        store.create_mailbox(&inbox).await.expect("create");
        let error = store
            .create_mailbox(&inbox)
            .await
            .expect_err("second create should fail");
        assert!(matches!(error, MailboxError::AlreadyExists { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn enforces_length_limit(store: InMemoryMailboxStore) {
        let long = path("alice", "A-very-long-mailbox-name");
        let error = store
            .create_mailbox(&long)
            .await
            .expect_err("long name should fail");
        assert_eq!(
            error,
            MailboxError::name_too_long("A-very-long-mailbox-name", 16)
        );
        assert!(!store.mailbox_exists(&long).await.expect("lookup"));
    }

    #[rstest]
    #[tokio::test]
    async fn creates_missing_ancestors(store: InMemoryMailboxStore) {
        store
            .create_mailbox(&path("alice", "Work.Q1.Plans"))
            .await
            .expect("create nested");
        let names: Vec<String> = store
            .list_mailboxes(&Username::new("alice"))
            .await
            .expect("list")
            .into_iter()
            .map(|mailbox| mailbox.path.name().to_owned())
            .collect();
        assert_eq!(names, vec!["Work", "Work.Q1", "Work.Q1.Plans"]);
    }

    #[rstest]
    #[tokio::test]
    async fn listings_are_per_user(store: InMemoryMailboxStore) {
        store.create_mailbox(&path("alice", "INBOX")).await.expect("create");
        store.create_mailbox(&path("bob", "INBOX")).await.expect("create");
        let listed = store
            .list_mailboxes(&Username::new("bob"))
            .await
            .expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed.first().map(|m| m.path.user().as_str()), Some("bob"));
    }

    #[rstest]
    #[tokio::test]
    async fn delivery_updates_status(store: InMemoryMailboxStore) {
        let inbox = path("alice", "INBOX");
        store.create_mailbox(&inbox).await.expect("create");
        assert_eq!(store.deliver(&inbox).await.expect("deliver"), 1);
        let status = store.status(&inbox).await.expect("status");
        assert_eq!(status.messages, 1);
        assert_eq!(status.uid_next, 2);
    }

    #[rstest]
    #[tokio::test]
    async fn status_of_missing_mailbox_fails(store: InMemoryMailboxStore) {
        let error = store
            .status(&path("alice", "Nowhere"))
            .await
            .expect_err("status should fail");
        assert!(matches!(error, MailboxError::NotFound { .. }));
    }
}
