//! Collaborator doubles for the authenticated pipeline.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::auth::{AuthenticationError, Authenticator};
use crate::http::HttpRequest;
use crate::mailbox::{InMemoryMailboxStore, MailboxError, MailboxStore};
use crate::provision::{Provisioner, ProvisioningError};
use crate::session::{SessionContext, Username};

/// Identity used by the suites.
pub const TEST_USER: &str = "alice@example.org";

/// In-memory store with the default limits.
#[must_use]
pub fn memory_store() -> Arc<InMemoryMailboxStore> {
    Arc::new(InMemoryMailboxStore::new(200, '.'))
}

/// Session for [`TEST_USER`] over `store`.
#[must_use]
pub fn session_for(store: Arc<dyn MailboxStore>) -> SessionContext {
    SessionContext::new(Username::new(TEST_USER), store, '.')
}

/// Authenticator with a fixed verdict.
pub struct StaticAuthenticator {
    store: Arc<dyn MailboxStore>,
    verdict: Option<AuthenticationError>,
    calls: AtomicUsize,
}

impl StaticAuthenticator {
    /// Accepts every request as [`TEST_USER`].
    #[must_use]
    pub fn accepting(store: Arc<dyn MailboxStore>) -> Self {
        Self {
            store,
            verdict: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Rejects every request with `error`.
    #[must_use]
    pub fn rejecting(store: Arc<dyn MailboxStore>, error: AuthenticationError) -> Self {
        Self {
            store,
            verdict: Some(error),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn authenticate(
        &self,
        _request: &HttpRequest,
    ) -> Result<SessionContext, AuthenticationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.verdict {
            Some(error) => Err(error.clone()),
            None => Ok(session_for(Arc::clone(&self.store))),
        }
    }
}

/// Provisioner that counts invocations and can be told to fail.
#[derive(Debug, Default)]
pub struct CountingProvisioner {
    calls: AtomicUsize,
    failure: Option<MailboxError>,
}

impl CountingProvisioner {
    #[must_use]
    pub fn failing(error: MailboxError) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failure: Some(error),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provisioner for CountingProvisioner {
    async fn provision(&self, _session: &SessionContext) -> Result<(), ProvisioningError> {
        tokio::task::yield_now().await;
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(error) => Err(ProvisioningError::Mailbox(error.clone())),
            None => Ok(()),
        }
    }
}
