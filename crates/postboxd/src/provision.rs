//! Per-request provisioning of users and their default mailboxes.
//!
//! Both provisioners are idempotent: they run before every authenticated
//! request and do nothing once the resources exist.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use crate::mailbox::{MailboxError, MailboxPath};
use crate::session::{SessionContext, Username};

/// Tracing target for provisioning.
pub(crate) const PROVISION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::provision");

pub use postbox_config::DEFAULT_MAILBOXES;

/// Failures while preparing resources for a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProvisioningError {
    /// The mailbox store rejected a default mailbox.
    #[error("failed to provision mailbox: {0}")]
    Mailbox(#[from] MailboxError),

    /// The user registry failed.
    #[error("user registry failure: {message}")]
    Registry { message: String },
}

impl ProvisioningError {
    /// Creates a registry error.
    pub fn registry(message: impl Into<String>) -> Self {
        Self::Registry {
            message: message.into(),
        }
    }
}

/// One preparation step run before the handler body.
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Ensures the resources `session` needs exist.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError`] when a resource cannot be created.
    async fn provision(&self, session: &SessionContext) -> Result<(), ProvisioningError>;
}

/// Directory of known users.
#[async_trait]
pub trait UserRegistry: Send + Sync {
    async fn contains(&self, user: &Username) -> Result<bool, ProvisioningError>;

    async fn add(&self, user: &Username) -> Result<(), ProvisioningError>;
}

#[derive(Debug, Default)]
pub struct InMemoryUserRegistry {
    users: RwLock<BTreeSet<Username>>,
}

impl InMemoryUserRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of registered users.
    pub async fn users(&self) -> Vec<Username> {
        self.users.read().await.iter().cloned().collect()
    }
}

#[async_trait]
impl UserRegistry for InMemoryUserRegistry {
    async fn contains(&self, user: &Username) -> Result<bool, ProvisioningError> {
        Ok(self.users.read().await.contains(user))
    }

    async fn add(&self, user: &Username) -> Result<(), ProvisioningError> {
        self.users.write().await.insert(user.clone());
        Ok(())
    }
}

/// Registers authenticated users the registry has not seen.
pub struct UserProvisioner {
    registry: Arc<dyn UserRegistry>,
}

impl UserProvisioner {
    pub fn new(registry: Arc<dyn UserRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Provisioner for UserProvisioner {
    async fn provision(&self, session: &SessionContext) -> Result<(), ProvisioningError> {
        let user = session.user();
        if self.registry.contains(user).await? {
            return Ok(());
        }
        self.registry.add(user).await?;
        info!(target: PROVISION_TARGET, %user, "user provisioned");
        Ok(())
    }
}

/// Creates the user's default mailboxes when missing.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultMailboxesProvisioner;

#[async_trait]
impl Provisioner for DefaultMailboxesProvisioner {
    async fn provision(&self, session: &SessionContext) -> Result<(), ProvisioningError> {
        let store = session.store();
        for name in DEFAULT_MAILBOXES {
            let path = MailboxPath::private(session.user().clone(), name);
            if store.mailbox_exists(&path).await? {
                continue;
            }
            match store.create_mailbox(&path).await {
                Ok(_) => info!(target: PROVISION_TARGET, %path, "default mailbox provisioned"),
                // A concurrent request created it first.
                Err(MailboxError::AlreadyExists { .. }) => {}
                Err(error) => return Err(error.into()),
            }
        }
        Ok(())
    }
}
