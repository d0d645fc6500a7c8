//! BDD test world: loader, reporter and bootstrap outcome for step functions.

use std::cell::RefCell;
use std::sync::Arc;

use crate::auth::BearerTokenAuthenticator;
use crate::bootstrap::{BootstrapError, ConfigLoader, Postbox, bootstrap_with};
use crate::mailbox::InMemoryMailboxStore;
use crate::session::Username;

use super::config_loader::{FailingConfigLoader, InvalidConfigLoader, TestConfigLoader};
use super::doubles::{TEST_USER, memory_store};
use super::reporter::RecordingHealthReporter;

/// Token the world's authenticator accepts for [`TEST_USER`].
pub const TEST_TOKEN: &str = "test-token";

/// Scenario world shared across bootstrap steps.
pub struct TestWorld {
    loader: Box<dyn ConfigLoader>,
    pub reporter: Arc<RecordingHealthReporter>,
    pub store: Arc<InMemoryMailboxStore>,
    postbox: Option<Postbox>,
    bootstrap_error: Option<BootstrapError>,
}

impl TestWorld {
    /// Builds a world with a successful configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            loader: Box::new(TestConfigLoader::new()),
            reporter: Arc::new(RecordingHealthReporter::default()),
            store: memory_store(),
            postbox: None,
            bootstrap_error: None,
        }
    }

    /// Installs a loader that always fails.
    pub fn use_failing_loader(&mut self) {
        self.loader = Box::new(FailingConfigLoader);
        self.reset_results();
    }

    /// Installs a loader whose configuration fails validation.
    pub fn use_invalid_loader(&mut self) {
        self.loader = Box::new(InvalidConfigLoader);
        self.reset_results();
    }

    /// Installs a loader that succeeds.
    pub fn use_successful_loader(&mut self) {
        self.loader = Box::new(TestConfigLoader::new());
        self.reset_results();
    }

    /// Runs the bootstrap sequence once.
    pub fn bootstrap(&mut self) {
        if self.postbox.is_some() || self.bootstrap_error.is_some() {
            return;
        }

        let authenticator = BearerTokenAuthenticator::new(self.store.clone(), '.')
            .with_token(TEST_TOKEN, Username::new(TEST_USER));
        match bootstrap_with(
            &*self.loader,
            self.reporter.clone(),
            self.store.clone(),
            Arc::new(authenticator),
        ) {
            Ok(postbox) => self.postbox = Some(postbox),
            Err(error) => self.bootstrap_error = Some(error),
        }
    }

    /// Returns whether bootstrap produced an error.
    #[must_use]
    pub fn bootstrap_error(&self) -> Option<&BootstrapError> {
        self.bootstrap_error.as_ref()
    }

    /// Returns the bootstrapped server, if any.
    #[must_use]
    pub fn postbox(&self) -> Option<&Postbox> {
        self.postbox.as_ref()
    }

    fn reset_results(&mut self) {
        self.postbox = None;
        self.bootstrap_error = None;
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Default test world fixture.
#[must_use]
pub fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}
