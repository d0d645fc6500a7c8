//! Server bootstrap orchestration.

use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use postbox_config::{Config, ConfigError};
use thiserror::Error;

use crate::auth::Authenticator;
use crate::health::HealthReporter;
use crate::http::{
    Authenticated, CorsPolicy, Endpoint, HttpMethod, PipelineStages, RouteTable, Version,
};
use crate::imap::{ImapProcessor, ImapSession};
use crate::jmap::{BatchDispatcher, JmapApi};
use crate::mailbox::MailboxStore;
use crate::metrics::{JMAP_REQUEST_TIMER, TracingMetricFactory};
use crate::provision::{DefaultMailboxesProvisioner, InMemoryUserRegistry, UserProvisioner};
use crate::session::{SessionContext, Username};
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the server configuration.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader returning a configuration resolved earlier.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Configuration loaded but violates a constraint.
    #[error("invalid configuration: {source}")]
    Validation {
        #[source]
        source: ConfigError,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
}

/// Result of a successful bootstrap invocation.
pub struct Postbox {
    config: Config,
    telemetry: TelemetryHandle,
    store: Arc<dyn MailboxStore>,
    imap: Arc<ImapProcessor>,
    routes: RouteTable,
}

impl Postbox {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Routes serving the JMAP API.
    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Shared IMAP command processor.
    #[must_use]
    pub fn imap_processor(&self) -> Arc<ImapProcessor> {
        Arc::clone(&self.imap)
    }

    /// Opens an IMAP session for an already authenticated `user`.
    #[must_use]
    pub fn imap_session(&self, user: Username) -> ImapSession {
        ImapSession::new(SessionContext::new(
            user,
            Arc::clone(&self.store),
            self.config.path_delimiter(),
        ))
    }
}

impl std::fmt::Debug for Postbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Postbox")
            .field("config", &self.config)
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

/// Bootstraps the server using the supplied collaborators.
///
/// # Errors
///
/// Returns [`BootstrapError`] when configuration loading, validation or
/// telemetry installation fails. The reporter sees the failure first.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    store: Arc<dyn MailboxStore>,
    authenticator: Arc<dyn Authenticator>,
) -> Result<Postbox, BootstrapError> {
    reporter.bootstrap_starting();

    let config = match loader.load() {
        Ok(config) => config,
        Err(source) => {
            let error = BootstrapError::Configuration { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    if let Err(source) = config.validate() {
        let error = BootstrapError::Validation { source };
        reporter.bootstrap_failed(&error);
        return Err(error);
    }

    let telemetry = match telemetry::initialise(&config) {
        Ok(handle) => handle,
        Err(source) => {
            let error = BootstrapError::Telemetry { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let routes = api_routes(&config, authenticator);
    reporter.routes_installed(routes.routes());
    reporter.bootstrap_succeeded(&config);

    Ok(Postbox {
        config,
        telemetry,
        store,
        imap: Arc::new(ImapProcessor::new()),
        routes,
    })
}

fn api_routes(config: &Config, authenticator: Arc<dyn Authenticator>) -> RouteTable {
    let stages = PipelineStages::new(
        authenticator,
        Arc::new(UserProvisioner::new(Arc::new(InMemoryUserRegistry::new()))),
        Arc::new(DefaultMailboxesProvisioner),
        Arc::new(TracingMetricFactory),
    );
    let api = Authenticated::new(
        JmapApi::new(BatchDispatcher::with_mailbox_methods()),
        stages,
        JMAP_REQUEST_TIMER,
    );

    let mut routes = RouteTable::new();
    routes.add_with_preflight(
        Endpoint::new(HttpMethod::Post, config.jmap_endpoint()),
        Version::Draft,
        Arc::new(api),
        &CorsPolicy::new(config.cors_allow_origin()),
    );
    routes
}
