//! Replays one JMAP batch read from stdin against an in-memory server.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use postboxd::auth::BearerTokenAuthenticator;
use postboxd::http::{AUTHORIZATION, CONTENT_TYPE, HttpMethod, HttpRequest, JSON_UTF8};
use postboxd::mailbox::InMemoryMailboxStore;
use postboxd::session::Username;
use postboxd::{
    BootstrapError, ConfigLoader, HealthReporter, StaticConfigLoader, StructuredHealthReporter,
    SystemConfigLoader, bootstrap_with,
};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

const REPLAY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::replay");

/// Access token accepted for the configured local user.
const LOCAL_TOKEN: &str = "postbox-local";

#[derive(Debug, Error)]
enum RunError {
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    #[error("failed to replay request: {0}")]
    Io(#[from] io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let reporter = StructuredHealthReporter::new();
    match run(reporter).await {
        Ok(status) if (200..300).contains(&status) => ExitCode::SUCCESS,
        Ok(status) if (400..500).contains(&status) => ExitCode::from(2),
        Ok(_) => ExitCode::FAILURE,
        // Already reported through the health reporter.
        Err(RunError::Bootstrap(_)) => ExitCode::FAILURE,
        Err(RunError::Io(error)) => {
            tracing::error!(target: REPLAY_TARGET, error = %error, "request replay failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(reporter: StructuredHealthReporter) -> Result<u16, RunError> {
    let config = SystemConfigLoader.load().map_err(|source| {
        let error = BootstrapError::Configuration { source };
        reporter.bootstrap_failed(&error);
        error
    })?;
    let store = Arc::new(InMemoryMailboxStore::new(
        config.max_mailbox_name_length(),
        config.path_delimiter(),
    ));
    let authenticator = BearerTokenAuthenticator::new(store.clone(), config.path_delimiter())
        .with_token(LOCAL_TOKEN, Username::new(config.local_user()));
    let endpoint = config.jmap_endpoint().to_owned();

    let postbox = bootstrap_with(
        &StaticConfigLoader::new(config),
        Arc::new(reporter),
        store,
        Arc::new(authenticator),
    )?;

    let mut body = Vec::new();
    tokio::io::stdin().read_to_end(&mut body).await?;
    let request = HttpRequest::new(HttpMethod::Post, endpoint)
        .with_header(AUTHORIZATION, format!("Bearer {LOCAL_TOKEN}"))
        .with_header(CONTENT_TYPE, JSON_UTF8)
        .with_body(body);

    let response = postbox.routes().dispatch(&request).await;
    tracing::debug!(
        target: REPLAY_TARGET,
        status = response.status(),
        "request replayed"
    );
    let mut stdout = tokio::io::stdout();
    stdout.write_all(response.body()).await?;
    stdout.flush().await?;
    Ok(response.status())
}
