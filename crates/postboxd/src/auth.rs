//! Request authentication.
//!
//! An [`Authenticator`] turns the credentials carried by a request into a
//! [`SessionContext`]. Failures are reported as [`AuthenticationError`] and
//! end the pipeline with a 401 before anything touches the store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::http::{AUTHORIZATION, HttpRequest};
use crate::mailbox::MailboxStore;
use crate::session::{SessionContext, Username};

/// Tracing target for authentication.
pub(crate) const AUTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::auth");

/// Reasons a request could not be authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthenticationError {
    /// The request carried no credentials.
    #[error("no credentials supplied")]
    MissingCredentials,

    /// The credentials were not recognised.
    #[error("credentials rejected")]
    InvalidCredentials,
}

/// Resolves request credentials into a session.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Authenticates `request`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthenticationError`] when credentials are absent or unknown.
    async fn authenticate(&self, request: &HttpRequest) -> Result<SessionContext, AuthenticationError>;
}

/// Accepts opaque access tokens from the `Authorization` header.
///
/// Both `Bearer <token>` and a bare token are accepted.
pub struct BearerTokenAuthenticator {
    tokens: HashMap<String, Username>,
    store: Arc<dyn MailboxStore>,
    delimiter: char,
}

impl BearerTokenAuthenticator {
    /// Creates an authenticator with no known tokens.
    pub fn new(store: Arc<dyn MailboxStore>, delimiter: char) -> Self {
        Self {
            tokens: HashMap::new(),
            store,
            delimiter,
        }
    }

    /// Registers `token` as a credential for `user`.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, user: Username) -> Self {
        self.tokens.insert(token.into(), user);
        self
    }
}

impl std::fmt::Debug for BearerTokenAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerTokenAuthenticator")
            .field("known_tokens", &self.tokens.len())
            .field("delimiter", &self.delimiter)
            .finish_non_exhaustive()
    }
}

fn extract_token(header: &str) -> Option<&str> {
    let header = header.trim();
    let token = match header.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        Some(_) => return None,
        None => header,
    };
    (!token.is_empty()).then_some(token)
}

#[async_trait]
impl Authenticator for BearerTokenAuthenticator {
    async fn authenticate(&self, request: &HttpRequest) -> Result<SessionContext, AuthenticationError> {
        let header = request
            .header(AUTHORIZATION)
            .ok_or(AuthenticationError::MissingCredentials)?;
        let token = extract_token(header).ok_or(AuthenticationError::InvalidCredentials)?;
        let user = self
            .tokens
            .get(token)
            .ok_or(AuthenticationError::InvalidCredentials)?;
        debug!(target: AUTH_TARGET, %user, "request authenticated");
        Ok(SessionContext::new(
            user.clone(),
            Arc::clone(&self.store),
            self.delimiter,
        ))
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;
    use crate::http::HttpMethod;
    use crate::mailbox::InMemoryMailboxStore;

    #[fixture]
    fn authenticator() -> BearerTokenAuthenticator {
        BearerTokenAuthenticator::new(Arc::new(InMemoryMailboxStore::new(64, '.')), '.')
            .with_token("secret", Username::new("alice@example.org"))
    }

    fn request(authorization: Option<&str>) -> HttpRequest {
        let request = HttpRequest::new(HttpMethod::Post, "/jmap");
        match authorization {
            Some(value) => request.with_header(AUTHORIZATION, value),
            None => request,
        }
    }

    #[rstest]
    #[case("Bearer secret")]
    #[case("bearer   secret ")]
    #[case("secret")]
    #[tokio::test]
    async fn accepts_known_token(authenticator: BearerTokenAuthenticator, #[case] header: &str) {
        let session = authenticator
            .authenticate(&request(Some(header)))
            .await
            .expect("authenticated");
        assert_eq!(session.user().as_str(), "alice@example.org");
        assert_eq!(session.delimiter(), '.');
    }

    #[rstest]
    #[tokio::test]
    async fn missing_header_is_reported(authenticator: BearerTokenAuthenticator) {
        let error = authenticator
            .authenticate(&request(None))
            .await
            .expect_err("must fail");
        assert_eq!(error, AuthenticationError::MissingCredentials);
    }

    #[rstest]
    #[case("Bearer wrong")]
    #[case("Basic c2VjcmV0")]
    #[case("Bearer ")]
    #[tokio::test]
    async fn unknown_credentials_are_rejected(
        authenticator: BearerTokenAuthenticator,
        #[case] header: &str,
    ) {
        let error = authenticator
            .authenticate(&request(Some(header)))
            .await
            .expect_err("must fail");
        assert_eq!(error, AuthenticationError::InvalidCredentials);
    }
}
