//! Fixed pre-stages run in front of authenticated handlers.
//!
//! [`Authenticated`] runs, in order: authentication, body decoding, the two
//! provisioners (concurrently), then the timed handler body. Any error that
//! escapes a stage is classified once by the transport classifier and turned
//! into a generic response. Each step is recorded in a [`PipelineTrace`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::Instrument;

use super::errors::{RouteError, TransportClassifier, failure_response, transport_rules};
use super::message::{HttpRequest, HttpResponse};
use super::route::RouteHandler;
use crate::auth::Authenticator;
use crate::diagnostics::{DiagnosticContext, USER};
use crate::metrics::{MetricFactory, Timer};
use crate::pipeline::{PipelineTrace, RequestState};
use crate::provision::Provisioner;
use crate::session::SessionContext;

/// Handler body run after the pre-stages succeed.
#[async_trait]
pub trait AuthenticatedHandler: Send + Sync {
    /// Decoded request body.
    type Input: Send;

    /// Decodes the request body.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::BadRequest`] for malformed bodies.
    fn decode(&self, body: &[u8]) -> Result<Self::Input, RouteError>;

    /// Executes the decoded request for `session`.
    async fn handle(
        &self,
        input: Self::Input,
        session: &SessionContext,
    ) -> Result<HttpResponse, RouteError>;
}

/// Collaborators shared by every authenticated route.
#[derive(Clone)]
pub struct PipelineStages {
    authenticator: Arc<dyn Authenticator>,
    user_provisioner: Arc<dyn Provisioner>,
    mailbox_provisioner: Arc<dyn Provisioner>,
    metrics: Arc<dyn MetricFactory>,
}

impl PipelineStages {
    pub fn new(
        authenticator: Arc<dyn Authenticator>,
        user_provisioner: Arc<dyn Provisioner>,
        mailbox_provisioner: Arc<dyn Provisioner>,
        metrics: Arc<dyn MetricFactory>,
    ) -> Self {
        Self {
            authenticator,
            user_provisioner,
            mailbox_provisioner,
            metrics,
        }
    }
}

/// Wraps `H` with authentication, decoding, provisioning and timing.
pub struct Authenticated<H> {
    handler: H,
    stages: PipelineStages,
    timer: &'static str,
    rules: TransportClassifier,
}

impl<H: AuthenticatedHandler> Authenticated<H> {
    /// Wraps `handler`, timing its body under `timer`.
    pub fn new(handler: H, stages: PipelineStages, timer: &'static str) -> Self {
        Self {
            handler,
            stages,
            timer,
            rules: transport_rules(),
        }
    }

    /// The wrapped handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Runs the pipeline and returns the response with the states visited.
    pub async fn process(&self, request: &HttpRequest) -> (HttpResponse, PipelineTrace) {
        let mut trace = PipelineTrace::new();
        let response = match self.run(request, &mut trace).await {
            Ok(response) => {
                trace.advance(RequestState::Responding);
                response
            }
            Err(error) => {
                let context = DiagnosticContext::new().with("path", request.path());
                let kind = self.rules.resolve(&error, &context).action;
                trace.fail(kind);
                failure_response(kind)
            }
        };
        trace.advance(RequestState::Completed);
        (response, trace)
    }

    async fn run(
        &self,
        request: &HttpRequest,
        trace: &mut PipelineTrace,
    ) -> Result<HttpResponse, RouteError> {
        trace.advance(RequestState::Authenticating);
        let session = self.stages.authenticator.authenticate(request).await?;
        let span = DiagnosticContext::new()
            .with(USER, session.user())
            .span();
        self.execute(request, &session, trace)
            .instrument(span)
            .await
    }

    async fn execute(
        &self,
        request: &HttpRequest,
        session: &SessionContext,
        trace: &mut PipelineTrace,
    ) -> Result<HttpResponse, RouteError> {
        trace.advance(RequestState::Decoding);
        let input = self.handler.decode(request.body())?;

        trace.advance(RequestState::Provisioning);
        tokio::try_join!(
            self.stages.user_provisioner.provision(session),
            self.stages.mailbox_provisioner.provision(session),
        )?;

        trace.advance(RequestState::Executing);
        let timer = Timer::start(self.stages.metrics.as_ref(), self.timer);
        let response = self.handler.handle(input, session).await?;
        timer.stop();
        Ok(response)
    }
}

#[async_trait]
impl<H> RouteHandler for Authenticated<H>
where
    H: AuthenticatedHandler + 'static,
{
    async fn handle(&self, request: &HttpRequest) -> HttpResponse {
        self.process(request).await.0
    }
}
