//! IMAP command processor contract and family dispatcher.

use async_trait::async_trait;
use tracing::Instrument;

use super::create::CreateProcessor;
use super::request::{ImapRequest, Tag};
use super::responder::Responder;
use super::response::{ReasonCode, Status, StatusResponse};
use super::select::SelectProcessor;
use super::session::ImapSession;
use crate::classify::ErrorClassifier;
use crate::diagnostics::{DiagnosticContext, PROTOCOL, USER};
use crate::mailbox::MailboxError;

/// Tracing target for IMAP processing.
pub(crate) const IMAP_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::imap");

/// Failure response a classification rule selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureResponse {
    /// Tagged status to answer with.
    pub status: Status,
    /// Reason code to answer with.
    pub reason: ReasonCode,
}

impl FailureResponse {
    /// `NO` with `reason`.
    #[must_use]
    pub const fn no(reason: ReasonCode) -> Self {
        Self {
            status: Status::No,
            reason,
        }
    }

    /// `BAD` with `reason`.
    #[must_use]
    pub const fn bad(reason: ReasonCode) -> Self {
        Self {
            status: Status::Bad,
            reason,
        }
    }

    /// Builds the tagged response for `tag` and `command`.
    #[must_use]
    pub fn into_response(self, tag: Tag, command: &'static str) -> StatusResponse {
        StatusResponse {
            tag,
            status: self.status,
            code: None,
            command,
            reason: self.reason,
        }
    }
}

/// Rule table mapping mailbox errors to IMAP failure responses.
pub type ImapErrorClassifier = ErrorClassifier<MailboxError, FailureResponse>;

/// Processes one decoded IMAP command kind.
///
/// Implementations write untagged responses followed by exactly one tagged
/// response to the responder. Store failures never escape `process`: they are
/// classified and answered with a tagged failure.
#[async_trait]
pub trait CommandProcessor: Send + Sync {
    /// Command this processor handles.
    type Request: Send + Sync;

    /// Protocol keyword, for example `CREATE`.
    const NAME: &'static str;

    /// Executes `request` against `session`.
    async fn process(
        &self,
        request: &Self::Request,
        session: &mut ImapSession,
        responder: &mut dyn Responder,
    );

    /// Describes `request` for logging.
    fn diagnostic_context(&self, request: &Self::Request) -> DiagnosticContext;
}

/// Logs `error` and answers it with the action of the matching rule.
pub(crate) fn respond_with_failure(
    rules: &ImapErrorClassifier,
    error: &MailboxError,
    tag: &Tag,
    command: &'static str,
    context: &DiagnosticContext,
    responder: &mut dyn Responder,
) {
    let classified = rules.resolve(error, context);
    responder.respond(classified.action.into_response(tag.clone(), command).into());
}

/// Routes IMAP requests to the processor for their command.
#[derive(Debug)]
pub struct ImapProcessor {
    create: CreateProcessor,
    select: SelectProcessor,
}

impl Default for ImapProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ImapProcessor {
    /// Builds the dispatcher with every supported command.
    #[must_use]
    pub fn new() -> Self {
        Self {
            create: CreateProcessor::new(),
            select: SelectProcessor::new(),
        }
    }

    /// Processes `request`, writing its responses to `responder`.
    pub async fn process(
        &self,
        request: &ImapRequest,
        session: &mut ImapSession,
        responder: &mut dyn Responder,
    ) {
        match request {
            ImapRequest::Create(create) => run(&self.create, create, session, responder).await,
            ImapRequest::Select(select) => run(&self.select, select, session, responder).await,
        }
    }
}

async fn run<P: CommandProcessor>(
    processor: &P,
    request: &P::Request,
    session: &mut ImapSession,
    responder: &mut dyn Responder,
) {
    let span = processor
        .diagnostic_context(request)
        .with(PROTOCOL, "imap")
        .with(USER, session.context().user())
        .span();
    processor
        .process(request, session, responder)
        .instrument(span)
        .await;
}
