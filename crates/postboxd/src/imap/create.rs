//! `CREATE` processing.

use async_trait::async_trait;
use tracing::debug;

use super::processor::{
    CommandProcessor, FailureResponse, IMAP_TARGET, ImapErrorClassifier, respond_with_failure,
};
use super::request::CreateRequest;
use super::responder::Responder;
use super::response::{ReasonCode, StatusResponse};
use super::session::ImapSession;
use crate::classify::{ErrorClassifier, ErrorRule, LogDirective};
use crate::diagnostics::{ACTION, DiagnosticContext};
use crate::mailbox::MailboxError;

/// Diagnostic key carrying the requested mailbox name.
pub const MAILBOX: &str = "mailbox";

/// Rule table for CREATE failures, evaluated top to bottom.
///
/// | error                | response                                |
/// |----------------------|-----------------------------------------|
/// | already exists       | `NO` `MAILBOX_EXISTS`                   |
/// | name too long        | `BAD` `FAILURE_MAILBOX_NAME`            |
/// | other domain error   | `NO` `GENERIC_FAILURE_DURING_PROCESSING`|
///
/// Internal errors reach the fallback, which also answers
/// `NO GENERIC_FAILURE_DURING_PROCESSING` but logs as unexpected.
#[must_use]
pub fn create_rules() -> ImapErrorClassifier {
    ErrorClassifier::new(
        vec![
            ErrorRule::new(
                "mailbox-exists",
                |error| matches!(error, MailboxError::AlreadyExists { .. }),
                FailureResponse::no(ReasonCode::MailboxExists),
                LogDirective::debug("cannot create mailbox: it already exists"),
            ),
            ErrorRule::new(
                "name-too-long",
                |error| matches!(error, MailboxError::NameTooLong { .. }),
                FailureResponse::bad(ReasonCode::FailureMailboxName),
                LogDirective::debug("cannot create mailbox: name exceeds the length limit"),
            ),
            ErrorRule::new(
                "mailbox-error",
                MailboxError::is_domain,
                FailureResponse::no(ReasonCode::GenericFailureDuringProcessing),
                LogDirective::error("cannot create mailbox"),
            ),
        ],
        FailureResponse::no(ReasonCode::GenericFailureDuringProcessing),
        "unexpected error while creating mailbox",
    )
}

/// Creates mailboxes named by the client.
#[derive(Debug)]
pub struct CreateProcessor {
    rules: ImapErrorClassifier,
}

impl Default for CreateProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl CreateProcessor {
    /// Builds the processor with the standard rule table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rules: create_rules(),
        }
    }

    async fn create(
        &self,
        request: &CreateRequest,
        session: &mut ImapSession,
        responder: &mut dyn Responder,
    ) -> Result<(), MailboxError> {
        let path = session
            .context()
            .path_converter()
            .build_full_path(&request.mailbox_name)?;
        let id = session.context().store().create_mailbox(&path).await?;
        debug!(target: IMAP_TARGET, %path, id = id.get(), "mailbox created");
        session.unsolicited_responses(responder).await?;
        responder.respond(StatusResponse::completed(request.tag.clone(), Self::NAME).into());
        Ok(())
    }
}

#[async_trait]
impl CommandProcessor for CreateProcessor {
    type Request = CreateRequest;

    const NAME: &'static str = "CREATE";

    async fn process(
        &self,
        request: &CreateRequest,
        session: &mut ImapSession,
        responder: &mut dyn Responder,
    ) {
        if let Err(error) = self.create(request, session, responder).await {
            respond_with_failure(
                &self.rules,
                &error,
                &request.tag,
                Self::NAME,
                &self.diagnostic_context(request),
                responder,
            );
        }
    }

    fn diagnostic_context(&self, request: &CreateRequest) -> DiagnosticContext {
        DiagnosticContext::new()
            .with(ACTION, Self::NAME)
            .with(MAILBOX, &request.mailbox_name)
    }
}
