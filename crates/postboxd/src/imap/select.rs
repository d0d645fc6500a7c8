//! `SELECT` processing.

use async_trait::async_trait;
use tracing::debug;

use super::create::MAILBOX;
use super::processor::{
    CommandProcessor, FailureResponse, IMAP_TARGET, ImapErrorClassifier, respond_with_failure,
};
use super::request::SelectRequest;
use super::responder::Responder;
use super::response::{ReasonCode, ResponseCode, StatusResponse, UntaggedResponse};
use super::session::ImapSession;
use crate::classify::{ErrorClassifier, ErrorRule, LogDirective};
use crate::diagnostics::{ACTION, DiagnosticContext};
use crate::mailbox::MailboxError;

/// Rule table for SELECT failures.
#[must_use]
pub fn select_rules() -> ImapErrorClassifier {
    ErrorClassifier::new(
        vec![
            ErrorRule::new(
                "mailbox-not-found",
                |error| matches!(error, MailboxError::NotFound { .. }),
                FailureResponse::no(ReasonCode::FailureNoSuchMailbox),
                LogDirective::debug("cannot select mailbox: it does not exist"),
            ),
            ErrorRule::new(
                "mailbox-error",
                MailboxError::is_domain,
                FailureResponse::no(ReasonCode::GenericFailureDuringProcessing),
                LogDirective::error("cannot select mailbox"),
            ),
        ],
        FailureResponse::no(ReasonCode::GenericFailureDuringProcessing),
        "unexpected error while selecting mailbox",
    )
}

/// Opens a mailbox for the rest of the session.
#[derive(Debug)]
pub struct SelectProcessor {
    rules: ImapErrorClassifier,
}

impl Default for SelectProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectProcessor {
    /// Builds the processor with the standard rule table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rules: select_rules(),
        }
    }

    async fn select(
        &self,
        request: &SelectRequest,
        session: &mut ImapSession,
        responder: &mut dyn Responder,
    ) -> Result<(), MailboxError> {
        let path = session
            .context()
            .path_converter()
            .build_full_path(&request.mailbox_name)?;
        let status = session.context().store().status(&path).await?;

        responder.respond(UntaggedResponse::Flags.into());
        responder.respond(UntaggedResponse::Exists(status.messages).into());
        responder.respond(UntaggedResponse::Recent(0).into());
        responder.respond(
            UntaggedResponse::Ok {
                code: ResponseCode::UidValidity(status.uid_validity),
                text: "UIDs valid",
            }
            .into(),
        );
        responder.respond(
            UntaggedResponse::Ok {
                code: ResponseCode::UidNext(status.uid_next),
                text: "Predicted next UID",
            }
            .into(),
        );
        debug!(target: IMAP_TARGET, %path, messages = status.messages, "mailbox selected");
        session.select(path, status.messages);
        responder.respond(
            StatusResponse::completed(request.tag.clone(), Self::NAME)
                .with_code(ResponseCode::ReadWrite)
                .into(),
        );
        Ok(())
    }
}

#[async_trait]
impl CommandProcessor for SelectProcessor {
    type Request = SelectRequest;

    const NAME: &'static str = "SELECT";

    async fn process(
        &self,
        request: &SelectRequest,
        session: &mut ImapSession,
        responder: &mut dyn Responder,
    ) {
        if let Err(error) = self.select(request, session, responder).await {
            // A failed SELECT leaves the session unselected.
            session.deselect();
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

    fn diagnostic_context(&self, request: &SelectRequest) -> DiagnosticContext {
        DiagnosticContext::new()
            .with(ACTION, Self::NAME)
            .with(MAILBOX, &request.mailbox_name)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rstest::{fixture, rstest};

    use super::*;
    use crate::imap::responder::BufferedResponder;
    use crate::imap::response::Status;
    use crate::mailbox::{InMemoryMailboxStore, MailboxPath, MailboxStore, MockMailboxStore};
    use crate::session::{SessionContext, Username};

    struct Fixture {
        store: Arc<InMemoryMailboxStore>,
        session: ImapSession,
    }

    #[fixture]
    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryMailboxStore::new(64, '.'));
        let session = ImapSession::new(SessionContext::new(
            Username::new("alice"),
            Arc::clone(&store) as Arc<dyn MailboxStore>,
            '.',
        ));
        Fixture { store, session }
    }

    async fn select(session: &mut ImapSession, name: &str) -> BufferedResponder {
        let mut responder = BufferedResponder::new();
        SelectProcessor::new()
            .process(&SelectRequest::new("s1", name), session, &mut responder)
            .await;
        responder
    }

    #[rstest]
    #[tokio::test]
    async fn select_reports_mailbox_state(fixture: Fixture) {
        let Fixture { store, mut session } = fixture;
        let inbox = MailboxPath::private(Username::new("alice"), "INBOX");
        store.create_mailbox(&inbox).await.expect("create inbox");
        store.deliver(&inbox).await.expect("deliver");
        store.deliver(&inbox).await.expect("deliver");

        let responder = select(&mut session, "inbox").await;
        let lines: Vec<String> = responder
            .responses()
            .iter()
            .map(ToString::to_string)
            .collect();
        let status = store.status(&inbox).await.expect("status");
        assert_eq!(
            lines,
            vec![
                r"* FLAGS (\Answered \Flagged \Deleted \Seen \Draft)".to_owned(),
                "* 2 EXISTS".to_owned(),
                "* 0 RECENT".to_owned(),
                format!("* OK [UIDVALIDITY {}] UIDs valid", status.uid_validity),
                format!("* OK [UIDNEXT {}] Predicted next UID", status.uid_next),
                "s1 OK [READ-WRITE] SELECT completed.".to_owned(),
            ]
        );
        assert_eq!(session.selected().map(|s| s.path()), Some(&inbox));
    }

    #[rstest]
    #[tokio::test]
    async fn missing_mailbox_is_reported_and_deselects(fixture: Fixture) {
        let Fixture { store, mut session } = fixture;
        let inbox = MailboxPath::private(Username::new("alice"), "INBOX");
        store.create_mailbox(&inbox).await.expect("create inbox");
        select(&mut session, "INBOX").await;

        let responder = select(&mut session, "Nowhere").await;
        let tagged: Vec<_> = responder.tagged().collect();
        assert_eq!(responder.len(), 1);
        assert_eq!(tagged[0].status, Status::No);
        assert_eq!(tagged[0].reason, ReasonCode::FailureNoSuchMailbox);
        assert!(session.selected().is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn internal_failure_answers_generic_no() {
        let mut store = MockMailboxStore::new();
        store
            .expect_status()
            .times(1)
            .returning(|_| Err(MailboxError::internal("boom")));
        let mut session = ImapSession::new(SessionContext::new(
            Username::new("alice"),
            Arc::new(store),
            '.',
        ));
        let responder = select(&mut session, "INBOX").await;
        let tagged: Vec<_> = responder.tagged().collect();
        assert_eq!(tagged[0].reason, ReasonCode::GenericFailureDuringProcessing);
    }
}
