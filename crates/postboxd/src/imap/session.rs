//! Connection-scoped IMAP state.

use super::responder::Responder;
use super::response::UntaggedResponse;
use crate::mailbox::{MailboxError, MailboxPath};
use crate::session::SessionContext;

/// Mailbox chosen by the last successful SELECT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedMailbox {
    path: MailboxPath,
    known_messages: u32,
}

impl SelectedMailbox {
    /// Selected mailbox location.
    #[must_use]
    pub fn path(&self) -> &MailboxPath {
        &self.path
    }

    /// Message count the client was last told about.
    #[must_use]
    pub fn known_messages(&self) -> u32 {
        self.known_messages
    }
}

/// State of one authenticated IMAP connection.
#[derive(Debug)]
pub struct ImapSession {
    context: SessionContext,
    selected: Option<SelectedMailbox>,
}

impl ImapSession {
    /// Starts an authenticated session with no mailbox selected.
    #[must_use]
    pub fn new(context: SessionContext) -> Self {
        Self {
            context,
            selected: None,
        }
    }

    /// Session context of the connection.
    #[must_use]
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Currently selected mailbox.
    #[must_use]
    pub fn selected(&self) -> Option<&SelectedMailbox> {
        self.selected.as_ref()
    }

    /// Marks `path` as selected with `messages` already reported.
    pub fn select(&mut self, path: MailboxPath, messages: u32) {
        self.selected = Some(SelectedMailbox {
            path,
            known_messages: messages,
        });
    }

    /// Leaves the selected state.
    pub fn deselect(&mut self) {
        self.selected = None;
    }

    /// Reports changes to the selected mailbox the client has not seen yet.
    ///
    /// # Errors
    ///
    /// Returns the store error when the mailbox status cannot be read.
    pub async fn unsolicited_responses(
        &mut self,
        responder: &mut dyn Responder,
    ) -> Result<(), MailboxError> {
        let Some(selected) = self.selected.as_mut() else {
            return Ok(());
        };
        let status = self.context.store().status(&selected.path).await?;
        if status.messages != selected.known_messages {
            selected.known_messages = status.messages;
            responder.respond(UntaggedResponse::Exists(status.messages).into());
        }
        Ok(())
    }

    /// Ends the session, releasing its context.
    #[must_use]
    pub fn into_context(self) -> SessionContext {
        self.context
    }
}
