//! Cancellable execution of IMAP commands on one connection.

use std::io;
use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

use super::processor::{IMAP_TARGET, ImapProcessor};
use super::request::ImapRequest;
use super::responder::BufferedResponder;
use super::response::ImapResponse;
use super::session::ImapSession;
use crate::cancel::CloseSignal;

/// Errors raised while writing responses to the client.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The transport rejected a write.
    #[error("failed to write response: {0}")]
    Write(#[from] io::Error),
}

/// How a command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Every response was written.
    Completed,
    /// The connection closed first; nothing further was written.
    Abandoned,
}

/// One client connection: session state, output stream and close signal.
pub struct ImapConnection<W> {
    processor: Arc<ImapProcessor>,
    session: ImapSession,
    output: W,
    close: CloseSignal,
}

impl<W> ImapConnection<W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// Binds a session to its output stream.
    pub fn new(
        processor: Arc<ImapProcessor>,
        session: ImapSession,
        output: W,
        close: CloseSignal,
    ) -> Self {
        Self {
            processor,
            session,
            output,
            close,
        }
    }

    /// Runs `request` and writes its responses.
    ///
    /// Responses are buffered while the processor runs. If the connection
    /// closes before the processor finishes, the in-flight store call is
    /// dropped and the buffered responses are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] when writing to the client fails.
    pub async fn execute(&mut self, request: &ImapRequest) -> Result<Completion, ConnectionError> {
        let mut responder = BufferedResponder::new();
        let finished = tokio::select! {
            biased;
            () = self.close.closed() => false,
            () = self.processor.process(request, &mut self.session, &mut responder) => true,
        };
        if !finished {
            debug!(
                target: IMAP_TARGET,
                tag = %request.tag(),
                discarded = responder.len(),
                "connection closed during command"
            );
            return Ok(Completion::Abandoned);
        }

        let responses = responder.into_responses();
        tokio::select! {
            biased;
            () = self.close.closed() => Ok(Completion::Abandoned),
            written = write_responses(&mut self.output, &responses) => {
                written?;
                Ok(Completion::Completed)
            }
        }
    }

    /// Session state of the connection.
    pub fn session(&self) -> &ImapSession {
        &self.session
    }

    /// Releases the output stream.
    pub fn into_output(self) -> W {
        self.output
    }
}

async fn write_responses<W>(output: &mut W, responses: &[ImapResponse]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    for response in responses {
        output.write_all(format!("{response}\r\n").as_bytes()).await?;
    }
    output.flush().await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use rstest::rstest;

    use super::*;
    use crate::cancel::close_signal;
    use crate::imap::request::{CreateRequest, SelectRequest};
    use crate::mailbox::{
        InMemoryMailboxStore, MailboxError, MailboxId, MailboxMetadata, MailboxPath,
        MailboxStatus, MailboxStore,
    };
    use crate::session::{SessionContext, Username};

    /// Store whose `create_mailbox` never completes and notes when its
    /// future is dropped.
    struct StalledStore {
        dropped: Arc<AtomicBool>,
    }

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl MailboxStore for StalledStore {
        async fn create_mailbox(&self, _path: &MailboxPath) -> Result<MailboxId, MailboxError> {
            let _flag = DropFlag(Arc::clone(&self.dropped));
            std::future::pending::<()>().await;
            Err(MailboxError::internal("unreachable"))
        }

        async fn mailbox_exists(&self, _path: &MailboxPath) -> Result<bool, MailboxError> {
            Ok(false)
        }

        async fn status(&self, path: &MailboxPath) -> Result<MailboxStatus, MailboxError> {
            Err(MailboxError::not_found(path))
        }

        async fn list_mailboxes(
            &self,
            _user: &Username,
        ) -> Result<Vec<MailboxMetadata>, MailboxError> {
            Ok(Vec::new())
        }
    }

    fn session(store: Arc<dyn MailboxStore>) -> ImapSession {
        ImapSession::new(SessionContext::new(Username::new("alice"), store, '.'))
    }

    #[rstest]
    #[tokio::test]
    async fn writes_crlf_terminated_responses() {
        let (_handle, signal) = close_signal();
        let store = Arc::new(InMemoryMailboxStore::new(64, '.'));
        let mut connection =
            ImapConnection::new(Arc::new(ImapProcessor::new()), session(store), Vec::new(), signal);

        let completion = connection
            .execute(&CreateRequest::new("a1", "Work").into())
            .await
            .expect("execute");

        assert_eq!(completion, Completion::Completed);
        assert_eq!(connection.into_output(), b"a1 OK CREATE completed.\r\n".to_vec());
    }

    #[rstest]
    #[tokio::test]
    async fn close_during_store_call_abandons_command() {
        let (handle, signal) = close_signal();
        let dropped = Arc::new(AtomicBool::new(false));
        let store = Arc::new(StalledStore {
            dropped: Arc::clone(&dropped),
        });
        let mut connection =
            ImapConnection::new(Arc::new(ImapProcessor::new()), session(store), Vec::new(), signal);

        let closer = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            handle.close();
        };
        let request: ImapRequest = CreateRequest::new("a1", "Work").into();
        let (completion, ()) = tokio::join!(connection.execute(&request), closer);

        assert_eq!(completion.expect("execute"), Completion::Abandoned);
        assert!(dropped.load(Ordering::SeqCst), "store future must be dropped");
        assert!(connection.into_output().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn closed_connection_runs_nothing() {
        let (handle, signal) = close_signal();
        handle.close();
        let store = Arc::new(InMemoryMailboxStore::new(64, '.'));
        let mut connection = ImapConnection::new(
            Arc::new(ImapProcessor::new()),
            session(Arc::clone(&store) as Arc<dyn MailboxStore>),
            Vec::new(),
            signal,
        );

        let completion = connection
            .execute(&CreateRequest::new("a1", "Work").into())
            .await
            .expect("execute");

        assert_eq!(completion, Completion::Abandoned);
        let listed = store
            .list_mailboxes(&Username::new("alice"))
            .await
            .expect("list");
        assert!(listed.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn select_then_create_keeps_session_state() {
        let (_handle, signal) = close_signal();
        let store = Arc::new(InMemoryMailboxStore::new(64, '.'));
        let mut connection = ImapConnection::new(
            Arc::new(ImapProcessor::new()),
            session(store),
            Vec::new(),
            signal,
        );
        connection
            .execute(&CreateRequest::new("a1", "INBOX").into())
            .await
            .expect("create");
        connection
            .execute(&SelectRequest::new("a2", "INBOX").into())
            .await
            .expect("select");
        assert!(connection.session().selected().is_some());
    }
}
