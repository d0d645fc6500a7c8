//! Sinks processors write response events to.

use super::response::{ImapResponse, StatusResponse};

/// Receives the responses of one command, in emission order.
pub trait Responder: Send {
    /// Records one response.
    fn respond(&mut self, response: ImapResponse);
}

/// Responder that holds a command's responses until the command finishes.
///
/// The connection flushes the buffer once the processor returns, or drops it
/// unsent when the connection closes first.
#[derive(Debug, Default)]
pub struct BufferedResponder {
    responses: Vec<ImapResponse>,
}

impl BufferedResponder {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Responses recorded so far.
    #[must_use]
    pub fn responses(&self) -> &[ImapResponse] {
        &self.responses
    }

    /// Consumes the buffer.
    #[must_use]
    pub fn into_responses(self) -> Vec<ImapResponse> {
        self.responses
    }

    /// Every tagged response recorded so far.
    pub fn tagged(&self) -> impl Iterator<Item = &StatusResponse> {
        self.responses.iter().filter_map(ImapResponse::as_tagged)
    }

    /// Number of recorded responses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    /// Returns `true` when nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

impl Responder for BufferedResponder {
    fn respond(&mut self, response: ImapResponse) {
        self.responses.push(response);
    }
}
