//! IMAP command family.
//!
//! Commands arrive already decoded as [`ImapRequest`]s. The [`ImapProcessor`]
//! hands each one to its [`CommandProcessor`], which talks to the mailbox store
//! and writes responses to a [`Responder`]. [`ImapConnection`] buffers those
//! responses and writes them out unless the connection closes first.

mod connection;
mod create;
mod processor;
mod request;
mod responder;
mod response;
mod select;
mod session;

pub use connection::{Completion, ConnectionError, ImapConnection};
pub use create::{CreateProcessor, MAILBOX, create_rules};
pub use processor::{CommandProcessor, FailureResponse, ImapErrorClassifier, ImapProcessor};
pub use request::{CreateRequest, ImapRequest, SelectRequest, Tag};
pub use responder::{BufferedResponder, Responder};
pub use response::{
    ImapResponse, ReasonCode, ResponseCode, SYSTEM_FLAGS, Status, StatusResponse,
    UntaggedResponse,
};
pub use select::{SelectProcessor, select_rules};
pub use session::{ImapSession, SelectedMailbox};
