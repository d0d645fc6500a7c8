//! JMAP method family.
//!
//! A request body decodes into a [`Batch`] of invocations. The
//! [`BatchDispatcher`] runs them one after another through their
//! [`MethodProcessor`] and collects an index-aligned [`BatchResult`].

mod api;
mod dispatch;
mod errors;
mod invocation;
mod mailboxes;
mod method;

pub use api::JmapApi;
pub use dispatch::{BatchDispatcher, CALL_ID, JmapErrorClassifier, method_rules};
pub use errors::{ErrorResponse, MethodError};
pub use invocation::{Batch, BatchResult, Invocation, InvocationResult, MethodCallId, MethodName};
pub use mailboxes::{GetMailboxes, SetMailboxes};
pub use method::MethodProcessor;
