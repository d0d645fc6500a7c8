//! Command pipeline for the Postbox mail server.
//!
//! The crate turns decoded client requests into mailbox operations and maps
//! every outcome back onto exactly one protocol response. Two protocol
//! families share the same machinery:
//!
//! - **IMAP**: each command has a [`imap::CommandProcessor`] that performs one
//!   store operation and translates failures through an ordered rule table
//!   ([`classify::ErrorClassifier`]). Every rule pairs a response with a log
//!   directive, so each failure is logged exactly once at a chosen severity.
//! - **JMAP**: a request body is a batch of method invocations. The
//!   [`jmap::BatchDispatcher`] runs them in order and returns an index-aligned
//!   list of results. Method failures become per-invocation error entries and
//!   never fail the batch.
//!
//! JMAP batches reach the dispatcher through the [`http::RouteTable`]. Each
//! authenticated route runs fixed pre-stages before its handler:
//! authentication, body decoding, then user and default-mailbox provisioning.
//! Failures in those stages become generic transport responses (400, 401 or
//! 500) without touching the handler.
//!
//! Requests are cancellable. When a connection's [`cancel::CloseSignal`]
//! fires, the in-flight pipeline future is dropped and no response is
//! written.
//!
//! [`bootstrap_with`] wires everything together from a [`postbox_config`]
//! configuration and reports lifecycle events to a [`HealthReporter`].

pub mod auth;
mod bootstrap;
pub mod cancel;
pub mod classify;
pub mod diagnostics;
mod health;
pub mod http;
pub mod imap;
pub mod jmap;
pub mod mailbox;
pub mod metrics;
pub mod pipeline;
pub mod provision;
pub mod session;
mod telemetry;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Postbox, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
