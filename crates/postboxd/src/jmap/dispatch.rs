//! Sequential execution of JMAP batches.
//!
//! Invocations run strictly in submission order: invocation *i + 1* starts
//! only once invocation *i* has produced its result, so later calls observe
//! the effects of earlier ones. A failing invocation yields an `error` result
//! at its index and the batch carries on.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::Instrument;

use super::errors::{ErrorResponse, MethodError};
use super::invocation::{Batch, BatchResult, Invocation, InvocationResult};
use super::mailboxes::{GetMailboxes, SetMailboxes};
use super::method::MethodProcessor;
use crate::classify::{ErrorClassifier, ErrorRule, LogDirective};
use crate::diagnostics::{ACTION, DiagnosticContext, PROTOCOL};
use crate::session::SessionContext;

/// Diagnostic key carrying the method call id.
pub const CALL_ID: &str = "call_id";

/// Rule table mapping method errors to JMAP error results.
pub type JmapErrorClassifier = ErrorClassifier<MethodError, ErrorResponse>;

/// Builds the JMAP method error table.
#[must_use]
pub fn method_rules() -> JmapErrorClassifier {
    ErrorClassifier::new(
        vec![
            ErrorRule::new(
                "unknown-method",
                |error| matches!(error, MethodError::UnknownMethod { .. }),
                ErrorResponse::bare("unknownMethod"),
                LogDirective::debug("rejected unknown method"),
            ),
            ErrorRule::new(
                "invalid-arguments",
                |error| matches!(error, MethodError::InvalidArguments { .. }),
                ErrorResponse::described("invalidArguments"),
                LogDirective::debug("rejected invalid method arguments"),
            ),
            ErrorRule::new(
                "mailbox-error",
                MethodError::is_domain,
                ErrorResponse::described("serverFail"),
                LogDirective::warn("method failed on a mailbox error"),
            ),
        ],
        ErrorResponse::bare("serverFail"),
        "unexpected error while processing method",
    )
}

/// Runs batches through registered method processors.
pub struct BatchDispatcher {
    processors: HashMap<&'static str, Arc<dyn MethodProcessor>>,
    rules: JmapErrorClassifier,
}

impl Default for BatchDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BatchDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<_> = self.processors.keys().collect();
        methods.sort();
        f.debug_struct("BatchDispatcher")
            .field("methods", &methods)
            .finish_non_exhaustive()
    }
}

impl BatchDispatcher {
    /// Creates a dispatcher with no methods.
    #[must_use]
    pub fn new() -> Self {
        Self {
            processors: HashMap::new(),
            rules: method_rules(),
        }
    }

    /// Creates a dispatcher with the draft mailbox methods.
    #[must_use]
    pub fn with_mailbox_methods() -> Self {
        Self::new()
            .with_processor(Arc::new(GetMailboxes))
            .with_processor(Arc::new(SetMailboxes))
    }

    /// Registers `processor` under its method name.
    #[must_use]
    pub fn with_processor(mut self, processor: Arc<dyn MethodProcessor>) -> Self {
        self.processors.insert(processor.method_name(), processor);
        self
    }

    /// Executes every invocation of `batch` in order.
    pub async fn dispatch(&self, batch: &Batch, session: &SessionContext) -> BatchResult {
        let mut results = Vec::with_capacity(batch.len());
        for invocation in batch.invocations() {
            results.push(self.execute(invocation, session).await);
        }
        BatchResult::new(results)
    }

    async fn execute(&self, invocation: &Invocation, session: &SessionContext) -> InvocationResult {
        let context = DiagnosticContext::new()
            .with(PROTOCOL, "jmap")
            .with(ACTION, invocation.method_name())
            .with(CALL_ID, invocation.call_id());
        let call_id = invocation.call_id().clone();

        let outcome = match self.processors.get(invocation.method_name().as_str()) {
            Some(processor) => processor
                .process(invocation.arguments(), session)
                .instrument(context.span())
                .await
                .map(|result| (processor.response_name(), result)),
            None => Err(MethodError::unknown_method(invocation.method_name().as_str())),
        };

        match outcome {
            Ok((name, result)) => InvocationResult::new(name, result, call_id),
            Err(error) => {
                let classified = self.rules.resolve(&error, &context);
                InvocationResult::error(classified.action.to_value(&error), call_id)
            }
        }
    }
}
