//! Per-request pipeline states.

use std::fmt;

use tracing::{trace, warn};

use crate::diagnostics::REQUEST_TARGET;

/// Broad failure class used to pick a transport status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The request could not be decoded.
    BadRequest,
    /// The caller could not be authenticated.
    Unauthorized,
    /// Anything else.
    Internal,
}

impl FailureKind {
    /// Transport status code for the failure class.
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::Unauthorized => 401,
            Self::Internal => 500,
        }
    }
}

/// Stage a request is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Received,
    Authenticating,
    Decoding,
    Provisioning,
    Executing,
    Responding,
    Completed,
    Failed(FailureKind),
}

impl RequestState {
    /// Returns `true` if the pipeline may move from `self` to `next`.
    #[must_use]
    pub fn can_advance_to(self, next: Self) -> bool {
        use RequestState::{
            Authenticating, Completed, Decoding, Executing, Failed, Provisioning, Received,
            Responding,
        };
        match (self, next) {
            (Completed | Failed(_), Failed(_)) => false,
            (_, Failed(_)) => true,
            (Received, Authenticating)
            | (Authenticating, Decoding)
            | (Decoding, Provisioning)
            | (Provisioning, Executing)
            | (Executing | Failed(_), Responding)
            | (Responding, Completed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(kind) => write!(f, "Failed({kind:?})"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Ordered record of the states one request passed through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineTrace {
    states: Vec<RequestState>,
}

impl Default for PipelineTrace {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineTrace {
    /// Starts a trace in [`RequestState::Received`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            states: vec![RequestState::Received],
        }
    }

    /// Current state.
    #[must_use]
    pub fn current(&self) -> RequestState {
        self.states
            .last()
            .copied()
            .unwrap_or(RequestState::Received)
    }

    /// Moves to `next` if the transition is legal.
    ///
    /// Illegal transitions are logged and ignored; the return value reports
    /// whether the move happened.
    pub fn advance(&mut self, next: RequestState) -> bool {
        let current = self.current();
        if !current.can_advance_to(next) {
            warn!(target: REQUEST_TARGET, %current, %next, "ignored illegal state transition");
            return false;
        }
        trace!(target: REQUEST_TARGET, %current, %next, "request state changed");
        self.states.push(next);
        true
    }

    /// Records a failure followed by the move to [`RequestState::Responding`].
    pub fn fail(&mut self, kind: FailureKind) {
        if self.advance(RequestState::Failed(kind)) {
            self.advance(RequestState::Responding);
        }
    }

    /// States visited so far, oldest first.
    #[must_use]
    pub fn history(&self) -> &[RequestState] {
        &self.states
    }

    /// Failure recorded on the way, if any.
    #[must_use]
    pub fn failure(&self) -> Option<FailureKind> {
        self.states.iter().find_map(|state| match state {
            RequestState::Failed(kind) => Some(*kind),
            _ => None,
        })
    }
}
