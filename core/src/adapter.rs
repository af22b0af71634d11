//! Per-screen error state exposed to presentation code.
//!
//! # Design
//! An `ErrorAdapter` holds at most one `ClassifiedError`. A new failure
//! replaces the current one; there is no queue. The adapter is owned by the
//! screen that created it and mutated through `&mut self`, so it needs no
//! locking. It never retries the failed call and never touches the transport.

use crate::classify::classify;
use crate::context::OperationContext;
use crate::error::{ClassifiedError, Failure};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum AdapterState {
    #[default]
    Idle,
    Showing(ClassifiedError),
}

#[derive(Debug, Clone, Default)]
pub struct ErrorAdapter {
    state: AdapterState,
}

impl ErrorAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `candidate`, classifying it first unless a wrapper already did.
    ///
    /// `context` is only consulted for raw failures.
    pub fn handle_error(&mut self, candidate: impl Into<Failure>, context: Option<OperationContext>) {
        let classified = match candidate.into() {
            Failure::Classified(err) => err,
            Failure::Raw(raw) => classify(raw, context),
        };
        if let AdapterState::Showing(previous) = &self.state {
            tracing::debug!(replaced = %previous.kind(), kind = %classified.kind(), "replacing visible error");
        }
        self.state = AdapterState::Showing(classified);
    }

    pub fn clear_error(&mut self) {
        self.state = AdapterState::Idle;
    }

    pub fn classified_error(&self) -> Option<&ClassifiedError> {
        match &self.state {
            AdapterState::Showing(err) => Some(err),
            AdapterState::Idle => None,
        }
    }

    pub fn is_showing(&self) -> bool {
        matches!(self.state, AdapterState::Showing(_))
    }

    pub fn state(&self) -> &AdapterState {
        &self.state
    }
}
