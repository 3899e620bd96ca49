//! Pure state transitions of the think-act-observe loop.
//!
//! The orchestrator owns the side effects (reasoner calls, dispatch, transcript
//! appends); this module only decides which state comes next, so the
//! termination rules can be tested without any I/O.

use crate::core::types::{Invocation, Turn};

/// Where the loop is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopState {
    /// About to issue reasoner request number `iteration` (1-indexed).
    AwaitingReasoner { iteration: u32 },
    /// Dispatching the invocations requested by response `iteration`.
    Dispatching {
        iteration: u32,
        invocations: Vec<Invocation>,
    },
    /// The reasoner produced a response without invocation requests.
    Done { answer: String },
    /// `max_iterations` requests were issued without a terminal response.
    Exhausted { max_iterations: u32 },
}

impl LoopState {
    pub fn start() -> Self {
        LoopState::AwaitingReasoner { iteration: 1 }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LoopState::Done { .. } | LoopState::Exhausted { .. })
    }
}

/// Transition after the reasoner answered request `iteration`.
pub fn after_response(iteration: u32, response: &Turn) -> LoopState {
    if response.invocations.is_empty() {
        return LoopState::Done {
            answer: response.content.clone(),
        };
    }
    LoopState::Dispatching {
        iteration,
        invocations: response.invocations.clone(),
    }
}

/// Transition after every invocation of response `iteration` was dispatched.
pub fn after_dispatch(iteration: u32, max_iterations: u32) -> LoopState {
    if iteration >= max_iterations {
        return LoopState::Exhausted { max_iterations };
    }
    LoopState::AwaitingReasoner {
        iteration: iteration + 1,
    }
}
