//! Failure surface of an orchestrator run.

/// Everything that can stop `Orchestrator::run` without a final answer.
///
/// Capability failures and dispatch misses are not here: they are recorded in
/// the transcript as observations.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// Required credentials or endpoints are missing; no orchestrator was built.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("task must not be empty")]
    EmptyTask,

    /// The reasoner call failed, returned something unusable, was cancelled,
    /// or ran past the deadline.
    #[error("reasoner request failed: {0:#}")]
    Transport(anyhow::Error),

    #[error("no final answer within {max_iterations} iterations")]
    BoundExhausted { max_iterations: u32 },
}

impl OrchestratorError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            OrchestratorError::Configuration(_) | OrchestratorError::EmptyTask => {
                crate::exit_codes::INVALID
            }
            OrchestratorError::Transport(_) => crate::exit_codes::TRANSPORT,
            OrchestratorError::BoundExhausted { .. } => crate::exit_codes::EXHAUSTED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn transport_shows_the_whole_chain() {
        let err = OrchestratorError::Transport(anyhow!("status 500").context("send request"));
        assert_eq!(
            err.to_string(),
            "reasoner request failed: send request: status 500"
        );
        assert_eq!(err.exit_code(), crate::exit_codes::TRANSPORT);
    }

    #[test]
    fn exhaustion_names_the_bound() {
        let err = OrchestratorError::BoundExhausted { max_iterations: 10 };
        assert_eq!(err.to_string(), "no final answer within 10 iterations");
        assert_eq!(err.exit_code(), crate::exit_codes::EXHAUSTED);
    }
}
