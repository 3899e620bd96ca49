//! Append-only conversation state.

use anyhow::{Result, bail};

use crate::core::invariants::validate_transcript;
use crate::core::types::Turn;

/// Ordered transcript of turns forming the reasoner's context window.
///
/// Turns can only be appended. There is no API to edit, reorder or remove an
/// existing turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a transcript from persisted turns, rejecting invalid sequences.
    pub fn from_turns(turns: Vec<Turn>) -> Result<Self> {
        let errors = validate_transcript(&turns);
        if !errors.is_empty() {
            bail!("invalid transcript:\n- {}", errors.join("\n- "));
        }
        Ok(Self { turns })
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Owned copy of the current turns, for handing to a background writer.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Invocation;
    use serde_json::json;

    #[test]
    fn push_appends_in_order() {
        let mut transcript = Transcript::new();
        transcript.push(Turn::user("one"));
        transcript.push(Turn::assistant("two"));

        let contents: Vec<&str> = transcript
            .turns()
            .iter()
            .map(|turn| turn.content.as_str())
            .collect();
        assert_eq!(contents, vec!["one", "two"]);
        assert_eq!(transcript.last().map(|t| t.content.as_str()), Some("two"));
    }

    #[test]
    fn from_turns_rejects_orphaned_results() {
        let invocation = Invocation {
            id: "x".to_string(),
            capability: "search".to_string(),
            arguments: json!({}),
        };
        let err = Transcript::from_turns(vec![Turn::tool_result(&invocation, "lost")])
            .expect_err("orphan should be rejected");
        assert!(err.to_string().contains("orphaned tool result"));
    }

    #[test]
    fn snapshot_is_detached() {
        let mut transcript = Transcript::new();
        transcript.push(Turn::user("task"));
        let snapshot = transcript.snapshot();
        transcript.push(Turn::assistant("answer"));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(transcript.len(), 2);
    }
}
