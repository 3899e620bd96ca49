//! Structural invariants of a transcript that serde cannot express.

use std::collections::HashSet;

use crate::core::types::{Role, Turn};

/// Check transcript invariants:
/// - Only assistant turns carry invocations, with ids unique per turn
/// - Only tool turns carry an `invocation_ref`, and every tool turn has one
/// - A tool turn follows (possibly after sibling tool turns) the assistant turn
///   whose invocation it answers, at most once per invocation
pub fn validate_transcript(turns: &[Turn]) -> Vec<String> {
    let mut errors = Vec::new();
    // Invocation ids of the latest assistant turn that are still unanswered.
    let mut open: Option<HashSet<&str>> = None;

    for (index, turn) in turns.iter().enumerate() {
        if turn.role != Role::Assistant && !turn.invocations.is_empty() {
            errors.push(format!(
                "turn {index}: only assistant turns may request invocations"
            ));
        }
        if turn.role != Role::Tool && turn.invocation_ref.is_some() {
            errors.push(format!(
                "turn {index}: only tool turns may reference an invocation"
            ));
        }

        match turn.role {
            Role::Assistant => {
                let mut ids = HashSet::new();
                for invocation in &turn.invocations {
                    if !ids.insert(invocation.id.as_str()) {
                        errors.push(format!(
                            "turn {index}: duplicate invocation id '{}'",
                            invocation.id
                        ));
                    }
                }
                open = Some(ids);
            }
            Role::Tool => {
                let Some(reference) = turn.invocation_ref.as_deref() else {
                    errors.push(format!("turn {index}: tool turn missing invocation_ref"));
                    continue;
                };
                let answered = open.as_mut().is_some_and(|ids| ids.remove(reference));
                if !answered {
                    errors.push(format!(
                        "turn {index}: orphaned tool result for invocation '{reference}'"
                    ));
                }
            }
            Role::System | Role::User => open = None,
        }
    }

    errors
}
