//! Shared deterministic types for the loop core.
//!
//! These types define the transcript contract between the orchestrator, the
//! reasoner client and the history store. They carry no I/O and serialize to a
//! stable JSON shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Author of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    /// Result of one capability invocation.
    Tool,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// A single capability call requested by the reasoner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    /// Opaque id, unique within the owning assistant turn.
    pub id: String,
    /// Name the reasoner asked for; may not be registered.
    pub capability: String,
    /// Argument payload, passed through to the capability untouched.
    pub arguments: Value,
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    #[serde(default)]
    pub content: String,
    /// Present only on assistant turns that propose capability calls.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invocations: Vec<Invocation>,
    /// Present only on tool turns: id of the invocation this result answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation_ref: Option<String>,
    /// Present only on tool turns: name of the capability that produced it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capability: Option<String>,
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    /// Assistant turn that requests capability calls.
    pub fn assistant_with_invocations(
        content: impl Into<String>,
        invocations: Vec<Invocation>,
    ) -> Self {
        Self {
            invocations,
            ..Self::assistant(content)
        }
    }

    /// Tool-result turn answering `invocation`.
    pub fn tool_result(invocation: &Invocation, observation: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: observation.into(),
            invocations: Vec::new(),
            invocation_ref: Some(invocation.id.clone()),
            capability: Some(invocation.capability.clone()),
        }
    }

    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            invocations: Vec::new(),
            invocation_ref: None,
            capability: None,
        }
    }

    /// True when this is an assistant turn with no invocation requests.
    pub fn is_terminal(&self) -> bool {
        self.role == Role::Assistant && self.invocations.is_empty()
    }
}

/// Reasoner-visible description of a registered capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityDescriptor {
    pub name: String,
    pub description: String,
    /// JSON Schema of the argument payload.
    pub schema: Value,
}
