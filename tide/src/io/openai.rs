//! OpenAI-compatible Chat Completions client.
//!
//! Talks to api.openai.com, any server exposing the same API under a custom
//! base URL, or an Azure OpenAI deployment.

use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use crate::core::types::{CapabilityDescriptor, Invocation, Role, Turn};
use crate::io::credentials::{Endpoint, ReasonerCredentials};
use crate::io::reasoner::{Reasoner, ReasonerRequest};

/// Reasoner backed by the Chat Completions endpoint.
#[derive(Debug)]
pub struct OpenAiReasoner {
    http: Client,
    credentials: ReasonerCredentials,
    model: String,
    timeout: Duration,
}

impl OpenAiReasoner {
    /// Build a client whose requests never run longer than `timeout`.
    pub fn new(
        credentials: ReasonerCredentials,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self {
            http,
            credentials,
            model: model.into(),
            timeout,
        })
    }
}

impl Reasoner for OpenAiReasoner {
    #[instrument(skip_all, fields(model = %self.model, turns = request.transcript.len()))]
    fn complete(&self, request: &ReasonerRequest<'_>) -> Result<Turn> {
        let url = self.credentials.endpoint.completions_url(&self.model);
        let body = ChatRequest::new(&self.model, request);
        info!(tools = body.tools.len(), "sending chat completion request");

        let mut builder = self.http.post(&url).json(&body);
        builder = match &self.credentials.endpoint {
            Endpoint::OpenAi { .. } => builder.bearer_auth(&self.credentials.api_key),
            Endpoint::Azure { .. } => builder.header("api-key", &self.credentials.api_key),
        };
        if let Some(remaining) = request.timeout {
            builder = builder.timeout(remaining.min(self.timeout));
        }

        let response = builder.send().context("send chat completion request")?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_else(|_| "(no body)".to_string());
            warn!(status = status.as_u16(), "chat completion rejected");
            bail!(
                "chat completion failed (status {}): {}",
                status.as_u16(),
                text.trim()
            );
        }

        let parsed: ChatResponse = response
            .json()
            .context("parse chat completion response")?;
        let turn = parsed.into_turn()?;
        debug!(invocations = turn.invocations.len(), "received assistant turn");
        Ok(turn)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
}

impl ChatRequest {
    fn new(model: &str, request: &ReasonerRequest<'_>) -> Self {
        Self {
            model: model.to_string(),
            messages: request.transcript.iter().map(WireMessage::from_turn).collect(),
            tools: request.catalog.iter().map(WireTool::from_descriptor).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl WireMessage {
    fn from_turn(turn: &Turn) -> Self {
        // Assistant turns that only carry tool calls go out with `content: null`.
        let content = if turn.role == Role::Assistant
            && turn.content.is_empty()
            && !turn.invocations.is_empty()
        {
            None
        } else {
            Some(turn.content.clone())
        };
        Self {
            role: turn.role.as_str(),
            content,
            tool_calls: turn.invocations.iter().map(WireToolCall::from_invocation).collect(),
            tool_call_id: turn.invocation_ref.clone(),
            name: turn.capability.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: WireFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    /// JSON-encoded argument object, as the API transmits it.
    #[serde(default)]
    arguments: String,
}

fn function_kind() -> String {
    "function".to_string()
}

impl WireToolCall {
    fn from_invocation(invocation: &Invocation) -> Self {
        let arguments = match &invocation.arguments {
            Value::String(raw) => raw.clone(),
            other => other.to_string(),
        };
        Self {
            id: invocation.id.clone(),
            kind: function_kind(),
            function: WireFunction {
                name: invocation.capability.clone(),
                arguments,
            },
        }
    }

    fn into_invocation(self) -> Invocation {
        Invocation {
            id: self.id,
            capability: self.function.name,
            arguments: decode_arguments(self.function.arguments),
        }
    }
}

/// Parse the argument string; malformed JSON is kept verbatim as a string so
/// the capability can reject it.
fn decode_arguments(raw: String) -> Value {
    if raw.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireToolFunction,
}

#[derive(Debug, Serialize)]
struct WireToolFunction {
    name: String,
    description: String,
    parameters: Value,
}

impl WireTool {
    fn from_descriptor(descriptor: &CapabilityDescriptor) -> Self {
        Self {
            kind: "function",
            function: WireToolFunction {
                name: descriptor.name.clone(),
                description: descriptor.description.clone(),
                parameters: descriptor.schema.clone(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<WireToolCall>>,
}

impl ChatResponse {
    fn into_turn(self) -> Result<Turn> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("chat completion response contained no choices"))?;
        let message = choice.message;
        let invocations = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(WireToolCall::into_invocation)
            .collect();
        Ok(Turn::assistant_with_invocations(
            message.content.unwrap_or_default(),
            invocations,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation() -> Invocation {
        Invocation {
            id: "call_1".to_string(),
            capability: "terminal".to_string(),
            arguments: json!({"command": "ls"}),
        }
    }

    #[test]
    fn request_carries_transcript_and_tools() {
        let call = invocation();
        let transcript = vec![
            Turn::user("list files"),
            Turn::assistant_with_invocations("", vec![call.clone()]),
            Turn::tool_result(&call, "a.txt"),
        ];
        let catalog = vec![CapabilityDescriptor {
            name: "terminal".to_string(),
            description: "run a command".to_string(),
            schema: json!({"type": "object"}),
        }];
        let request = ReasonerRequest {
            transcript: &transcript,
            catalog: &catalog,
            timeout: None,
        };

        let body = serde_json::to_value(ChatRequest::new("gpt-test", &request)).expect("json");
        assert_eq!(body["model"], "gpt-test");
        assert_eq!(body["messages"][0], json!({"role": "user", "content": "list files"}));
        assert_eq!(body["messages"][1]["content"], Value::Null);
        assert_eq!(
            body["messages"][1]["tool_calls"][0]["function"]["arguments"],
            "{\"command\":\"ls\"}"
        );
        assert_eq!(body["messages"][2]["role"], "tool");
        assert_eq!(body["messages"][2]["tool_call_id"], "call_1");
        assert_eq!(body["messages"][2]["name"], "terminal");
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "terminal");
    }

    #[test]
    fn empty_catalog_omits_tools() {
        let transcript = vec![Turn::user("hi")];
        let request = ReasonerRequest {
            transcript: &transcript,
            catalog: &[],
            timeout: None,
        };
        let body = serde_json::to_value(ChatRequest::new("m", &request)).expect("json");
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn response_with_tool_calls_becomes_invocations() {
        let response: ChatResponse = serde_json::from_value(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {"id": "a", "type": "function", "function": {"name": "search", "arguments": "{\"query\":\"rust\"}"}},
                        {"id": "b", "type": "function", "function": {"name": "terminal", "arguments": "{not json"}}
                    ]
                }
            }]
        }))
        .expect("parse");

        let turn = response.into_turn().expect("turn");
        assert_eq!(turn.role, Role::Assistant);
        assert_eq!(turn.content, "");
        assert_eq!(turn.invocations[0].arguments, json!({"query": "rust"}));
        assert_eq!(turn.invocations[1].arguments, json!("{not json"));
        assert_eq!(
            WireToolCall::from_invocation(&turn.invocations[1]).function.arguments,
            "{not json"
        );
    }

    #[test]
    fn final_response_is_terminal() {
        let response: ChatResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "All done."}}]
        }))
        .expect("parse");
        let turn = response.into_turn().expect("turn");
        assert!(turn.is_terminal());
        assert_eq!(turn.content, "All done.");
    }

    #[test]
    fn empty_choices_is_an_error() {
        let response: ChatResponse = serde_json::from_value(json!({"choices": []})).expect("parse");
        let err = response.into_turn().expect_err("no choices");
        assert!(err.to_string().contains("no choices"));
    }

    #[test]
    fn blank_arguments_decode_to_empty_object() {
        assert_eq!(decode_arguments(String::new()), json!({}));
    }
}
