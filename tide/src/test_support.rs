//! Test-only fakes for the reasoner and capability boundaries.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use serde_json::{Value, json};

use crate::core::capability::Capability;
use crate::core::registry::CapabilityRegistry;
use crate::core::types::{Invocation, Turn};
use crate::io::reasoner::{Reasoner, ReasonerRequest};

/// Reasoner that replays a fixed queue of responses.
///
/// Records how many requests it saw, the transcript length of each, and the
/// timeout each carried. An exhausted queue is a transport error.
#[derive(Debug, Default)]
pub struct ScriptedReasoner {
    responses: RefCell<VecDeque<Result<Turn>>>,
    transcript_lens: RefCell<Vec<usize>>,
    timeouts: RefCell<Vec<Option<Duration>>>,
}

impl ScriptedReasoner {
    pub fn new(responses: Vec<Result<Turn>>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            ..Self::default()
        }
    }

    /// Reasoner that asks for `capability` in each of its `count` responses.
    pub fn always_invoking(capability: &str, count: usize) -> Self {
        let responses = (0..count)
            .map(|i| {
                Ok(Turn::assistant_with_invocations(
                    "",
                    vec![call(&format!("call_{i}"), capability)],
                ))
            })
            .collect();
        Self::new(responses)
    }

    pub fn requests(&self) -> usize {
        self.transcript_lens.borrow().len()
    }

    pub fn transcript_lens(&self) -> Vec<usize> {
        self.transcript_lens.borrow().clone()
    }

    pub fn timeouts(&self) -> Vec<Option<Duration>> {
        self.timeouts.borrow().clone()
    }
}

impl Reasoner for ScriptedReasoner {
    fn complete(&self, request: &ReasonerRequest<'_>) -> Result<Turn> {
        self.transcript_lens
            .borrow_mut()
            .push(request.transcript.len());
        self.timeouts.borrow_mut().push(request.timeout);
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("scripted reasoner has no more responses")))
    }
}

/// Invocation of `capability` with an empty argument object.
pub fn call(id: &str, capability: &str) -> Invocation {
    call_with(id, capability, json!({}))
}

pub fn call_with(id: &str, capability: &str, arguments: Value) -> Invocation {
    Invocation {
        id: id.to_string(),
        capability: capability.to_string(),
        arguments,
    }
}

/// Build a registry, panicking on construction errors.
pub fn registry(capabilities: Vec<Box<dyn Capability>>) -> CapabilityRegistry {
    CapabilityRegistry::new(capabilities).expect("test registry")
}

fn open_schema() -> Value {
    json!({"type": "object"})
}

/// Capability that always returns `output`.
pub fn fixed_capability(name: &str, output: &str) -> Box<dyn Capability> {
    Box::new(Fixed {
        name: name.to_string(),
        output: output.to_string(),
    })
}

struct Fixed {
    name: String,
    output: String,
}

impl Capability for Fixed {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "returns a fixed observation"
    }

    fn schema(&self) -> Value {
        open_schema()
    }

    fn invoke(&self, _arguments: &Value) -> Result<String> {
        Ok(self.output.clone())
    }
}

/// Capability that fails with `message` on every call.
pub fn failing_capability(name: &str, message: &str) -> Box<dyn Capability> {
    Box::new(Failing {
        name: name.to_string(),
        message: message.to_string(),
    })
}

struct Failing {
    name: String,
    message: String,
}

impl Capability for Failing {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "always fails"
    }

    fn schema(&self) -> Value {
        open_schema()
    }

    fn invoke(&self, _arguments: &Value) -> Result<String> {
        bail!("{}", self.message)
    }
}

/// Shared log of `(capability, arguments)` pairs in invocation order.
pub type CallLog = Rc<RefCell<Vec<(String, Value)>>>;

/// Capability that appends each call to a shared log and echoes its name.
pub struct RecordingCapability {
    name: String,
    log: CallLog,
}

impl RecordingCapability {
    pub fn boxed(name: &str, log: &CallLog) -> Box<dyn Capability> {
        Box::new(Self {
            name: name.to_string(),
            log: Rc::clone(log),
        })
    }
}

impl Capability for RecordingCapability {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "records every call"
    }

    fn schema(&self) -> Value {
        open_schema()
    }

    fn invoke(&self, arguments: &Value) -> Result<String> {
        self.log
            .borrow_mut()
            .push((self.name.clone(), arguments.clone()));
        Ok(format!("{} ok", self.name))
    }
}
