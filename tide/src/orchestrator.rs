//! The think-act-observe loop.
//!
//! An [`Orchestrator`] owns one transcript and one capability registry. Each
//! [`Orchestrator::run`] appends the task, then alternates between asking the
//! reasoner for the next assistant turn and dispatching the invocations it
//! requests, until the reasoner answers without invocations or the iteration
//! bound is hit.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow, bail};
use tracing::{debug, info, instrument, warn};

use crate::core::budget::remaining_budget;
use crate::core::invariants::validate_transcript;
use crate::core::machine::{LoopState, after_dispatch, after_response};
use crate::core::registry::{CapabilityRegistry, Dispatch};
use crate::core::transcript::Transcript;
use crate::core::types::{Invocation, Role, Turn};
use crate::error::OrchestratorError;
use crate::io::config::{TideConfig, UnknownCapability};
use crate::io::history::HistoryStore;
use crate::io::persister::Persister;
use crate::io::reasoner::{Reasoner, ReasonerRequest};

/// Loop policy for one orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopConfig {
    /// Maximum reasoner requests per run.
    pub max_iterations: u32,
    pub on_unknown_capability: UnknownCapability,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            on_unknown_capability: UnknownCapability::Skip,
        }
    }
}

impl LoopConfig {
    /// Bounded builder task.
    pub fn builder(config: &TideConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            on_unknown_capability: config.on_unknown_capability,
        }
    }

    /// Autonomous solo mode.
    pub fn solo(config: &TideConfig) -> Self {
        Self {
            max_iterations: config.solo_max_iterations,
            on_unknown_capability: config.on_unknown_capability,
        }
    }
}

/// Shared cancellation switch for a running loop.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Deadline and cancellation for one run.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub deadline: Option<Instant>,
    pub cancel: Option<CancelFlag>,
}

impl RunContext {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            cancel: None,
        }
    }

    /// Time left for the next reasoner call, or an error if the run must stop.
    fn request_budget(&self) -> Result<Option<Duration>> {
        if let Some(cancel) = &self.cancel
            && cancel.is_cancelled()
        {
            bail!("run cancelled");
        }
        self.deadline.map(remaining_budget).transpose()
    }
}

/// Progress notifications emitted while a run is in flight.
#[derive(Debug, Clone, Copy)]
pub enum LoopEvent<'a> {
    /// Reasoner request number `iteration` is about to be sent.
    RequestSent { iteration: u32, max_iterations: u32 },
    /// Free text the reasoner produced alongside invocation requests.
    Thought { content: &'a str },
    Invoking { invocation: &'a Invocation },
    Observed {
        invocation: &'a Invocation,
        observation: &'a str,
    },
    /// The requested capability is not registered.
    Missed { invocation: &'a Invocation },
    Answer { content: &'a str },
}

type Observer = Box<dyn FnMut(&LoopEvent<'_>)>;

/// Drives a [`Reasoner`] through the loop over an owned transcript.
pub struct Orchestrator<R: Reasoner> {
    reasoner: R,
    registry: CapabilityRegistry,
    config: LoopConfig,
    transcript: Transcript,
    history: Option<HistoryStore>,
    autosave: bool,
    persister: Persister,
    observer: Option<Observer>,
}

impl<R: Reasoner> Orchestrator<R> {
    pub fn new(reasoner: R, registry: CapabilityRegistry, config: LoopConfig) -> Self {
        Self {
            reasoner,
            registry,
            config: LoopConfig {
                max_iterations: config.max_iterations.max(1),
                ..config
            },
            transcript: Transcript::new(),
            history: None,
            autosave: false,
            persister: Persister::new(),
            observer: None,
        }
    }

    /// Attach a persistence target. With `autosave`, every finished run is
    /// saved in the background.
    pub fn with_history(mut self, store: HistoryStore, autosave: bool) -> Self {
        self.history = Some(store);
        self.autosave = autosave;
        self
    }

    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: FnMut(&LoopEvent<'_>) + 'static,
    {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn config(&self) -> LoopConfig {
        self.config
    }

    /// Seed `prompt` as the first turn. Returns false (and does nothing) if the
    /// transcript already has turns.
    pub fn seed_system_prompt(&mut self, prompt: impl Into<String>) -> bool {
        if !self.transcript.is_empty() {
            return false;
        }
        self.transcript.push(Turn::system(prompt));
        true
    }

    /// Run `task` to a final answer with no deadline.
    pub fn run(&mut self, task: &str) -> Result<String, OrchestratorError> {
        self.run_with(task, &RunContext::default())
    }

    /// Run `task` under `ctx`.
    ///
    /// Turns appended before a failure stay in the transcript.
    #[instrument(skip_all, fields(max_iterations = self.config.max_iterations))]
    pub fn run_with(&mut self, task: &str, ctx: &RunContext) -> Result<String, OrchestratorError> {
        if task.trim().is_empty() {
            return Err(OrchestratorError::EmptyTask);
        }
        let outcome = self.drive(task, ctx);
        match &outcome {
            Ok(_) => info!(turns = self.transcript.len(), "run finished"),
            Err(err) => warn!(err = %err, turns = self.transcript.len(), "run stopped"),
        }
        if self.autosave
            && let Some(store) = &self.history
        {
            self.persister
                .schedule(store.clone(), self.transcript.snapshot());
        }
        outcome
    }

    fn drive(&mut self, task: &str, ctx: &RunContext) -> Result<String, OrchestratorError> {
        self.transcript.push(Turn::user(task));
        let catalog = self.registry.catalog();
        let max_iterations = self.config.max_iterations;

        let mut state = LoopState::start();
        loop {
            state = match state {
                LoopState::AwaitingReasoner { iteration } => {
                    let timeout = ctx.request_budget().map_err(OrchestratorError::Transport)?;
                    self.emit(&LoopEvent::RequestSent {
                        iteration,
                        max_iterations,
                    });
                    debug!(iteration, "requesting next turn");
                    let request = ReasonerRequest {
                        transcript: self.transcript.turns(),
                        catalog: &catalog,
                        timeout,
                    };
                    let response = self
                        .reasoner
                        .complete(&request)
                        .map_err(OrchestratorError::Transport)?;
                    if response.role != Role::Assistant {
                        return Err(OrchestratorError::Transport(anyhow!(
                            "reasoner returned a {} turn instead of an assistant turn",
                            response.role.as_str()
                        )));
                    }
                    let problems = validate_transcript(std::slice::from_ref(&response));
                    if !problems.is_empty() {
                        return Err(OrchestratorError::Transport(anyhow!(
                            "reasoner returned a malformed turn: {}",
                            problems.join("; ")
                        )));
                    }
                    if !response.invocations.is_empty() && !response.content.trim().is_empty() {
                        self.emit(&LoopEvent::Thought {
                            content: &response.content,
                        });
                    }
                    let next = after_response(iteration, &response);
                    self.transcript.push(response);
                    next
                }
                LoopState::Dispatching {
                    iteration,
                    invocations,
                } => {
                    for invocation in &invocations {
                        self.dispatch(invocation);
                    }
                    after_dispatch(iteration, max_iterations)
                }
                LoopState::Done { answer } => {
                    self.emit(&LoopEvent::Answer { content: &answer });
                    return Ok(answer);
                }
                LoopState::Exhausted { max_iterations } => {
                    return Err(OrchestratorError::BoundExhausted { max_iterations });
                }
            };
        }
    }

    fn dispatch(&mut self, invocation: &Invocation) {
        self.emit(&LoopEvent::Invoking { invocation });
        let observation = match self.registry.dispatch(invocation) {
            Dispatch::Observed(observation) => observation,
            Dispatch::Missed => {
                warn!(capability = %invocation.capability, id = %invocation.id, "unknown capability requested");
                self.emit(&LoopEvent::Missed { invocation });
                match self.config.on_unknown_capability {
                    UnknownCapability::Skip => return,
                    UnknownCapability::Report => format!(
                        "Error: capability '{}' is not registered",
                        invocation.capability
                    ),
                }
            }
        };
        self.emit(&LoopEvent::Observed {
            invocation,
            observation: &observation,
        });
        self.transcript
            .push(Turn::tool_result(invocation, observation));
    }

    fn emit(&mut self, event: &LoopEvent<'_>) {
        if let Some(observer) = self.observer.as_mut() {
            observer(event);
        }
    }

    /// Write the transcript to the history store now, after any pending
    /// background save.
    pub fn save(&mut self) -> Result<()> {
        let store = self
            .history
            .as_ref()
            .ok_or_else(|| anyhow!("no history path configured"))?;
        if let Err(err) = self.persister.flush() {
            warn!(err = %format!("{err:#}"), "previous background save failed");
        }
        store.save(self.transcript.turns())
    }

    /// Restore the transcript from the history store. Only allowed before any
    /// turn was appended. Returns the number of restored turns.
    pub fn load(&mut self) -> Result<usize> {
        if !self.transcript.is_empty() {
            bail!(
                "cannot load history into a transcript that already has {} turns",
                self.transcript.len()
            );
        }
        let store = self
            .history
            .as_ref()
            .ok_or_else(|| anyhow!("no history path configured"))?;
        self.transcript = store.load()?;
        Ok(self.transcript.len())
    }

    /// Wait for the outstanding background save and report its result.
    pub fn flush(&mut self) -> Result<()> {
        self.persister.flush()
    }
}
