//! Reasoner abstraction for the loop.
//!
//! The [`Reasoner`] trait decouples the orchestrator from the model backend
//! (currently an OpenAI-compatible HTTP API). Tests use scripted reasoners that
//! return predetermined turns without any network traffic.

use std::time::Duration;

use anyhow::Result;

use crate::core::types::{CapabilityDescriptor, Turn};

/// Parameters for one reasoner call.
#[derive(Debug, Clone, Copy)]
pub struct ReasonerRequest<'a> {
    /// Full ordered transcript, including the latest user turn.
    pub transcript: &'a [Turn],
    /// Capabilities the reasoner may ask for.
    pub catalog: &'a [CapabilityDescriptor],
    /// Remaining time the caller allows for this call, if bounded.
    pub timeout: Option<Duration>,
}

/// Abstraction over reasoner backends.
pub trait Reasoner {
    /// Produce the next assistant turn. Any error is a transport failure.
    fn complete(&self, request: &ReasonerRequest<'_>) -> Result<Turn>;
}

impl<R: Reasoner + ?Sized> Reasoner for &R {
    fn complete(&self, request: &ReasonerRequest<'_>) -> Result<Turn> {
        (**self).complete(request)
    }
}

impl<R: Reasoner + ?Sized> Reasoner for Box<R> {
    fn complete(&self, request: &ReasonerRequest<'_>) -> Result<Turn> {
        (**self).complete(request)
    }
}
