//! Bounded think-act-observe agent loop.
//!
//! A reasoner (a chat model) is given a task and a catalog of capabilities. It
//! alternates between requesting capability invocations and reading their
//! observations until it answers without invocations or the iteration bound
//! runs out. The crate keeps a strict split:
//!
//! - **[`core`]**: Pure logic (turn types, transcript invariants, capability
//!   registry, loop state machine). No I/O.
//! - **[`io`]**: Side effects (config, history persistence, reasoner HTTP
//!   client, child processes, prompt rendering).
//! - **[`tools`]**: Built-in capabilities.
//!
//! [`orchestrator`] ties them together behind `Orchestrator::run`.

pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod orchestrator;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod tools;
