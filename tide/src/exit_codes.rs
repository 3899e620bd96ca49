//! Stable exit codes for tide CLI commands.

/// Command succeeded; for `run`/`solo` the reasoner gave a final answer.
pub const OK: i32 = 0;
/// Invalid config, missing credentials, empty task or other setup errors.
pub const INVALID: i32 = 1;
/// The reasoner request failed, was cancelled or timed out.
pub const TRANSPORT: i32 = 2;
/// No final answer within the iteration bound.
pub const EXHAUSTED: i32 = 3;
