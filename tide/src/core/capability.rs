//! The capability contract consumed by the loop.

use anyhow::Result;
use serde_json::Value;

/// A named unit of work the reasoner can ask for.
///
/// The loop treats every capability identically through this trait; it never
/// looks inside the argument payload.
pub trait Capability {
    /// Stable identifier, used as the registry key and in the catalog.
    fn name(&self) -> &str;

    /// Natural-language summary shown to the reasoner.
    fn description(&self) -> &str;

    /// JSON Schema describing the argument payload.
    fn schema(&self) -> Value;

    /// Perform the work and return an observation.
    fn invoke(&self, arguments: &Value) -> Result<String>;
}
