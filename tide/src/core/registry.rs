//! Name → capability lookup and the dispatch rules applied to observations.

use std::collections::BTreeMap;

use jsonschema::Draft;
use tracing::debug;

use crate::core::capability::Capability;
use crate::core::types::{CapabilityDescriptor, Invocation};

/// Observation recorded in place of an empty capability output.
pub const EMPTY_OBSERVATION: &str = "no result found";

/// Construction-time registry errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("capability '{0}' registered more than once")]
    DuplicateName(String),

    #[error("capability name must not be empty")]
    EmptyName,

    #[error("capability '{name}' has an invalid argument schema: {message}")]
    InvalidSchema { name: String, message: String },
}

/// Outcome of dispatching one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// The capability ran; the text is the observation to record.
    Observed(String),
    /// No capability is registered under the requested name.
    Missed,
}

/// Immutable set of capabilities, keyed by name.
///
/// Backed by a `BTreeMap` so the catalog comes out sorted by name, the same on
/// every call.
pub struct CapabilityRegistry {
    capabilities: BTreeMap<String, Box<dyn Capability>>,
}

impl CapabilityRegistry {
    /// Build the registry once. Every argument schema must compile.
    pub fn new(capabilities: Vec<Box<dyn Capability>>) -> Result<Self, RegistryError> {
        let mut map = BTreeMap::new();
        for capability in capabilities {
            let name = capability.name().to_string();
            if name.trim().is_empty() {
                return Err(RegistryError::EmptyName);
            }
            check_schema(&name, &capability.schema())?;
            if map.contains_key(&name) {
                return Err(RegistryError::DuplicateName(name));
            }
            debug!(capability = %name, "registered capability");
            map.insert(name, capability);
        }
        Ok(Self { capabilities: map })
    }

    pub fn resolve(&self, name: &str) -> Option<&dyn Capability> {
        self.capabilities.get(name).map(|capability| capability.as_ref())
    }

    /// Descriptor snapshot of every registered capability, sorted by name.
    pub fn catalog(&self) -> Vec<CapabilityDescriptor> {
        self.capabilities
            .values()
            .map(|capability| CapabilityDescriptor {
                name: capability.name().to_string(),
                description: capability.description().to_string(),
                schema: capability.schema(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    /// Run the invocation and fold its result into an observation string.
    ///
    /// Capability failures never escape: they become observation text so the
    /// reasoner can react to them on the next iteration.
    pub fn dispatch(&self, invocation: &Invocation) -> Dispatch {
        let Some(capability) = self.resolve(&invocation.capability) else {
            return Dispatch::Missed;
        };
        let observation = match capability.invoke(&invocation.arguments) {
            Ok(output) if output.is_empty() => EMPTY_OBSERVATION.to_string(),
            Ok(output) => output,
            Err(err) => format!("Error executing capability: {err:#}"),
        };
        Dispatch::Observed(observation)
    }
}

fn check_schema(name: &str, schema: &serde_json::Value) -> Result<(), RegistryError> {
    jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(schema)
        .map(|_| ())
        .map_err(|err| RegistryError::InvalidSchema {
            name: name.to_string(),
            message: err.to_string(),
        })
}
