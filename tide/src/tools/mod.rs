//! Built-in capabilities: file writing and editing, shell commands, web
//! search and deployment.

mod code_writer;
mod deployer;
mod file_editor;
mod search;
mod terminal;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::capability::Capability;
use crate::io::config::ToolsConfig;

pub use code_writer::CodeWriter;
pub use deployer::Deployer;
pub use file_editor::FileEditor;
pub use search::{Search, parse_results};
pub use terminal::Terminal;

/// Capabilities for a bounded builder task.
pub fn builder_capabilities(config: &ToolsConfig) -> Result<Vec<Box<dyn Capability>>> {
    Ok(vec![
        Box::new(CodeWriter::new(&config.workdir)),
        Box::new(FileEditor::new(&config.workdir)),
        Box::new(Terminal::new(config)),
        Box::new(Search::new(config)?),
    ])
}

/// Builder capabilities plus `deployer`.
pub fn solo_capabilities(config: &ToolsConfig) -> Result<Vec<Box<dyn Capability>>> {
    let mut capabilities = builder_capabilities(config)?;
    capabilities.push(Box::new(Deployer::new(config)));
    Ok(capabilities)
}

/// Check `arguments` against `schema`, then decode them.
///
/// A string payload means the reasoner emitted arguments that were not JSON.
pub(crate) fn parse_args<T: DeserializeOwned>(schema: &Value, arguments: &Value) -> Result<T> {
    if let Value::String(raw) = arguments {
        bail!("arguments are not valid JSON: {raw}");
    }
    let validator = jsonschema::validator_for(schema)
        .map_err(|err| anyhow!("compile argument schema: {err}"))?;
    let problems: Vec<String> = validator
        .iter_errors(arguments)
        .map(|err| err.to_string())
        .collect();
    if !problems.is_empty() {
        bail!("invalid arguments: {}", problems.join("; "));
    }
    serde_json::from_value(arguments.clone()).context("decode arguments")
}

/// Resolve a reasoner-supplied path against the tools working directory.
fn resolve(workdir: &Path, relative: &str) -> PathBuf {
    workdir.join(relative)
}
