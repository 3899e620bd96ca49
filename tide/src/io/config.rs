//! Agent configuration stored under `.tide/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Default location of the config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = ".tide/config.toml";

/// What to do when the reasoner asks for a capability that is not registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownCapability {
    /// Drop the invocation; nothing is appended to the transcript.
    #[default]
    Skip,
    /// Append a synthetic error observation so the reasoner can correct itself.
    Report,
}

/// Agent configuration (TOML).
///
/// Intended to be edited by humans. Missing fields default to the values the
/// builder mode has always used.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TideConfig {
    /// Reasoner request bound for a single task.
    pub max_iterations: u32,

    /// Reasoner request bound for the autonomous solo mode.
    pub solo_max_iterations: u32,

    /// Where the conversation history snapshot lives.
    pub history_path: PathBuf,

    /// Persist history in the background after every completed exchange.
    pub autosave: bool,

    pub on_unknown_capability: UnknownCapability,

    pub reasoner: ReasonerConfig,

    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReasonerConfig {
    /// Model name (or Azure deployment fallback).
    pub model: String,

    /// Upper bound on a single reasoner request, in seconds.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ToolsConfig {
    /// Working directory for `terminal` commands.
    pub workdir: PathBuf,

    /// Wall-clock limit for `terminal` and `deployer` commands.
    pub command_timeout_secs: u64,

    /// Truncate captured command output beyond this many bytes.
    pub output_limit_bytes: usize,

    /// Command run by `deployer` inside the project directory.
    pub deploy_command: Vec<String>,

    /// HTML search endpoint used by `search`.
    pub search_url: String,
}

impl Default for TideConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            solo_max_iterations: 500,
            history_path: PathBuf::from(".tide/history.json"),
            autosave: true,
            on_unknown_capability: UnknownCapability::Skip,
            reasoner: ReasonerConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-2024-08-06".to_string(),
            timeout_secs: 5 * 60,
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            workdir: PathBuf::from("."),
            command_timeout_secs: 120,
            output_limit_bytes: 100_000,
            deploy_command: vec!["vercel".to_string(), "--prod".to_string()],
            search_url: "https://html.duckduckgo.com/html/".to_string(),
        }
    }
}

impl TideConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(anyhow!("max_iterations must be > 0"));
        }
        if self.solo_max_iterations == 0 {
            return Err(anyhow!("solo_max_iterations must be > 0"));
        }
        if self.history_path.as_os_str().is_empty() {
            return Err(anyhow!("history_path must not be empty"));
        }
        if self.reasoner.model.trim().is_empty() {
            return Err(anyhow!("reasoner.model must not be empty"));
        }
        if self.reasoner.timeout_secs == 0 {
            return Err(anyhow!("reasoner.timeout_secs must be > 0"));
        }
        if self.tools.command_timeout_secs == 0 {
            return Err(anyhow!("tools.command_timeout_secs must be > 0"));
        }
        if self.tools.output_limit_bytes == 0 {
            return Err(anyhow!("tools.output_limit_bytes must be > 0"));
        }
        if self.tools.deploy_command.is_empty() || self.tools.deploy_command[0].trim().is_empty()
        {
            return Err(anyhow!("tools.deploy_command must be a non-empty array"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `TideConfig::default()`.
pub fn load_config(path: &Path) -> Result<TideConfig> {
    if !path.exists() {
        let cfg = TideConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: TideConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &TideConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    super::write_atomic(path, &buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, TideConfig::default());
        assert_eq!(cfg.max_iterations, 10);
        assert_eq!(cfg.solo_max_iterations, 500);
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(".tide/config.toml");
        let cfg = TideConfig {
            on_unknown_capability: UnknownCapability::Report,
            ..TideConfig::default()
        };
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "max_iterations = 3\n[reasoner]\nmodel = \"local\"\n").expect("write");

        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.max_iterations, 3);
        assert_eq!(cfg.reasoner.model, "local");
        assert_eq!(cfg.reasoner.timeout_secs, 300);
        assert!(cfg.autosave);
    }

    #[test]
    fn zero_bound_is_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "max_iterations = 0\n").expect("write");

        let err = load_config(&path).expect_err("zero bound");
        assert!(err.to_string().contains("max_iterations"));
    }
}
