use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::{Result, bail};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, instrument};

use crate::core::capability::Capability;
use crate::io::config::ToolsConfig;
use crate::io::process::run_command_with_timeout;

/// Runs a shell command in the tools working directory.
#[derive(Debug, Clone)]
pub struct Terminal {
    workdir: PathBuf,
    timeout: Duration,
    output_limit_bytes: usize,
}

#[derive(Debug, Deserialize)]
struct Args {
    command: String,
}

impl Terminal {
    pub fn new(config: &ToolsConfig) -> Self {
        Self {
            workdir: config.workdir.clone(),
            timeout: Duration::from_secs(config.command_timeout_secs),
            output_limit_bytes: config.output_limit_bytes,
        }
    }
}

impl Capability for Terminal {
    fn name(&self) -> &str {
        "terminal"
    }

    fn description(&self) -> &str {
        "Execute a shell command with `sh -c` and return its combined stdout and stderr. Argument: 'command'."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": {"type": "string", "minLength": 1}
            },
            "required": ["command"]
        })
    }

    #[instrument(skip_all, fields(capability = "terminal"))]
    fn invoke(&self, arguments: &Value) -> Result<String> {
        let args: Args = super::parse_args(&self.schema(), arguments)?;
        info!(command = %args.command, "running shell command");

        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(&args.command).current_dir(&self.workdir);
        let output = run_command_with_timeout(cmd, self.timeout, self.output_limit_bytes)?;

        if !output.success() {
            bail!(
                "command failed ({}):\n{}",
                output.describe_exit(self.timeout),
                output.combined()
            );
        }
        Ok(output.combined())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn terminal(workdir: &std::path::Path) -> Terminal {
        Terminal::new(&ToolsConfig {
            workdir: workdir.to_path_buf(),
            command_timeout_secs: 10,
            ..ToolsConfig::default()
        })
    }

    #[test]
    fn runs_in_workdir() {
        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::write(temp.path().join("marker.txt"), "").expect("write");

        let output = terminal(temp.path())
            .invoke(&json!({"command": "ls"}))
            .expect("ls");
        assert!(output.contains("marker.txt"));
    }

    #[test]
    fn silent_success_is_empty() {
        let temp = tempfile::tempdir().expect("tempdir");
        let output = terminal(temp.path())
            .invoke(&json!({"command": "true"}))
            .expect("true");
        assert_eq!(output, "");
    }

    #[test]
    fn failure_carries_output() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = terminal(temp.path())
            .invoke(&json!({"command": "echo broken >&2; exit 2"}))
            .expect_err("exit 2");
        let message = err.to_string();
        assert!(message.contains("exit status 2"));
        assert!(message.contains("broken"));
    }
}
