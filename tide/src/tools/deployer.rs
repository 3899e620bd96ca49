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

/// Runs the configured deploy command inside a project directory.
#[derive(Debug, Clone)]
pub struct Deployer {
    workdir: PathBuf,
    command: Vec<String>,
    timeout: Duration,
    output_limit_bytes: usize,
}

#[derive(Debug, Deserialize)]
struct Args {
    project_path: String,
}

impl Deployer {
    pub fn new(config: &ToolsConfig) -> Self {
        Self {
            workdir: config.workdir.clone(),
            command: config.deploy_command.clone(),
            timeout: Duration::from_secs(config.command_timeout_secs),
            output_limit_bytes: config.output_limit_bytes,
        }
    }
}

impl Capability for Deployer {
    fn name(&self) -> &str {
        "deployer"
    }

    fn description(&self) -> &str {
        "Deploy a project to production (Vercel by default). Argument: 'project_path'."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_path": {"type": "string", "minLength": 1}
            },
            "required": ["project_path"]
        })
    }

    #[instrument(skip_all, fields(capability = "deployer"))]
    fn invoke(&self, arguments: &Value) -> Result<String> {
        let args: Args = super::parse_args(&self.schema(), arguments)?;
        let Some((program, rest)) = self.command.split_first() else {
            bail!("no deploy command configured");
        };
        let project = super::resolve(&self.workdir, &args.project_path);
        if !project.is_dir() {
            bail!("project path {} is not a directory", project.display());
        }
        info!(project = %project.display(), program = %program, "deploying project");

        let mut cmd = Command::new(program);
        cmd.args(rest).current_dir(&project);
        let output = run_command_with_timeout(cmd, self.timeout, self.output_limit_bytes)?;
        if !output.success() {
            bail!(
                "failed to deploy project ({}):\n{}",
                output.describe_exit(self.timeout),
                output.combined()
            );
        }
        Ok(format!("Project deployed successfully:\n{}", output.combined()))
    }
}
