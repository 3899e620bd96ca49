use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::core::capability::Capability;

/// Writes a whole file, creating its directory if needed.
#[derive(Debug, Clone)]
pub struct CodeWriter {
    workdir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct Args {
    dir_path: String,
    file_name: String,
    code: String,
}

impl CodeWriter {
    pub fn new(workdir: &Path) -> Self {
        Self {
            workdir: workdir.to_path_buf(),
        }
    }
}

impl Capability for CodeWriter {
    fn name(&self) -> &str {
        "code_writer"
    }

    fn description(&self) -> &str {
        "Write code to a file, replacing any existing content. Arguments: 'dir_path', 'file_name' and 'code'."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "dir_path": {"type": "string", "description": "Directory to write into."},
                "file_name": {"type": "string", "minLength": 1, "description": "File name inside dir_path."},
                "code": {"type": "string", "description": "Full file content."}
            },
            "required": ["dir_path", "file_name", "code"]
        })
    }

    #[instrument(skip_all, fields(capability = "code_writer"))]
    fn invoke(&self, arguments: &Value) -> Result<String> {
        let args: Args = super::parse_args(&self.schema(), arguments)?;
        let dir = super::resolve(&self.workdir, &args.dir_path);
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        let path = dir.join(&args.file_name);
        fs::write(&path, &args.code).with_context(|| format!("write {}", path.display()))?;
        debug!(path = %path.display(), bytes = args.code.len(), "file written");
        Ok(format!("Successfully wrote code to {}", path.display()))
    }
}
