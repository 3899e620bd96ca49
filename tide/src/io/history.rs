//! Conversation history snapshots (`.tide/history.json`).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, instrument};

use crate::core::transcript::Transcript;
use crate::core::types::Turn;

/// Durable location of one orchestrator's transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot. A missing file is an empty transcript, not an error.
    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub fn load(&self) -> Result<Transcript> {
        if !self.path.exists() {
            debug!("no history snapshot, starting empty");
            return Ok(Transcript::new());
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("read history {}", self.path.display()))?;
        let turns: Vec<Turn> = serde_json::from_str(&contents)
            .with_context(|| format!("parse history {}", self.path.display()))?;
        let transcript = Transcript::from_turns(turns)
            .with_context(|| format!("validate history {}", self.path.display()))?;
        debug!(turns = transcript.len(), "history loaded");
        Ok(transcript)
    }

    /// Atomically replace the snapshot with `turns` (temp file + rename).
    #[instrument(skip_all, fields(path = %self.path.display(), turns = turns.len()))]
    pub fn save(&self, turns: &[Turn]) -> Result<()> {
        let mut buf = serde_json::to_string_pretty(turns).context("serialize history")?;
        buf.push('\n');
        super::write_atomic(&self.path, &buf)?;
        debug!("history saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Invocation;
    use serde_json::json;

    fn exchange() -> Vec<Turn> {
        let invocation = Invocation {
            id: "call_1".to_string(),
            capability: "code_writer".to_string(),
            arguments: json!({"dir_path": ".", "file_name": "a.txt", "code": "a"}),
        };
        vec![
            Turn::user("write a"),
            Turn::assistant_with_invocations("", vec![invocation.clone()]),
            Turn::tool_result(&invocation, "Successfully wrote code to ./a.txt"),
            Turn::assistant("done"),
        ]
    }

    #[test]
    fn save_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = HistoryStore::new(temp.path().join("nested/history.json"));

        store.save(&exchange()).expect("save");
        let loaded = store.load().expect("load");
        assert_eq!(loaded.turns(), exchange().as_slice());
    }

    #[test]
    fn missing_snapshot_loads_empty() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = HistoryStore::new(temp.path().join("history.json"));
        assert!(store.load().expect("load").is_empty());
    }

    #[test]
    fn save_leaves_no_temp_file_behind() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = HistoryStore::new(temp.path().join("history.json"));
        store.save(&exchange()).expect("first save");
        store.save(&exchange()[..1]).expect("second save");

        let names: Vec<String> = fs::read_dir(temp.path())
            .expect("read dir")
            .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["history.json"]);
        assert_eq!(store.load().expect("load").len(), 1);
    }

    #[test]
    fn corrupt_snapshot_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("history.json");
        fs::write(&path, "[{\"role\": \"wizard\"}]").expect("write");

        let err = HistoryStore::new(&path).load().expect_err("bad role");
        assert!(format!("{err:#}").contains("parse history"));
    }
}
