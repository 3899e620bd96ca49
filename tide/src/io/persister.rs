//! Background history persistence with an explicit flush.

use std::thread::{self, JoinHandle};

use anyhow::{Result, anyhow};
use tracing::{debug, warn};

use crate::core::types::Turn;
use crate::io::history::HistoryStore;

/// Writes transcript snapshots on a background thread.
///
/// At most one save is in flight. Scheduling a new one joins the previous
/// save first, so snapshots land on disk in the order they were taken.
#[derive(Debug, Default)]
pub struct Persister {
    pending: Option<JoinHandle<Result<()>>>,
}

impl Persister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start saving `snapshot` to `store` without waiting for it.
    pub fn schedule(&mut self, store: HistoryStore, snapshot: Vec<Turn>) {
        if let Err(err) = self.flush() {
            warn!(err = %format!("{err:#}"), "previous background save failed");
        }
        debug!(turns = snapshot.len(), path = %store.path().display(), "scheduling background save");
        self.pending = Some(thread::spawn(move || store.save(&snapshot)));
    }

    /// True while a scheduled save has not been joined yet.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Wait for the outstanding save, if any, and return its result.
    pub fn flush(&mut self) -> Result<()> {
        let Some(handle) = self.pending.take() else {
            return Ok(());
        };
        match handle.join() {
            Ok(result) => result,
            Err(_) => Err(anyhow!("background save thread panicked")),
        }
    }
}

impl Drop for Persister {
    fn drop(&mut self) {
        if let Err(err) = self.flush() {
            warn!(err = %format!("{err:#}"), "background save failed during shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flush_waits_for_the_save() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = HistoryStore::new(temp.path().join("history.json"));
        let mut persister = Persister::new();

        persister.schedule(store.clone(), vec![Turn::user("hello")]);
        assert!(persister.is_pending());
        persister.flush().expect("flush");
        assert!(!persister.is_pending());

        assert_eq!(store.load().expect("load").len(), 1);
    }

    #[test]
    fn later_snapshot_wins() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = HistoryStore::new(temp.path().join("history.json"));
        let mut persister = Persister::new();

        persister.schedule(store.clone(), vec![Turn::user("one")]);
        persister.schedule(
            store.clone(),
            vec![Turn::user("one"), Turn::assistant("two")],
        );
        persister.flush().expect("flush");

        assert_eq!(store.load().expect("load").len(), 2);
    }

    #[test]
    fn flush_reports_save_errors() {
        let temp = tempfile::tempdir().expect("tempdir");
        // A directory in the way of the snapshot makes the rename fail.
        let path = temp.path().join("history.json");
        std::fs::create_dir_all(path.join("occupied")).expect("mkdir");
        let mut persister = Persister::new();

        persister.schedule(HistoryStore::new(&path), vec![Turn::user("x")]);
        assert!(persister.flush().is_err());
        assert!(persister.flush().is_ok());
    }
}
