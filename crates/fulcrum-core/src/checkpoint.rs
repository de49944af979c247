//! Resume support for list-driven syncs.
//!
//! The durable record is the last key whose sub-resource was fully drained.
//! On the next run every key up to and including that one is skipped, and
//! processing resumes with the key after it.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::SyncError;
use crate::traits::CheckpointStore;

/// One plain-text file per entity type holding exactly the last completed key.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<dir>/<entity>_candidate_id`
    pub fn for_entity(dir: &Path, entity: &str) -> Self {
        Self::new(dir.join(format!("{entity}_candidate_id")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create an empty record (and its directory) if none exists yet.
    pub fn ensure_exists(&self) -> Result<(), SyncError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error("create directory for", e))?;
        }
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error("create", e))?;
        Ok(())
    }

    fn io_error(&self, action: &str, e: std::io::Error) -> SyncError {
        SyncError::PersistenceError(format!("failed to {action} {}: {e}", self.path.display()))
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn load(&self) -> Result<Option<String>, SyncError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let key = content.trim_end_matches(['\r', '\n']);
                Ok((!key.is_empty()).then(|| key.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error("read", e)),
        }
    }

    /// Write to a sibling temp file, then rename over the record, so a crash
    /// never leaves a half-written key behind.
    fn save(&self, key: &str) -> Result<(), SyncError> {
        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);

        let mut file = fs::File::create(&tmp).map_err(|e| self.io_error("write", e))?;
        file.write_all(key.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| self.io_error("write", e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error("replace", e))?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SyncError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error("remove", e)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ResumeState {
    /// Durable record not read yet.
    Unloaded,
    /// Skipping keys until this one has gone by.
    Waiting(String),
    /// Past the checkpoint; every further key is processed.
    Reached,
}

/// Durable checkpoint plus the in-memory resume latch for one run.
#[derive(Debug)]
pub struct Checkpoint<S> {
    store: S,
    state: ResumeState,
    last_persisted: Option<String>,
}

impl<S: CheckpointStore> Checkpoint<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: ResumeState::Unloaded,
            last_persisted: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Whether `key` comes after the checkpoint and should be processed.
    ///
    /// The first call reads the durable record. With no record every key is
    /// processed. Otherwise keys return false up to and including the stored
    /// one, and true for every key after it, for the rest of the run.
    pub fn reached(&mut self, key: &str) -> Result<bool, SyncError> {
        if self.state == ResumeState::Unloaded {
            self.state = match self.store.load()? {
                None => ResumeState::Reached,
                Some(last) => {
                    tracing::info!(resume_after = %last, "Resuming from checkpoint");
                    ResumeState::Waiting(last)
                }
            };
        }

        if matches!(&self.state, ResumeState::Waiting(last) if last == key) {
            self.state = ResumeState::Reached;
            return Ok(false);
        }
        Ok(self.state == ResumeState::Reached)
    }

    /// The checkpointed key if the run has not passed it yet.
    pub fn pending_key(&self) -> Option<&str> {
        match &self.state {
            ResumeState::Waiting(key) => Some(key),
            _ => None,
        }
    }

    /// Durably record `key` as fully processed.
    pub fn persist(&mut self, key: &str) -> Result<(), SyncError> {
        self.store.save(key)?;
        tracing::debug!(%key, "Checkpointed");
        self.last_persisted = Some(key.to_string());
        Ok(())
    }

    /// The key most recently persisted in this run.
    pub fn last_persisted(&self) -> Option<&str> {
        self.last_persisted.as_deref()
    }

    /// Forget all progress so the next run starts from the first key.
    pub fn clear(&mut self) -> Result<(), SyncError> {
        self.store.clear()?;
        self.state = ResumeState::Unloaded;
        self.last_persisted = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MemoryCheckpointStore;

    fn walk(checkpoint: &mut Checkpoint<MemoryCheckpointStore>, keys: &[&str]) -> Vec<bool> {
        keys.iter().map(|k| checkpoint.reached(k).unwrap()).collect()
    }

    #[test]
    fn empty_record_reaches_first_key() {
        let mut cp = Checkpoint::new(MemoryCheckpointStore::empty());
        assert_eq!(walk(&mut cp, &["a", "b", "c"]), vec![true, true, true]);
    }

    #[test]
    fn skips_through_checkpointed_key() {
        let mut cp = Checkpoint::new(MemoryCheckpointStore::with_value("b"));
        assert_eq!(walk(&mut cp, &["a", "b", "c", "d"]), vec![false, false, true, true]);
        assert_eq!(cp.pending_key(), None);
    }

    #[test]
    fn latch_stays_set_when_key_repeats() {
        let mut cp = Checkpoint::new(MemoryCheckpointStore::with_value("a"));
        assert_eq!(walk(&mut cp, &["a", "b", "a", "c"]), vec![false, true, true, true]);
    }

    #[test]
    fn missing_checkpoint_key_skips_everything() {
        let mut cp = Checkpoint::new(MemoryCheckpointStore::with_value("zzz"));
        assert_eq!(walk(&mut cp, &["a", "b"]), vec![false, false]);
        assert_eq!(cp.pending_key(), Some("zzz"));
    }

    #[test]
    fn record_is_read_once() {
        let store = MemoryCheckpointStore::empty();
        let mut cp = Checkpoint::new(store.clone());
        assert!(cp.reached("a").unwrap());
        store.save("a").unwrap();
        // A later write does not re-arm the latch mid-run.
        assert!(cp.reached("b").unwrap());
    }

    #[test]
    fn load_failure_is_persistence_error() {
        let mut cp = Checkpoint::new(MemoryCheckpointStore::failing_load());
        assert!(matches!(cp.reached("a"), Err(SyncError::PersistenceError(_))));
    }

    #[test]
    fn persist_and_clear() {
        let store = MemoryCheckpointStore::empty();
        let mut cp = Checkpoint::new(store.clone());
        cp.persist("k1").unwrap();
        assert_eq!(store.value().as_deref(), Some("k1"));
        assert_eq!(cp.last_persisted(), Some("k1"));

        cp.clear().unwrap();
        assert_eq!(store.value(), None);
        assert_eq!(cp.last_persisted(), None);
        assert!(cp.reached("k0").unwrap());
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::for_entity(dir.path(), "interviews");
        assert_eq!(store.path(), dir.path().join("interviews_candidate_id"));

        assert_eq!(store.load().unwrap(), None);
        store.ensure_exists().unwrap();
        assert!(store.path().exists());
        assert_eq!(store.load().unwrap(), None);

        store.save("c-42").unwrap();
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "c-42");
        assert_eq!(store.load().unwrap().as_deref(), Some("c-42"));

        store.save("c-43").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("c-43"));

        store.clear().unwrap();
        assert!(!store.path().exists());
        store.clear().unwrap();
    }

    #[test]
    fn file_store_ignores_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::for_entity(dir.path(), "feedback");
        fs::write(store.path(), "c-7\n").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("c-7"));
    }

    #[test]
    fn ensure_exists_keeps_existing_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::for_entity(&dir.path().join("nested"), "resumes");
        store.ensure_exists().unwrap();
        store.save("c-1").unwrap();
        store.ensure_exists().unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("c-1"));
    }

    #[test]
    fn save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path().join("gone").join("users_candidate_id"));
        assert!(matches!(store.save("x"), Err(SyncError::PersistenceError(_))));
    }
}
