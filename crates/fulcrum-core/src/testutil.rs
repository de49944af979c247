//! Test utilities: mock implementations of the core traits.
//!
//! Handwritten mocks for dependency injection in unit tests. Shared state
//! sits behind `Arc<Mutex<_>>` so a clone handed to the code under test can
//! still be inspected afterwards.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::SyncError;
use crate::models::Record;
use crate::target::{PageEnvelope, SyncTarget};
use crate::throttle::{Throttle, ThrottleConfig};
use crate::traits::{CheckpointStore, PageFetcher, RecordSink};

pub fn no_throttle() -> Throttle {
    Throttle::new(ThrottleConfig::new(Duration::ZERO))
}

pub fn envelope(data: serde_json::Value, next: &str, has_next: bool) -> PageEnvelope {
    PageEnvelope {
        data,
        next: next.to_string(),
        has_next,
    }
}

/// A page of stage records; `hasNext` is true whenever `next` is non-empty.
pub fn stage_page(ids: &[&str], next: &str) -> PageEnvelope {
    let data = ids
        .iter()
        .map(|id| serde_json::json!({"id": id, "text": format!("stage {id}")}))
        .collect();
    envelope(serde_json::Value::Array(data), next, !next.is_empty())
}

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// A request observed by [`MockFetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenRequest {
    pub parent_key: Option<String>,
    pub offset: String,
}

/// Mock fetcher serving queued pages per parent key.
#[derive(Clone, Default)]
pub struct MockFetcher {
    pages: Arc<Mutex<HashMap<Option<String>, VecDeque<Result<PageEnvelope, SyncError>>>>>,
    requests: Arc<Mutex<Vec<SeenRequest>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue pages for `key` (`None` for a direct collection).
    pub fn with_pages(
        self,
        key: Option<&str>,
        pages: Vec<Result<PageEnvelope, SyncError>>,
    ) -> Self {
        self.pages
            .lock()
            .unwrap()
            .entry(key.map(str::to_string))
            .or_default()
            .extend(pages);
        self
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Parent keys in the order they were first requested.
    pub fn requested_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for req in self.requests() {
            if let Some(key) = req.parent_key {
                if keys.last() != Some(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }
}

impl PageFetcher for MockFetcher {
    async fn fetch_page(&self, target: &mut SyncTarget) -> Result<PageEnvelope, SyncError> {
        self.requests.lock().unwrap().push(SeenRequest {
            parent_key: target.parent_key.clone(),
            offset: target.cursor.next.clone(),
        });

        let next = self
            .pages
            .lock()
            .unwrap()
            .get_mut(&target.parent_key)
            .and_then(VecDeque::pop_front);

        let page = next.unwrap_or_else(|| {
            Err(SyncError::TransportError(format!(
                "no mock page queued for {:?}",
                target.parent_key
            )))
        })?;
        target.advance(&page);
        Ok(page)
    }
}

// ---------------------------------------------------------------------------
// VecSink
// ---------------------------------------------------------------------------

/// Sink that keeps every record in memory.
#[derive(Debug, Default)]
pub struct VecSink {
    pub records: Vec<Record>,
    pub flushes: usize,
    fail: bool,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every emit fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Ids of the emitted stage records, in emit order.
    pub fn ids(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| match r {
                Record::Stage(s) => s.id.clone(),
                other => panic!("expected stage records, got {other:?}"),
            })
            .collect()
    }
}

impl RecordSink for VecSink {
    fn emit(&mut self, record: &Record) -> Result<(), SyncError> {
        if self.fail {
            return Err(SyncError::OutputError("sink closed".into()));
        }
        self.records.push(record.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SyncError> {
        self.flushes += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryCheckpointStore
// ---------------------------------------------------------------------------

/// In-memory checkpoint record with a log of every save.
#[derive(Clone, Default)]
pub struct MemoryCheckpointStore {
    value: Arc<Mutex<Option<String>>>,
    pub saves: Arc<Mutex<Vec<String>>>,
    fail_save: bool,
    fail_load: bool,
}

impl MemoryCheckpointStore {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str) -> Self {
        Self {
            value: Arc::new(Mutex::new(Some(key.to_string()))),
            ..Self::default()
        }
    }

    pub fn failing_save() -> Self {
        Self {
            fail_save: true,
            ..Self::default()
        }
    }

    pub fn failing_load() -> Self {
        Self {
            fail_load: true,
            ..Self::default()
        }
    }

    pub fn value(&self) -> Option<String> {
        self.value.lock().unwrap().clone()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn load(&self) -> Result<Option<String>, SyncError> {
        if self.fail_load {
            return Err(SyncError::PersistenceError("permission denied".into()));
        }
        Ok(self.value().filter(|v| !v.is_empty()))
    }

    fn save(&self, key: &str) -> Result<(), SyncError> {
        if self.fail_save {
            return Err(SyncError::PersistenceError("disk full".into()));
        }
        *self.value.lock().unwrap() = Some(key.to_string());
        self.saves.lock().unwrap().push(key.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), SyncError> {
        *self.value.lock().unwrap() = None;
        Ok(())
    }
}
