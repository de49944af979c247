use std::future::Future;

use crate::error::SyncError;
use crate::models::Record;
use crate::target::{PageEnvelope, SyncTarget};

/// Fetches one page for a sync target.
///
/// Implementations must call [`SyncTarget::advance`] with the envelope before
/// returning it, so the caller's cursor always reflects the last page.
pub trait PageFetcher: Send + Sync {
    fn fetch_page(
        &self,
        target: &mut SyncTarget,
    ) -> impl Future<Output = Result<PageEnvelope, SyncError>> + Send;
}

/// Append-only destination for decoded records.
pub trait RecordSink {
    fn emit(&mut self, record: &Record) -> Result<(), SyncError>;

    /// Push buffered records to the underlying destination.
    fn flush(&mut self) -> Result<(), SyncError> {
        Ok(())
    }
}

/// Durable storage for the last fully processed key of one entity type.
pub trait CheckpointStore {
    /// Read the stored key. An absent or empty record is `None`.
    fn load(&self) -> Result<Option<String>, SyncError>;

    /// Replace the stored key.
    fn save(&self, key: &str) -> Result<(), SyncError>;

    /// Remove the stored key.
    fn clear(&self) -> Result<(), SyncError>;
}
