pub mod checkpoint;
pub mod decode;
pub mod endpoint;
pub mod error;
pub mod key_source;
pub mod models;
pub mod paginate;
pub mod sink;
pub mod sync;
pub mod target;
pub mod throttle;
pub mod traits;

#[cfg(test)]
pub(crate) mod testutil;

pub use checkpoint::{Checkpoint, FileCheckpointStore};
pub use decode::DecoderRegistry;
pub use endpoint::{EndpointDescriptor, EndpointRegistry, SyncMode};
pub use error::SyncError;
pub use key_source::CsvKeySource;
pub use models::Record;
pub use paginate::Paginator;
pub use sink::JsonLinesSink;
pub use sync::{SyncReport, SyncService};
pub use target::{QueryParams, SyncTarget};
pub use throttle::{Throttle, ThrottleConfig};
pub use traits::{CheckpointStore, PageFetcher, RecordSink};
