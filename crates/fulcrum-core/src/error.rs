use thiserror::Error;

/// Error types for a Fulcrum sync run.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Connection, timeout or body-read failure before a status was usable.
    #[error("Transport error: {0}")]
    TransportError(String),

    /// The remote resource does not exist (HTTP 404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-2xx response.
    #[error("Unexpected HTTP {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// Response body or page payload did not have the expected shape.
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// The checkpoint record could not be read or written.
    #[error("Checkpoint persistence error: {0}")]
    PersistenceError(String),

    /// Unregistered endpoint, missing input, unknown entity tag and friends.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Writing a record to the output sink failed.
    #[error("Output error: {0}")]
    OutputError(String),
}

impl SyncError {
    /// Returns true if a list-driven run may skip the current key and carry on.
    ///
    /// Only a missing sub-resource qualifies; everything else aborts the run.
    pub fn is_recoverable_per_key(&self) -> bool {
        matches!(self, SyncError::NotFound(_))
    }
}
