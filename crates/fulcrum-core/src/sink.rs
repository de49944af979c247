use std::io::{BufWriter, Write};

use crate::error::SyncError;
use crate::models::Record;
use crate::traits::RecordSink;

/// Writes one JSON object per line.
pub struct JsonLinesSink<W: Write> {
    writer: BufWriter<W>,
    written: u64,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            written: 0,
        }
    }

    /// Records emitted so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(self) -> Result<W, SyncError> {
        self.writer
            .into_inner()
            .map_err(|e| SyncError::OutputError(e.error().to_string()))
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn emit(&mut self, record: &Record) -> Result<(), SyncError> {
        serde_json::to_writer(&mut self.writer, record)
            .map_err(|e| SyncError::OutputError(e.to_string()))?;
        self.writer
            .write_all(b"\n")
            .map_err(|e| SyncError::OutputError(e.to_string()))?;
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SyncError> {
        self.writer
            .flush()
            .map_err(|e| SyncError::OutputError(e.to_string()))
    }
}
