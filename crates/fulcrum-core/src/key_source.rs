//! Parent keys for list-driven endpoints, read from a CSV file.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::error::SyncError;

/// Yields the first field of every row, in file order.
///
/// There is no header row. An empty source, a malformed row or a row with an
/// empty first field ends the iteration with a configuration error.
pub struct CsvKeySource<R: Read> {
    reader: csv::Reader<R>,
    row: StringRecord,
    rows_read: u64,
    done: bool,
}

impl CsvKeySource<File> {
    pub fn open(path: &Path) -> Result<Self, SyncError> {
        let file = File::open(path).map_err(|e| {
            SyncError::ConfigError(format!("cannot open key source {}: {e}", path.display()))
        })?;
        Ok(Self::from_reader(file))
    }
}

impl<R: Read> CsvKeySource<R> {
    pub fn from_reader(reader: R) -> Self {
        let reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);
        Self {
            reader,
            row: StringRecord::new(),
            rows_read: 0,
            done: false,
        }
    }

    fn fail(&mut self, message: String) -> Option<Result<String, SyncError>> {
        self.done = true;
        Some(Err(SyncError::ConfigError(message)))
    }
}

impl<R: Read> Iterator for CsvKeySource<R> {
    type Item = Result<String, SyncError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.reader.read_record(&mut self.row) {
            Ok(true) => {
                self.rows_read += 1;
                match self.row.get(0).filter(|k| !k.is_empty()) {
                    Some(key) => Some(Ok(key.to_string())),
                    None => {
                        let row = self.rows_read;
                        self.fail(format!("key source row {row} has an empty first field"))
                    }
                }
            }
            Ok(false) => {
                self.done = true;
                if self.rows_read == 0 {
                    return self.fail("key source is empty".into());
                }
                None
            }
            Err(e) => {
                let row = self.rows_read + 1;
                self.fail(format!("key source row {row} is malformed: {e}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(input: &str) -> Vec<Result<String, SyncError>> {
        CsvKeySource::from_reader(input.as_bytes()).collect()
    }

    #[test]
    fn yields_first_field_in_order() {
        let out: Vec<String> = keys("c-1,Ada\nc-2,Grace,extra\nc-3\n")
            .into_iter()
            .map(Result::unwrap)
            .collect();
        assert_eq!(out, vec!["c-1", "c-2", "c-3"]);
    }

    #[test]
    fn trims_whitespace_around_keys() {
        let out: Vec<String> = keys(" c-1 , x\n").into_iter().map(Result::unwrap).collect();
        assert_eq!(out, vec!["c-1"]);
    }

    #[test]
    fn empty_source_is_config_error() {
        let out = keys("");
        assert_eq!(out.len(), 1);
        assert!(matches!(out[0], Err(SyncError::ConfigError(_))));
    }

    #[test]
    fn empty_first_field_stops_iteration() {
        let out = keys("c-1\n,orphan\nc-3\n");
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].as_ref().unwrap(), "c-1");
        assert!(matches!(out[1], Err(SyncError::ConfigError(_))));
    }

    #[test]
    fn invalid_utf8_is_config_error() {
        let bytes: &[u8] = b"c-1\n\xff\xfe\n";
        let out: Vec<_> = CsvKeySource::from_reader(bytes).collect();
        assert!(matches!(out.last(), Some(Err(SyncError::ConfigError(_)))));
    }

    #[test]
    fn missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CsvKeySource::open(&dir.path().join("nope.csv")).err().unwrap();
        assert!(matches!(err, SyncError::ConfigError(_)));
    }
}
