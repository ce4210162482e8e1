//! Storage Traits
//!
//! `RecordSink` is where a capture session persists every record it
//! decodes; `RecordSource` is what a replay session draws records from.
//! Both are implemented by the file backend and, for tests and tooling,
//! by plain in-memory collections.

use std::collections::VecDeque;

use crate::error_handling::types::StorageError;
use crate::protocol::record::Record;

/// Append-only destination for captured records.
pub trait RecordSink {
    /// Persists one record after any previously appended ones.
    fn append_record(&mut self, record: &Record) -> Result<(), StorageError>;

    /// Pushes buffered records to the backing store.
    fn flush(&mut self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Sequential origin of records to replay.
pub trait RecordSource {
    /// Returns the next record, or `None` once the stream is exhausted.
    fn next_record(&mut self) -> Result<Option<Record>, StorageError>;
}

impl RecordSink for Vec<Record> {
    fn append_record(&mut self, record: &Record) -> Result<(), StorageError> {
        self.push(record.clone());
        Ok(())
    }
}

impl RecordSource for VecDeque<Record> {
    fn next_record(&mut self) -> Result<Option<Record>, StorageError> {
        Ok(self.pop_front())
    }
}

impl<S: RecordSink + ?Sized> RecordSink for &mut S {
    fn append_record(&mut self, record: &Record) -> Result<(), StorageError> {
        (**self).append_record(record)
    }

    fn flush(&mut self) -> Result<(), StorageError> {
        (**self).flush()
    }
}

impl<S: RecordSource + ?Sized> RecordSource for &mut S {
    fn next_record(&mut self) -> Result<Option<Record>, StorageError> {
        (**self).next_record()
    }
}
