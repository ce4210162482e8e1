use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, error, info};

use super::record_format;
use super::storage_trait::{RecordSink, RecordSource};
use crate::error_handling::types::StorageError;
use crate::protocol::record::Record;

/// Append-only record file written during capture.
pub struct FileRecordSink {
    path: PathBuf,
    writer: BufWriter<File>,
    records: u64,
}

impl FileRecordSink {
    /// Creates `path`, truncating a previous capture.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| {
                error!("Failed to create record file {}: {}", path.display(), e);
                StorageError::Io(e)
            })?;
        info!("Writing records to {}", path.display());
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            records: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records_written(&self) -> u64 {
        self.records
    }
}

impl RecordSink for FileRecordSink {
    fn append_record(&mut self, record: &Record) -> Result<(), StorageError> {
        record_format::write_record(&mut self.writer, record).map_err(|e| {
            error!("Write failed {}: {}", self.path.display(), e);
            e
        })?;
        self.records += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StorageError> {
        self.writer.flush().map_err(|e| {
            error!("Flush failed {}: {}", self.path.display(), e);
            StorageError::Io(e)
        })?;
        debug!("Flushed {} record(s) to {}", self.records, self.path.display());
        Ok(())
    }
}

impl Drop for FileRecordSink {
    fn drop(&mut self) {
        if let Err(e) = self.writer.flush() {
            error!("Failed to flush {} on close: {}", self.path.display(), e);
        }
    }
}

/// Sequential reader over a persisted record file.
pub struct FileRecordSource {
    path: PathBuf,
    reader: BufReader<File>,
    offset: u64,
}

impl FileRecordSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| {
            error!("Failed to open record file {}: {}", path.display(), e);
            StorageError::Io(e)
        })?;
        info!("Reading records from {}", path.display());
        Ok(Self {
            path,
            reader: BufReader::new(file),
            offset: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSource for FileRecordSource {
    fn next_record(&mut self) -> Result<Option<Record>, StorageError> {
        let record = record_format::read_record(&mut self.reader, self.offset).map_err(|e| {
            error!("Read failed {}: {}", self.path.display(), e);
            e
        })?;
        if let Some(ref record) = record {
            self.offset += record_format::encoded_len(record);
        } else {
            debug!("End of {} after {} byte(s)", self.path.display(), self.offset);
        }
        Ok(record)
    }
}
