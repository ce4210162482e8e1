//! Storage subsystem
//!
//! Persisted record streams and the sink/source seams the sessions write
//! to and read from.
//!
//! Components:
//! - `record_format`: the binary layout of one persisted record.
//! - `storage_trait`: the `RecordSink` and `RecordSource` traits plus
//!   in-memory implementations.
//! - `file_storage`: append-only file sink and sequential file source.

pub mod file_storage;
pub mod record_format;
pub mod storage_trait;

pub use file_storage::{FileRecordSink, FileRecordSource};
pub use storage_trait::{RecordSink, RecordSource};
