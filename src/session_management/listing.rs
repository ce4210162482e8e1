//! Rendering of a persisted record stream for the `print` command.

use std::io::{self, Write};

use serde::Serialize;

use crate::error_handling::types::StorageError;
use crate::protocol::record::Record;
use crate::storage::RecordSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingFormat {
    Text,
    /// One JSON object per line.
    Json,
}

#[derive(Debug, Serialize)]
struct RecordLine {
    index: usize,
    kind: &'static str,
    address: u16,
    record_type: u8,
    nbytes: u8,
    category: Option<String>,
    payload: String,
    checksum: u8,
}

impl RecordLine {
    fn new(index: usize, record: &Record) -> Self {
        let kind = if record.is_section_end() {
            "section_end"
        } else if record.is_end_of_transfer() {
            "end_of_transfer"
        } else {
            "data"
        };
        Self {
            index,
            kind,
            address: record.address(),
            record_type: record.record_type(),
            nbytes: record.nbytes(),
            category: record.category().map(|c| c.to_string()),
            payload: hex_string(record.payload()),
            checksum: record.checksum(),
        }
    }
}

fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

/// Write every record of `source` to `out`, returning how many were
/// printed.
pub fn print_records<R: RecordSource, W: Write>(
    source: &mut R,
    out: &mut W,
    format: ListingFormat,
) -> Result<usize, StorageError> {
    let mut index = 0;
    while let Some(record) = source.next_record()? {
        let line = RecordLine::new(index, &record);
        match format {
            ListingFormat::Text => write_text(out, &line)?,
            ListingFormat::Json => {
                serde_json::to_writer(&mut *out, &line).map_err(io::Error::from)?;
                writeln!(out)?;
            }
        }
        index += 1;
    }
    out.flush()?;
    Ok(index)
}

fn write_text<W: Write>(out: &mut W, line: &RecordLine) -> io::Result<()> {
    write!(
        out,
        "{:5} {:04x} type={:02x} len={:3} cksum={:02x}",
        line.index, line.address, line.record_type, line.nbytes, line.checksum
    )?;
    match line.kind {
        "section_end" => write!(out, " <section end>")?,
        "end_of_transfer" => write!(out, " <end of transfer>")?,
        _ => {
            if let Some(ref category) = line.category {
                write!(out, " [{}]", category)?;
            }
            write!(out, " {}", line.payload)?;
        }
    }
    writeln!(out)
}
