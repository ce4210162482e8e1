//! Persisted record layout.
//!
//! Records are stored back to back with no file header:
//!
//! | field    | size          |
//! |----------|---------------|
//! | nbytes   | 1             |
//! | type     | 1             |
//! | address  | 2, little end |
//! | payload  | nbytes        |
//! | checksum | 1             |

use std::io::{ErrorKind, Read, Write};

use crate::error_handling::types::StorageError;
use crate::protocol::record::{Header, Record};

const HEADER_LEN: usize = 4;

/// Serialize `record` into its persisted form.
pub fn encode_record(record: &Record) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN + record.payload().len() + 1);
    buf.push(record.nbytes());
    buf.push(record.record_type());
    buf.extend_from_slice(&record.address().to_le_bytes());
    buf.extend_from_slice(record.payload());
    buf.push(record.checksum());
    buf
}

pub fn write_record<W: Write>(writer: &mut W, record: &Record) -> Result<(), StorageError> {
    writer.write_all(&encode_record(record))?;
    Ok(())
}

/// Read the record starting at `offset` bytes into the stream.
///
/// Returns `Ok(None)` on a clean end of input at a record boundary. Input
/// ending inside a record is `StorageError::Truncated`.
pub fn read_record<R: Read>(reader: &mut R, offset: u64) -> Result<Option<Record>, StorageError> {
    let mut head = [0u8; HEADER_LEN];
    let got = read_full(reader, &mut head)?;
    if got == 0 {
        return Ok(None);
    }
    if got < HEADER_LEN {
        return Err(StorageError::Truncated {
            offset,
            expected: HEADER_LEN,
            got,
        });
    }

    let header = Header {
        nbytes: head[0],
        record_type: head[1],
        address: u16::from_le_bytes([head[2], head[3]]),
    };
    // payload and the trailing checksum byte
    let mut body = vec![0u8; usize::from(header.nbytes) + 1];
    let got = read_full(reader, &mut body)?;
    if got < body.len() {
        return Err(StorageError::Truncated {
            offset,
            expected: HEADER_LEN + body.len(),
            got: HEADER_LEN + got,
        });
    }

    let checksum = body.pop().unwrap_or_default();
    Record::new(header, body, checksum)
        .map(Some)
        .ok_or_else(|| StorageError::InvalidRecord(format!("payload length mismatch at offset {}", offset)))
}

/// Persisted size of `record` in bytes.
pub fn encoded_len(record: &Record) -> u64 {
    (HEADER_LEN + record.payload().len() + 1) as u64
}

/// Fill `buf` as far as the input allows, returning how much was read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, StorageError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(StorageError::Io(e)),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn phone_record() -> Record {
        Record::new(
            Header {
                nbytes: 2,
                record_type: 0x90,
                address: 0x0100,
            },
            vec![0x90, 0x00],
            0x6E,
        )
        .unwrap()
    }

    #[test]
    fn test_layout_is_little_endian() {
        assert_eq!(
            encode_record(&phone_record()),
            vec![0x02, 0x90, 0x00, 0x01, 0x90, 0x00, 0x6E]
        );
        assert_eq!(
            encode_record(&Record::end_of_transfer(0x01, 0xFF)),
            vec![0x00, 0x01, 0x00, 0xFF, 0xFF]
        );
    }

    #[test]
    fn test_stream_reads_back_in_order() {
        let records = vec![
            phone_record(),
            Record::section_end(0x01, 0xFE),
            Record::end_of_transfer(0x01, 0xFF),
        ];
        let mut buf = Vec::new();
        for record in &records {
            write_record(&mut buf, record).unwrap();
        }

        let mut cursor = Cursor::new(buf);
        let mut offset = 0;
        let mut read_back = Vec::new();
        while let Some(record) = read_record(&mut cursor, offset).unwrap() {
            offset += encoded_len(&record);
            read_back.push(record);
        }
        assert_eq!(read_back, records);
    }

    #[test]
    fn test_truncated_header() {
        let mut cursor = Cursor::new(vec![0x02, 0x90]);
        let err = read_record(&mut cursor, 0).unwrap_err();
        assert!(matches!(
            err,
            StorageError::Truncated {
                offset: 0,
                expected: 4,
                got: 2
            }
        ));
    }

    #[test]
    fn test_truncated_payload() {
        let mut bytes = encode_record(&phone_record());
        bytes.pop();
        let err = read_record(&mut Cursor::new(bytes), 7).unwrap_err();
        assert!(matches!(
            err,
            StorageError::Truncated {
                offset: 7,
                expected: 7,
                got: 6
            }
        ));
    }
}
