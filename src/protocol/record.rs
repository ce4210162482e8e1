//! Record types carried by the protocol.

use std::fmt;

use super::constants::{END_OF_TRANSFER_ADDRESS, SECTION_END_ADDRESS};
use super::hex;

/// The five header fields exactly as they arrived: each field is the raw
/// pair of ASCII characters, high digit first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawHeader {
    pub marker: u8,
    pub nbytes: [u8; 2],
    pub record_type: [u8; 2],
    pub low: [u8; 2],
    pub high: [u8; 2],
}

impl RawHeader {
    /// Translate the ASCII fields into a [`Header`].
    ///
    /// The address is `high * 256 + low`. For records logically beyond
    /// offset 256 the device sends a stale high byte; the value is kept
    /// as received.
    pub fn decode(&self) -> Header {
        let nbytes = hex::decode_pair(self.nbytes[0], self.nbytes[1]);
        let record_type = hex::decode_pair(self.record_type[0], self.record_type[1]);
        let low = hex::decode_pair(self.low[0], self.low[1]);
        let high = hex::decode_pair(self.high[0], self.high[1]);
        Header {
            nbytes,
            record_type,
            address: u16::from(high) * 256 + u16::from(low),
        }
    }
}

/// Decoded record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub nbytes: u8,
    pub record_type: u8,
    pub address: u16,
}

impl Header {
    pub fn is_section_end(&self) -> bool {
        self.nbytes == 0 && self.address == SECTION_END_ADDRESS
    }

    pub fn is_end_of_transfer(&self) -> bool {
        self.nbytes == 0 && self.address == END_OF_TRANSFER_ADDRESS
    }
}

/// One framed transfer unit. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    nbytes: u8,
    record_type: u8,
    address: u16,
    payload: Vec<u8>,
    checksum: u8,
}

impl Record {
    /// Build a record from a decoded header.
    ///
    /// Returns `None` when `payload` does not hold exactly `header.nbytes`
    /// bytes.
    pub fn new(header: Header, payload: Vec<u8>, checksum: u8) -> Option<Self> {
        if payload.len() != usize::from(header.nbytes) {
            return None;
        }
        Some(Self {
            nbytes: header.nbytes,
            record_type: header.record_type,
            address: header.address,
            payload,
            checksum,
        })
    }

    /// Constructor for readers that have already read exactly
    /// `header.nbytes` payload bytes.
    pub(crate) fn from_decoded(header: Header, payload: Vec<u8>, checksum: u8) -> Self {
        debug_assert_eq!(payload.len(), usize::from(header.nbytes));
        Self {
            nbytes: header.nbytes,
            record_type: header.record_type,
            address: header.address,
            payload,
            checksum,
        }
    }

    /// Zero-length record closing a section.
    pub fn section_end(record_type: u8, checksum: u8) -> Self {
        Self {
            nbytes: 0,
            record_type,
            address: SECTION_END_ADDRESS,
            payload: Vec::new(),
            checksum,
        }
    }

    /// Zero-length record closing the transfer.
    pub fn end_of_transfer(record_type: u8, checksum: u8) -> Self {
        Self {
            nbytes: 0,
            record_type,
            address: END_OF_TRANSFER_ADDRESS,
            payload: Vec::new(),
            checksum,
        }
    }

    pub fn header(&self) -> Header {
        Header {
            nbytes: self.nbytes,
            record_type: self.record_type,
            address: self.address,
        }
    }

    pub fn nbytes(&self) -> u8 {
        self.nbytes
    }

    pub fn record_type(&self) -> u8 {
        self.record_type
    }

    pub fn address(&self) -> u16 {
        self.address
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Checksum as transmitted. It is never verified here.
    pub fn checksum(&self) -> u8 {
        self.checksum
    }

    pub fn is_section_end(&self) -> bool {
        self.header().is_section_end()
    }

    pub fn is_end_of_transfer(&self) -> bool {
        self.header().is_end_of_transfer()
    }

    /// Section category announced by a two-byte record, if this is one.
    pub fn category(&self) -> Option<Category> {
        if self.nbytes == 2 {
            self.payload.first().map(|&code| Category::from_code(code))
        } else {
            None
        }
    }
}

/// Organizer section announced at the start of a block of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Phone,
    Memo,
    Reminder,
    Schedule,
    Calendar,
    Unknown(u8),
}

impl Category {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x90 => Category::Phone,
            0xA0 => Category::Memo,
            0x91 => Category::Reminder,
            0xB0 => Category::Schedule,
            0x80 => Category::Calendar,
            other => Category::Unknown(other),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Phone => write!(f, "Phone"),
            Category::Memo => write!(f, "Memo"),
            Category::Reminder => write!(f, "Reminder"),
            Category::Schedule => write!(f, "Schedule"),
            Category::Calendar => write!(f, "Calendar"),
            Category::Unknown(code) => write!(f, "Section 0x{:02x}", code),
        }
    }
}
