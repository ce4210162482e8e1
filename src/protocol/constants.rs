//! Control bytes of the CASIO record-transfer protocol.
//!
//! Apart from CR and LF these carry device-specific meanings and must not
//! be read as standard ASCII control codes.

/// Carriage return, first half of the peer's start-of-exchange pair
pub const CR: u8 = 0x0D;

/// Line feed, second half of the peer's start-of-exchange pair
pub const LF: u8 = 0x0A;

/// Opens every record frame
pub const MARKER: u8 = b':';

/// Resume sending
pub const XON: u8 = 0x11;

/// Pause sending
pub const XOFF: u8 = 0x13;

/// Continue transfer
pub const ACK: u8 = 0x23;

/// Transmission error
pub const NACK: u8 = 0x3F;

/// Abort or end the session
pub const STOP: u8 = 0x21;

/// Address carried by a zero-length record closing a section.
pub const SECTION_END_ADDRESS: u16 = 0x0100;

/// Address carried by the zero-length record closing the whole transfer.
pub const END_OF_TRANSFER_ADDRESS: u16 = 0xFF00;

/// Human readable name of a control byte, for log lines.
pub fn control_name(byte: u8) -> Option<&'static str> {
    match byte {
        CR => Some("CR"),
        LF => Some("LF"),
        XON => Some("XON"),
        XOFF => Some("XOFF"),
        ACK => Some("ACK"),
        NACK => Some("NACK"),
        STOP => Some("STOP"),
        _ => None,
    }
}
