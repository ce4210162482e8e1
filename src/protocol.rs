//! The CASIO record-transfer protocol: control bytes, the ASCII-hex codec,
//! records and the frame decoder/encoder.

pub mod constants;
pub mod decoder;
pub mod encoder;
pub mod hex;
pub mod record;

pub use decoder::RecordDecoder;
pub use encoder::{encode_frame, RecordEncoder, Reply};
pub use record::{Category, Header, RawHeader, Record};
