//! Record encoder, the inverse of the decoder.
//!
//! Frames are written `:` NN TT LL HH <payload pairs> CC in uppercase hex,
//! each byte through [`FlowController::write_data`].

use log::{debug, info, warn};
use uuid::Uuid;

use super::constants::{control_name, ACK, MARKER, NACK, STOP, XOFF, XON};
use super::hex;
use super::record::Record;
use crate::error_handling::types::SessionError;
use crate::transport::{ByteChannel, FlowController};

/// How the wait after a section-end record ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Ack,
    /// STOP, XON or XOFF: the wait is over without an acknowledgement.
    Control(u8),
    /// Any other byte, logged and accepted.
    Other(u8),
}

/// Build the wire frame for `record`.
pub fn encode_frame(record: &Record) -> Vec<u8> {
    let [low, high] = record.address().to_le_bytes();
    let mut frame = Vec::with_capacity(11 + 2 * record.payload().len());
    frame.push(MARKER);
    for field in [record.nbytes(), record.record_type(), low, high] {
        frame.extend_from_slice(&hex::encode_pair(field));
    }
    for &byte in record.payload() {
        frame.extend_from_slice(&hex::encode_pair(byte));
    }
    frame.extend_from_slice(&hex::encode_pair(record.checksum()));
    frame
}

pub struct RecordEncoder {
    session_id: Uuid,
}

impl RecordEncoder {
    pub fn new(session_id: Uuid) -> Self {
        Self { session_id }
    }

    /// Send one record frame. Waiting for the reply to a section-end
    /// record is left to [`RecordEncoder::await_reply`].
    pub fn write_frame<C: ByteChannel>(
        &self,
        flow: &mut FlowController<C>,
        record: &Record,
    ) -> Result<(), SessionError> {
        let frame = encode_frame(record);
        debug!(
            "[{}] sending record nbytes={} type={:#04x} address={:#06x}",
            self.session_id,
            record.nbytes(),
            record.record_type(),
            record.address()
        );
        for byte in frame {
            flow.write_data(byte)?;
        }
        Ok(())
    }

    /// Block for the peer's answer to a section-end record.
    ///
    /// NACK fails with `SessionError::PeerNack`; the caller's teardown is
    /// what sends STOP.
    pub fn await_reply<C: ByteChannel>(
        &self,
        flow: &mut FlowController<C>,
    ) -> Result<Reply, SessionError> {
        let byte = flow.read_reply()?;
        match byte {
            ACK => Ok(Reply::Ack),
            NACK => {
                info!("[{}] Transmission error, stopped", self.session_id);
                Err(SessionError::PeerNack)
            }
            STOP | XON | XOFF => {
                debug!(
                    "[{}] wait ended by {}",
                    self.session_id,
                    control_name(byte).unwrap_or("control byte")
                );
                Ok(Reply::Control(byte))
            }
            other => {
                warn!(
                    "[{}] unexpected reply {:#04x} to section end",
                    self.session_id, other
                );
                Ok(Reply::Other(other))
            }
        }
    }

    /// Send `record` and, for a section-end record, wait for the reply.
    pub fn write_record<C: ByteChannel>(
        &self,
        flow: &mut FlowController<C>,
        record: &Record,
    ) -> Result<Option<Reply>, SessionError> {
        self.write_frame(flow, record)?;
        if record.is_section_end() {
            return self.await_reply(flow).map(Some);
        }
        Ok(None)
    }
}
