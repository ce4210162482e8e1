//! Record decoder.
//!
//! Turns a `:`-delimited ASCII-hex frame read through the
//! [`FlowController`] into a [`Record`]. The phases run strictly in order:
//!
//! 1. wait for the marker, nudging a paused peer with XON on CR LF
//! 2. read the four header fields (nbytes, type, low, high)
//! 3. acknowledge a section-end header immediately
//! 4. read `nbytes` payload pairs
//! 5. read the checksum pair (kept, never verified)

use log::{debug, trace};
use uuid::Uuid;

use super::constants::{ACK, CR, LF, MARKER, XON};
use super::hex;
use super::record::{Header, RawHeader, Record};
use crate::error_handling::types::TransportError;
use crate::transport::{ByteChannel, FlowController};

pub struct RecordDecoder {
    session_id: Uuid,
}

impl RecordDecoder {
    pub fn new(session_id: Uuid) -> Self {
        Self { session_id }
    }

    /// Decode one complete record.
    pub fn read_record<C: ByteChannel>(
        &self,
        flow: &mut FlowController<C>,
    ) -> Result<Record, TransportError> {
        let header = self.read_header(flow)?;
        self.read_body(flow, header)
    }

    /// Wait for the marker and read the header fields.
    ///
    /// A section-end header is acknowledged with exactly one ACK before
    /// this returns.
    pub fn read_header<C: ByteChannel>(
        &self,
        flow: &mut FlowController<C>,
    ) -> Result<Header, TransportError> {
        let marker = self.wait_for_marker(flow)?;
        let raw = RawHeader {
            marker,
            nbytes: read_pair(flow)?,
            record_type: read_pair(flow)?,
            low: read_pair(flow)?,
            high: read_pair(flow)?,
        };
        let header = raw.decode();
        debug!(
            "[{}] header nbytes={} type={:#04x} address={:#06x}",
            self.session_id, header.nbytes, header.record_type, header.address
        );

        if header.is_section_end() {
            debug!("[{}] section end, sending ACK", self.session_id);
            flow.write_control(ACK)?;
        }
        Ok(header)
    }

    /// Read the payload and checksum announced by `header`.
    pub fn read_body<C: ByteChannel>(
        &self,
        flow: &mut FlowController<C>,
        header: Header,
    ) -> Result<Record, TransportError> {
        let mut payload = Vec::with_capacity(usize::from(header.nbytes));
        for _ in 0..header.nbytes {
            let [high, low] = read_pair(flow)?;
            payload.push(hex::decode_pair(high, low));
        }
        let [high, low] = read_pair(flow)?;
        let checksum = hex::decode_pair(high, low);
        trace!(
            "[{}] payload {:02x?} checksum {:#04x}",
            self.session_id,
            payload,
            checksum
        );
        Ok(Record::from_decoded(header, payload, checksum))
    }

    /// Discard bytes until the record marker.
    ///
    /// A CR immediately followed by LF is the peer's idle prompt: one XON is
    /// sent to wake a paused peer and scanning goes on.
    fn wait_for_marker<C: ByteChannel>(
        &self,
        flow: &mut FlowController<C>,
    ) -> Result<u8, TransportError> {
        trace!("[{}] waiting for a record marker", self.session_id);
        let mut after_cr = false;
        loop {
            let byte = flow.read_data()?;
            if byte == MARKER {
                return Ok(byte);
            }
            if after_cr && byte == LF {
                debug!("[{}] idle prompt from peer, sending XON", self.session_id);
                flow.write_control(XON)?;
            }
            after_cr = byte == CR;
        }
    }
}

fn read_pair<C: ByteChannel>(flow: &mut FlowController<C>) -> Result<[u8; 2], TransportError> {
    Ok([flow.read_data()?, flow.read_data()?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::STOP;
    use crate::protocol::record::Category;
    use crate::transport::{ChannelEvent, MemoryChannel, StopSignal, Transport, TransportTiming};
    use std::time::Duration;

    fn controller(channel: MemoryChannel) -> FlowController<MemoryChannel> {
        let timing = TransportTiming {
            inactivity_timeout: Duration::from_millis(50),
            poll_interval: Duration::from_millis(5),
            write_pacing: Duration::ZERO,
        };
        FlowController::new(Transport::new(channel, timing, StopSignal::new()))
    }

    #[test]
    fn test_decodes_phone_section_record() {
        let mut flow = controller(MemoryChannel::with_incoming(b"noise:0290000190006E"));
        let record = RecordDecoder::new(Uuid::new_v4())
            .read_record(&mut flow)
            .unwrap();
        assert_eq!(record.nbytes(), 2);
        assert_eq!(record.record_type(), 0x90);
        assert_eq!(record.address(), 0x0100);
        assert_eq!(record.payload(), &[0x90, 0x00]);
        assert_eq!(record.checksum(), 0x6E);
        assert_eq!(record.category(), Some(Category::Phone));
    }

    #[test]
    fn test_checksum_is_carried_not_verified() {
        let mut flow = controller(MemoryChannel::with_incoming(b":01000000AB00"));
        let record = RecordDecoder::new(Uuid::new_v4())
            .read_record(&mut flow)
            .unwrap();
        assert_eq!(record.payload(), &[0xAB]);
        assert_eq!(record.checksum(), 0x00);
    }

    #[test]
    fn test_section_end_sends_one_ack_before_checksum() {
        let channel = MemoryChannel::with_incoming(b":00010001FE");
        let handle = channel.clone();
        let mut flow = controller(channel);

        let record = RecordDecoder::new(Uuid::new_v4())
            .read_record(&mut flow)
            .unwrap();
        assert!(record.is_section_end());
        assert_eq!(handle.written(), vec![ACK]);

        let events = handle.events();
        let ack = events
            .iter()
            .position(|e| *e == ChannelEvent::Write(ACK))
            .unwrap();
        // marker + 8 header digits precede the ACK, the checksum follows it
        assert_eq!(ack, 9);
        assert_eq!(events.len(), 12);
    }

    #[test]
    fn test_end_of_transfer_is_not_acknowledged() {
        let channel = MemoryChannel::with_incoming(b":000100FFFF");
        let handle = channel.clone();
        let mut flow = controller(channel);

        let record = RecordDecoder::new(Uuid::new_v4())
            .read_record(&mut flow)
            .unwrap();
        assert!(record.is_end_of_transfer());
        assert!(handle.written().is_empty());
    }

    #[test]
    fn test_idle_prompt_nudges_with_xon() {
        let channel = MemoryChannel::with_incoming(b"\r\n\rx\n:0000000000");
        let handle = channel.clone();
        let mut flow = controller(channel);

        RecordDecoder::new(Uuid::new_v4())
            .read_record(&mut flow)
            .unwrap();
        assert_eq!(handle.written(), vec![XON]);
    }

    #[test]
    fn test_non_hex_fields_decode_to_zero() {
        let mut flow = controller(MemoryChannel::with_incoming(b":0zq?0x0g00"));
        let record = RecordDecoder::new(Uuid::new_v4())
            .read_record(&mut flow)
            .unwrap();
        assert_eq!(record.nbytes(), 0);
        assert_eq!(record.record_type(), 0);
        assert_eq!(record.address(), 0);
        assert_eq!(record.checksum(), 0);
    }

    #[test]
    fn test_stop_while_waiting_for_marker_is_fatal() {
        let mut flow = controller(MemoryChannel::with_incoming(&[b'x', STOP, b':']));
        let err = RecordDecoder::new(Uuid::new_v4())
            .read_record(&mut flow)
            .unwrap_err();
        assert!(matches!(err, TransportError::PeerStop));
        assert!(flow.stop_signal().is_set());
    }

    #[test]
    fn test_external_stop_while_waiting_for_marker_is_fatal() {
        let mut flow = controller(MemoryChannel::with_incoming(b"xyz"));
        flow.stop_signal().set();
        let err = RecordDecoder::new(Uuid::new_v4())
            .read_record(&mut flow)
            .unwrap_err();
        assert!(matches!(err, TransportError::Stopped));
    }

    #[test]
    fn test_truncated_frame_times_out() {
        let mut flow = controller(MemoryChannel::with_incoming(b":0290"));
        let err = RecordDecoder::new(Uuid::new_v4())
            .read_record(&mut flow)
            .unwrap_err();
        assert!(matches!(err, TransportError::Timeout));
    }
}
