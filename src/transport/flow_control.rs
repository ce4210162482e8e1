//! XON/XOFF software handshake.
//!
//! The [`FlowController`] owns the [`Transport`] for the whole session.
//! Data bytes are only written while the peer is not signalling XOFF;
//! control bytes (XON, ACK, STOP) bypass the gate.

use std::time::Duration;

use log::{debug, info, warn};

use super::byte_transport::{ReadMode, Transport};
use super::channel::ByteChannel;
use super::stop_signal::StopSignal;
use crate::error_handling::types::TransportError;
use crate::protocol::constants::{STOP, XOFF, XON};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Xon,
    Xoff,
}

pub struct FlowController<C> {
    transport: Transport<C>,
    state: FlowState,
    pacing: Duration,
}

impl<C: ByteChannel> FlowController<C> {
    /// Wrap `transport`. The peer starts out paused: nothing is sent until
    /// it has announced XON.
    pub fn new(transport: Transport<C>) -> Self {
        let pacing = transport.timing().write_pacing;
        Self {
            transport,
            state: FlowState::Xoff,
            pacing,
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn transport(&self) -> &Transport<C> {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut Transport<C> {
        &mut self.transport
    }

    pub fn stop_signal(&self) -> &StopSignal {
        self.transport.stop_signal()
    }

    /// Blocking read of the next data byte.
    ///
    /// XON and XOFF update the flow state and are consumed. STOP raises the
    /// stop signal and fails with `TransportError::PeerStop`.
    pub fn read_data(&mut self) -> Result<u8, TransportError> {
        loop {
            let byte = self.transport.read_byte(ReadMode::Wait)?;
            match byte {
                XON | XOFF => self.observe(byte),
                STOP => return Err(self.peer_stop()),
                _ => return Ok(byte),
            }
        }
    }

    /// Blocking read of a raw reply byte. Control bytes still update the
    /// flow state (and STOP the stop signal) but are handed to the caller.
    pub fn read_reply(&mut self) -> Result<u8, TransportError> {
        let byte = self.transport.read_byte(ReadMode::Wait)?;
        if byte == STOP {
            info!("peer sent STOP");
            self.transport.stop_signal().set();
        } else {
            self.observe(byte);
        }
        Ok(byte)
    }

    /// Write a data byte, honouring the peer's XOFF.
    ///
    /// A non-blocking probe runs first. XOFF pauses until XON arrives;
    /// any byte that is not a flow-control byte is pushed back for the
    /// next read.
    pub fn write_data(&mut self, byte: u8) -> Result<(), TransportError> {
        if self.transport.stop_signal().is_set() {
            return Err(TransportError::Stopped);
        }

        match self.transport.read_byte(ReadMode::NoWait) {
            Ok(STOP) => return Err(self.peer_stop()),
            Ok(probed @ (XON | XOFF)) => self.observe(probed),
            Ok(probed) => self.transport.push_back(probed),
            Err(e) if e.is_routine() => {}
            Err(e) => return Err(e),
        }

        self.wait_for_xon()?;
        self.transport.write_byte(byte)?;
        if !self.pacing.is_zero() {
            std::thread::sleep(self.pacing);
        }
        Ok(())
    }

    /// Write a control byte without waiting on the flow state.
    pub fn write_control(&mut self, byte: u8) -> Result<(), TransportError> {
        self.transport.write_byte(byte)
    }

    /// Block until the peer is in the XON state.
    ///
    /// The first byte other than XON, XOFF and STOP received while paused
    /// is held and pushed back once XON arrives, so a reply seen during
    /// the pause is still returned by the next read. Later ones are
    /// discarded.
    pub fn wait_for_xon(&mut self) -> Result<(), TransportError> {
        if self.state == FlowState::Xoff {
            debug!("peer paused, waiting for XON");
        }
        let mut held: Option<u8> = None;
        while self.state == FlowState::Xoff {
            match self.transport.read_byte(ReadMode::Wait)? {
                STOP => return Err(self.peer_stop()),
                byte @ (XON | XOFF) => self.observe(byte),
                other if held.is_none() => held = Some(other),
                other => warn!("discarding {:#04x} received while paused", other),
            }
        }
        if let Some(byte) = held {
            self.transport.push_back(byte);
        }
        Ok(())
    }

    fn observe(&mut self, byte: u8) {
        let next = match byte {
            XON => FlowState::Xon,
            XOFF => FlowState::Xoff,
            _ => return,
        };
        if next != self.state {
            debug!("flow state {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    fn peer_stop(&mut self) -> TransportError {
        info!("peer sent STOP");
        self.transport.stop_signal().set();
        TransportError::PeerStop
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::ACK;
    use crate::transport::byte_transport::TransportTiming;
    use crate::transport::memory::{ChannelEvent, MemoryChannel};

    fn controller(channel: MemoryChannel) -> FlowController<MemoryChannel> {
        let timing = TransportTiming {
            inactivity_timeout: Duration::from_millis(100),
            poll_interval: Duration::from_millis(5),
            write_pacing: Duration::ZERO,
        };
        FlowController::new(Transport::new(channel, timing, StopSignal::new()))
    }

    #[test]
    fn test_starts_paused() {
        let channel = MemoryChannel::with_incoming(&[XON]);
        let handle = channel.clone();
        let mut flow = controller(channel);
        assert_eq!(flow.state(), FlowState::Xoff);

        flow.write_data(b'A').unwrap();
        assert_eq!(flow.state(), FlowState::Xon);
        assert_eq!(
            handle.events(),
            vec![ChannelEvent::Read(XON), ChannelEvent::Write(b'A')]
        );
    }

    #[test]
    fn test_no_data_written_between_xoff_and_xon() {
        let channel = MemoryChannel::with_incoming(&[XON]);
        let handle = channel.clone();
        let mut flow = controller(channel);
        flow.write_data(b'1').unwrap();

        handle.feed(&[XOFF, b'z', XON]);
        flow.write_data(b'2').unwrap();
        flow.write_data(b'3').unwrap();

        let events = handle.events();
        let xoff = events
            .iter()
            .position(|e| *e == ChannelEvent::Read(XOFF))
            .unwrap();
        let xon = events
            .iter()
            .rposition(|e| *e == ChannelEvent::Read(XON))
            .unwrap();
        assert!(xoff < xon);
        assert!(!events[xoff..xon]
            .iter()
            .any(|e| matches!(e, ChannelEvent::Write(_))));
        assert_eq!(handle.written(), b"123");
    }

    #[test]
    fn test_probed_byte_is_pushed_back() {
        let channel = MemoryChannel::with_incoming(&[XON]);
        let handle = channel.clone();
        let mut flow = controller(channel);
        flow.wait_for_xon().unwrap();

        handle.feed(&[ACK]);
        flow.write_data(b'A').unwrap();
        assert_eq!(flow.read_reply().unwrap(), ACK);
        assert_eq!(handle.pending(), 0);
    }

    #[test]
    fn test_reply_seen_while_paused_is_kept() {
        let channel = MemoryChannel::with_incoming(&[XON]);
        let handle = channel.clone();
        let mut flow = controller(channel);
        flow.write_data(b'1').unwrap();

        handle.feed(&[XOFF]);
        assert_eq!(flow.read_reply().unwrap(), XOFF);
        assert_eq!(flow.state(), FlowState::Xoff);

        handle.feed(&[ACK, XON]);
        flow.write_data(b'2').unwrap();
        assert_eq!(flow.read_reply().unwrap(), ACK);
        assert_eq!(handle.written(), b"12");
    }

    #[test]
    fn test_only_first_byte_while_paused_is_kept() {
        let channel = MemoryChannel::with_incoming(&[b'a', b'b', XON]);
        let mut flow = controller(channel);

        flow.wait_for_xon().unwrap();
        assert_eq!(flow.state(), FlowState::Xon);
        assert_eq!(flow.read_reply().unwrap(), b'a');
        assert!(matches!(
            flow.read_reply(),
            Err(TransportError::Timeout)
        ));
    }

    #[test]
    fn test_stop_while_paused_unwinds() {
        let channel = MemoryChannel::with_incoming(&[b'q', STOP]);
        let mut flow = controller(channel);

        let err = flow.write_data(b'A').unwrap_err();
        assert!(matches!(err, TransportError::PeerStop));
        assert!(flow.stop_signal().is_set());
        assert!(matches!(
            flow.write_data(b'B'),
            Err(TransportError::Stopped)
        ));
    }

    #[test]
    fn test_read_data_swallows_flow_bytes() {
        let channel = MemoryChannel::with_incoming(&[XON, b'4', XOFF, b'2']);
        let mut flow = controller(channel);

        assert_eq!(flow.read_data().unwrap(), b'4');
        assert_eq!(flow.state(), FlowState::Xon);
        assert_eq!(flow.read_data().unwrap(), b'2');
        assert_eq!(flow.state(), FlowState::Xoff);
    }

    #[test]
    fn test_read_data_stop_is_fatal() {
        let mut flow = controller(MemoryChannel::with_incoming(&[STOP]));
        assert!(matches!(flow.read_data(), Err(TransportError::PeerStop)));
        assert!(flow.stop_signal().is_set());
    }

    #[test]
    fn test_control_bytes_bypass_xoff() {
        let channel = MemoryChannel::new();
        let handle = channel.clone();
        let mut flow = controller(channel);

        flow.write_control(XON).unwrap();
        assert_eq!(handle.written(), vec![XON]);
        assert_eq!(flow.state(), FlowState::Xoff);
    }
}
