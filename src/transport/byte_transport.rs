//! Single-byte transport with a pushback slot and an inactivity deadline.

use std::time::{Duration, Instant};

use log::{debug, trace, warn};

use super::channel::ByteChannel;
use super::stop_signal::StopSignal;
use crate::error_handling::types::TransportError;

/// Default inactivity window of a blocking read.
pub const DEFAULT_INACTIVITY_TIMEOUT: Duration = Duration::from_millis(60_500);

/// Default granularity at which blocking reads re-check the stop signal.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Default pause after each data byte written while replaying.
pub const DEFAULT_WRITE_PACING: Duration = Duration::from_millis(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Block until a byte arrives, the inactivity window passes or a stop
    /// is requested.
    Wait,
    /// Return immediately; `TransportError::WouldBlock` when nothing is
    /// buffered.
    NoWait,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportTiming {
    pub inactivity_timeout: Duration,
    pub poll_interval: Duration,
    pub write_pacing: Duration,
}

impl Default for TransportTiming {
    fn default() -> Self {
        Self {
            inactivity_timeout: DEFAULT_INACTIVITY_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            write_pacing: DEFAULT_WRITE_PACING,
        }
    }
}

pub struct Transport<C> {
    channel: Option<C>,
    pushback: Option<u8>,
    stop: StopSignal,
    timing: TransportTiming,
}

impl<C: ByteChannel> Transport<C> {
    pub fn new(channel: C, timing: TransportTiming, stop: StopSignal) -> Self {
        Self {
            channel: Some(channel),
            pushback: None,
            stop,
            timing,
        }
    }

    /// Read one byte.
    ///
    /// A pushed-back byte is always returned first, whatever the mode and
    /// even after a stop was requested. Blocking reads check the stop
    /// signal before every poll increment and give up once
    /// `inactivity_timeout` has elapsed on the monotonic clock.
    pub fn read_byte(&mut self, mode: ReadMode) -> Result<u8, TransportError> {
        if let Some(byte) = self.pushback.take() {
            trace!("replaying pushed back byte {:#04x}", byte);
            return Ok(byte);
        }

        match mode {
            ReadMode::NoWait => {
                let channel = self.channel.as_mut().ok_or(TransportError::Closed)?;
                match channel.poll_byte(Duration::ZERO)? {
                    Some(byte) => {
                        trace!("read {:#04x} (no wait)", byte);
                        Ok(byte)
                    }
                    None => Err(TransportError::WouldBlock),
                }
            }
            ReadMode::Wait => {
                let deadline = Instant::now() + self.timing.inactivity_timeout;
                loop {
                    if self.stop.is_set() {
                        debug!("blocking read abandoned, stop requested");
                        return Err(TransportError::Stopped);
                    }
                    let now = Instant::now();
                    if now >= deadline {
                        warn!(
                            "no byte from peer within {:?}",
                            self.timing.inactivity_timeout
                        );
                        return Err(TransportError::Timeout);
                    }
                    let wait = self.timing.poll_interval.min(deadline - now);
                    let channel = self.channel.as_mut().ok_or(TransportError::Closed)?;
                    if let Some(byte) = channel.poll_byte(wait)? {
                        trace!("read {:#04x}", byte);
                        return Ok(byte);
                    }
                }
            }
        }
    }

    /// Store `byte` so the next read returns it before any live byte.
    pub fn push_back(&mut self, byte: u8) {
        if let Some(previous) = self.pushback.replace(byte) {
            warn!(
                "pushback slot already held {:#04x}, replaced by {:#04x}",
                previous, byte
            );
        }
    }

    pub fn write_byte(&mut self, byte: u8) -> Result<(), TransportError> {
        let channel = self.channel.as_mut().ok_or(TransportError::Closed)?;
        trace!("write {:#04x}", byte);
        channel.write_byte(byte)
    }

    /// Close the underlying channel. Later reads and writes fail with
    /// `TransportError::Closed`.
    pub fn close(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            channel.close();
            debug!("transport closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.channel.is_none()
    }

    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    pub fn timing(&self) -> TransportTiming {
        self.timing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::memory::{ChannelEvent, MemoryChannel};

    fn fast_timing() -> TransportTiming {
        TransportTiming {
            inactivity_timeout: Duration::from_millis(40),
            poll_interval: Duration::from_millis(5),
            write_pacing: Duration::ZERO,
        }
    }

    #[test]
    fn test_pushback_precedes_live_bytes() {
        let channel = MemoryChannel::with_incoming(b"bc");
        let mut transport = Transport::new(channel, fast_timing(), StopSignal::new());

        assert_eq!(transport.read_byte(ReadMode::Wait).unwrap(), b'b');
        transport.push_back(b'a');
        assert_eq!(transport.read_byte(ReadMode::NoWait).unwrap(), b'a');
        assert_eq!(transport.read_byte(ReadMode::Wait).unwrap(), b'c');
    }

    #[test]
    fn test_no_wait_on_empty_channel_would_block() {
        let mut transport =
            Transport::new(MemoryChannel::new(), fast_timing(), StopSignal::new());
        let err = transport.read_byte(ReadMode::NoWait).unwrap_err();
        assert!(err.is_routine());
    }

    #[test]
    fn test_blocking_read_times_out() {
        let mut transport =
            Transport::new(MemoryChannel::new(), fast_timing(), StopSignal::new());
        let started = Instant::now();
        let err = transport.read_byte(ReadMode::Wait).unwrap_err();
        assert!(matches!(err, TransportError::Timeout));
        assert!(started.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn test_stop_signal_short_circuits_wait() {
        let stop = StopSignal::new();
        let timing = TransportTiming {
            inactivity_timeout: Duration::from_secs(30),
            ..fast_timing()
        };
        let mut transport = Transport::new(MemoryChannel::new(), timing, stop.clone());
        stop.set();

        let started = Instant::now();
        let err = transport.read_byte(ReadMode::Wait).unwrap_err();
        assert!(matches!(err, TransportError::Stopped));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_close_is_final() {
        let channel = MemoryChannel::with_incoming(b"x");
        let handle = channel.clone();
        let mut transport = Transport::new(channel, fast_timing(), StopSignal::new());

        transport.close();
        transport.close();
        assert!(transport.is_closed());
        assert!(matches!(
            transport.read_byte(ReadMode::Wait),
            Err(TransportError::Closed)
        ));
        assert!(matches!(
            transport.write_byte(b'y'),
            Err(TransportError::Closed)
        ));
        assert_eq!(handle.events(), vec![ChannelEvent::Close]);
    }
}
