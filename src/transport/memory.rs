//! Scripted in-memory peer.
//!
//! `MemoryChannel` serves queued bytes to the reader and records every
//! read, write and close in order, so tests can check exactly what went
//! over the wire and when. Handles are cheap clones of the same channel.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::trace;

use super::channel::ByteChannel;
use crate::error_handling::types::TransportError;

/// One operation observed on a [`MemoryChannel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelEvent {
    Read(u8),
    Write(u8),
    Close,
}

#[derive(Debug, Default)]
struct Inner {
    incoming: VecDeque<u8>,
    events: Vec<ChannelEvent>,
    closed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryChannel {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A channel whose peer will send `bytes`.
    pub fn with_incoming(bytes: &[u8]) -> Self {
        let channel = Self::new();
        channel.feed(bytes);
        channel
    }

    /// Queue more bytes from the peer.
    pub fn feed(&self, bytes: &[u8]) {
        self.lock().incoming.extend(bytes.iter().copied());
    }

    /// Every byte written by the host, in order.
    pub fn written(&self) -> Vec<u8> {
        self.lock()
            .events
            .iter()
            .filter_map(|e| match e {
                ChannelEvent::Write(b) => Some(*b),
                _ => None,
            })
            .collect()
    }

    pub fn events(&self) -> Vec<ChannelEvent> {
        self.lock().events.clone()
    }

    /// Bytes queued by the peer that were never read.
    pub fn pending(&self) -> usize {
        self.lock().incoming.len()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock can only come from a failing test.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl ByteChannel for MemoryChannel {
    fn poll_byte(&mut self, wait: Duration) -> Result<Option<u8>, TransportError> {
        {
            let mut inner = self.lock();
            if inner.closed {
                return Err(TransportError::Closed);
            }
            if let Some(byte) = inner.incoming.pop_front() {
                inner.events.push(ChannelEvent::Read(byte));
                return Ok(Some(byte));
            }
        }
        if !wait.is_zero() {
            std::thread::sleep(wait);
        }
        Ok(None)
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), TransportError> {
        let mut inner = self.lock();
        if inner.closed {
            return Err(TransportError::Closed);
        }
        trace!("memory channel write {:#04x}", byte);
        inner.events.push(ChannelEvent::Write(byte));
        Ok(())
    }

    fn close(&mut self) {
        let mut inner = self.lock();
        inner.closed = true;
        inner.events.push(ChannelEvent::Close);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_in_order_and_records_events() {
        let mut channel = MemoryChannel::with_incoming(b"ab");
        let handle = channel.clone();

        assert_eq!(channel.poll_byte(Duration::ZERO).unwrap(), Some(b'a'));
        channel.write_byte(b'x').unwrap();
        assert_eq!(channel.poll_byte(Duration::ZERO).unwrap(), Some(b'b'));
        assert_eq!(channel.poll_byte(Duration::ZERO).unwrap(), None);
        channel.close();

        assert_eq!(
            handle.events(),
            vec![
                ChannelEvent::Read(b'a'),
                ChannelEvent::Write(b'x'),
                ChannelEvent::Read(b'b'),
                ChannelEvent::Close,
            ]
        );
        assert_eq!(handle.written(), b"x");
        assert!(handle.is_closed());
        assert!(matches!(
            channel.write_byte(b'y'),
            Err(TransportError::Closed)
        ));
    }
}
