use std::time::Duration;

use crate::error_handling::types::TransportError;

/// An already opened, already configured byte stream to the peer.
///
/// Implementations only move single bytes; pushback, deadlines and the
/// stop signal are handled by [`Transport`](super::Transport).
pub trait ByteChannel {
    /// Wait at most `wait` for one byte. `Ok(None)` means nothing arrived.
    /// A zero `wait` must not block.
    fn poll_byte(&mut self, wait: Duration) -> Result<Option<u8>, TransportError>;

    fn write_byte(&mut self, byte: u8) -> Result<(), TransportError>;

    /// Release the underlying resource. Called once by the transport.
    fn close(&mut self) {}
}

impl<C: ByteChannel + ?Sized> ByteChannel for Box<C> {
    fn poll_byte(&mut self, wait: Duration) -> Result<Option<u8>, TransportError> {
        (**self).poll_byte(wait)
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), TransportError> {
        (**self).write_byte(byte)
    }

    fn close(&mut self) {
        (**self).close()
    }
}
