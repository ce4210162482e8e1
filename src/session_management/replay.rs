//! Replay: records from a persisted stream are sent back to the device.

use log::{debug, info, warn};

use super::session::SessionContext;
use super::status::TransferProgress;
use super::{Direction, SessionState, SessionSummary};
use crate::error_handling::types::{SessionError, TransportError};
use crate::protocol::constants::STOP;
use crate::protocol::{RecordEncoder, Reply};
use crate::storage::RecordSource;
use crate::transport::{ByteChannel, FlowController};

pub struct ReplaySession<C, R> {
    context: SessionContext<C>,
    encoder: RecordEncoder,
    progress: TransferProgress,
    source: R,
}

impl<C: ByteChannel, R: RecordSource> ReplaySession<C, R> {
    pub fn new(flow: FlowController<C>, source: R) -> Self {
        let context = SessionContext::new(Direction::Replay, flow);
        let id = context.id();
        Self {
            context,
            encoder: RecordEncoder::new(id),
            progress: TransferProgress::new(id),
            source,
        }
    }

    pub fn context(&self) -> &SessionContext<C> {
        &self.context
    }

    /// Send every record of the source, stopping early after the
    /// end-of-transfer record.
    ///
    /// STOP ends the wait after a section-end record like XON or XOFF do,
    /// but it also raises the stop signal, and a peer STOP is one of the
    /// fatal conditions of a session. The replay therefore fails with
    /// `TransportError::PeerStop` and goes through the teardown instead of
    /// sending the next record.
    pub fn run(&mut self) -> Result<SessionSummary, SessionError> {
        match self.transfer() {
            Ok(()) => {
                self.context.finish();
                Ok(self.context.summary())
            }
            Err(e) => {
                self.context.terminate(&e);
                Err(e)
            }
        }
    }

    fn transfer(&mut self) -> Result<(), SessionError> {
        let id = self.context.id();
        info!("[{}] Waiting for the organiser to accept data", id);
        self.context.flow_mut().wait_for_xon()?;

        while let Some(record) = self.source.next_record()? {
            self.context.transition(SessionState::Transmitting)?;
            self.encoder.write_frame(self.context.flow_mut(), &record)?;
            self.context.record_transferred(&record);
            self.progress.observe(&record);

            if record.is_section_end() {
                self.context.transition(SessionState::AwaitingAck)?;
                match self.encoder.await_reply(self.context.flow_mut())? {
                    Reply::Ack => debug!("[{}] section acknowledged", id),
                    Reply::Control(STOP) => return Err(TransportError::PeerStop.into()),
                    Reply::Control(_) | Reply::Other(_) => {}
                }
            }

            if record.is_end_of_transfer() {
                return Ok(());
            }
        }
        warn!("[{}] source exhausted before an end-of-transfer record", id);
        Ok(())
    }
}
