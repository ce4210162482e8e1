//! Capture: the device sends, every decoded record is persisted.

use log::{debug, info};

use super::session::SessionContext;
use super::status::TransferProgress;
use super::{Direction, SessionState, SessionSummary};
use crate::error_handling::types::SessionError;
use crate::protocol::constants::{CR, LF, XON};
use crate::protocol::RecordDecoder;
use crate::storage::RecordSink;
use crate::transport::{ByteChannel, FlowController};

pub struct CaptureSession<C, S> {
    context: SessionContext<C>,
    decoder: RecordDecoder,
    progress: TransferProgress,
    sink: S,
}

impl<C: ByteChannel, S: RecordSink> CaptureSession<C, S> {
    pub fn new(flow: FlowController<C>, sink: S) -> Self {
        let context = SessionContext::new(Direction::Capture, flow);
        let id = context.id();
        Self {
            context,
            decoder: RecordDecoder::new(id),
            progress: TransferProgress::new(id),
            sink,
        }
    }

    pub fn context(&self) -> &SessionContext<C> {
        &self.context
    }

    pub fn progress(&self) -> &TransferProgress {
        &self.progress
    }

    /// Run the capture until the end-of-transfer record.
    ///
    /// Any failure goes through the session teardown before it is
    /// returned.
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
        self.wait_for_start()?;
        loop {
            self.context.transition(SessionState::ReceivingHeader)?;
            let header = self.decoder.read_header(self.context.flow_mut())?;

            self.context.transition(SessionState::ReceivingPayload)?;
            let record = self.decoder.read_body(self.context.flow_mut(), header)?;

            self.sink.append_record(&record)?;
            self.context.record_transferred(&record);
            self.progress.observe(&record);

            if record.is_end_of_transfer() {
                self.sink.flush()?;
                return Ok(());
            }
        }
    }

    /// Wait for the peer's CR LF, then invite it to send with XON.
    fn wait_for_start(&mut self) -> Result<(), SessionError> {
        let id = self.context.id();
        info!("[{}] Waiting for the organiser to start sending", id);
        let flow = self.context.flow_mut();
        let mut after_cr = false;
        loop {
            let byte = flow.read_data()?;
            if after_cr && byte == LF {
                break;
            }
            after_cr = byte == CR;
        }
        debug!("[{}] start of exchange, sending XON", id);
        flow.write_control(XON)?;
        Ok(())
    }
}
