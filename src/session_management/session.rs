use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use uuid::Uuid;

use super::{Direction, SessionState, SessionSummary};
use crate::error_handling::types::SessionError;
use crate::protocol::constants::STOP;
use crate::protocol::record::Record;
use crate::transport::{ByteChannel, FlowController};

/// State shared by capture and replay: identity, the flow-controlled
/// transport and the counters reported in the [`SessionSummary`].
pub struct SessionContext<C> {
    id: Uuid,
    direction: Direction,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    state: SessionState,
    flow: FlowController<C>,
    records: u64,
    sections: u64,
}

impl<C: ByteChannel> SessionContext<C> {
    pub fn new(direction: Direction, flow: FlowController<C>) -> Self {
        let id = Uuid::new_v4();
        info!("[{}] Starting {} session", id, direction);
        Self {
            id,
            direction,
            started_at: Utc::now(),
            finished_at: None,
            state: SessionState::WaitingForStart,
            flow,
            records: 0,
            sections: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn flow(&self) -> &FlowController<C> {
        &self.flow
    }

    pub fn flow_mut(&mut self) -> &mut FlowController<C> {
        &mut self.flow
    }

    /// Move to `next`. Nothing leaves `Terminated`.
    pub fn transition(&mut self, next: SessionState) -> Result<(), SessionError> {
        if self.state == SessionState::Terminated {
            warn!(
                "[{}] transition to {:?} refused, session is terminated",
                self.id, next
            );
            return Err(SessionError::AlreadyTerminated);
        }
        if self.state != next {
            debug!("[{}] {:?} -> {:?}", self.id, self.state, next);
            self.state = next;
        }
        Ok(())
    }

    /// Count a record that crossed the link.
    pub fn record_transferred(&mut self, record: &Record) {
        self.records += 1;
        if record.is_section_end() {
            self.sections += 1;
        }
    }

    /// The single fatal teardown path.
    ///
    /// Raises the stop signal, sends one STOP if the transport is still
    /// open, closes the transport and enters `Terminated`. Calling it again
    /// does nothing, so a session never sends more than one STOP.
    pub fn terminate(&mut self, cause: &SessionError) {
        if self.state == SessionState::Terminated {
            return;
        }
        error!("[{}] Session failed: {}", self.id, cause);
        self.flow.stop_signal().set();

        let transport = self.flow.transport_mut();
        if !transport.is_closed() {
            debug!("[{}] sending STOP to peer", self.id);
            if let Err(e) = transport.write_byte(STOP) {
                warn!("[{}] Couldn't send STOP: {}", self.id, e);
            }
        }
        transport.close();

        self.state = SessionState::Terminated;
        self.finished_at = Some(Utc::now());
    }

    /// Clean completion: close the transport without sending STOP.
    pub fn finish(&mut self) {
        if self.state == SessionState::Terminated {
            return;
        }
        self.flow.transport_mut().close();
        self.state = SessionState::Terminated;
        self.finished_at = Some(Utc::now());
        info!(
            "[{}] {} finished: {} record(s), {} section(s)",
            self.id, self.direction, self.records, self.sections
        );
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            direction: self.direction,
            started_at: self.started_at,
            finished_at: self.finished_at,
            records: self.records,
            sections: self.sections,
            state: self.state,
        }
    }
}
