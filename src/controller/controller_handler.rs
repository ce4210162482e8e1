use std::io::Write;
use std::path::Path;

use log::{error, info, warn};

use crate::configuration::config::Config;
use crate::error_handling::types::*;
use crate::session_management::{
    print_records, CaptureSession, ListingFormat, ReplaySession, SessionSummary,
};
use crate::storage::{FileRecordSink, FileRecordSource};
use crate::transport::{ByteChannel, FlowController, SerialChannel, StopSignal, Transport};

/// Runs one command against the configured serial line.
///
/// # Fields Overview
///
/// - `config`: validated configuration, CLI overrides already applied
/// - `stop`: shared stop flag handed to every transport this controller
///   opens; setting it from another thread ends the running session
pub struct Controller {
    pub config: Config,
    stop: StopSignal,
}

impl Controller {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            stop: StopSignal::new(),
        }
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Capture from the configured serial port into `path`.
    pub fn capture(&self, path: &Path) -> Result<SessionSummary, ControllerError> {
        let channel = self.open_serial()?;
        self.capture_on(channel, path)
    }

    /// Replay the records stored in `path` to the configured serial port.
    pub fn replay(&self, path: &Path) -> Result<SessionSummary, ControllerError> {
        let channel = self.open_serial()?;
        self.replay_on(channel, path)
    }

    pub fn capture_on<C: ByteChannel>(
        &self,
        channel: C,
        path: &Path,
    ) -> Result<SessionSummary, ControllerError> {
        let sink = FileRecordSink::create(path)?;
        let mut session = CaptureSession::new(self.flow(channel), sink);
        let summary = session.run().map_err(|e| {
            error!("Capture into {} failed: {}", path.display(), e);
            e
        })?;
        info!(
            "Captured {} record(s) into {}",
            summary.records,
            path.display()
        );
        log_summary(&summary);
        Ok(summary)
    }

    pub fn replay_on<C: ByteChannel>(
        &self,
        channel: C,
        path: &Path,
    ) -> Result<SessionSummary, ControllerError> {
        let source = FileRecordSource::open(path)?;
        let mut session = ReplaySession::new(self.flow(channel), source);
        let summary = session.run().map_err(|e| {
            error!("Replay of {} failed: {}", path.display(), e);
            e
        })?;
        info!("Replayed {} record(s) from {}", summary.records, path.display());
        log_summary(&summary);
        Ok(summary)
    }

    /// Print the records stored in `path`. No serial port is opened.
    pub fn print<W: Write>(
        &self,
        path: &Path,
        format: ListingFormat,
        out: &mut W,
    ) -> Result<usize, ControllerError> {
        let mut source = FileRecordSource::open(path)?;
        Ok(print_records(&mut source, out, format)?)
    }

    fn open_serial(&self) -> Result<SerialChannel, ControllerError> {
        let port = self.config.port()?;
        Ok(SerialChannel::open(port, &self.config.serial)?)
    }

    fn flow<C: ByteChannel>(&self, channel: C) -> FlowController<C> {
        let transport = Transport::new(
            channel,
            self.config.timing.transport_timing(),
            self.stop.clone(),
        );
        FlowController::new(transport)
    }
}

fn log_summary(summary: &SessionSummary) {
    match summary.to_json() {
        Ok(line) => info!("Session summary: {}", line),
        Err(e) => warn!("Couldn't render summary of session {}: {}", summary.id, e),
    }
}
