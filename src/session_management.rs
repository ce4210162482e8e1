//! Session management core module.
//!
//! A session owns the flow-controlled transport for one transfer, in one
//! direction, and drives it through the [`SessionState`] machine until it
//! is `Terminated`.
//!
//! - `session`: shared context, state transitions and the single teardown
//!   path
//! - `capture`: device to file
//! - `replay`: file to device
//! - `status`: progress reporting while records flow
//! - `listing`: rendering of a persisted stream

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub mod capture;
pub mod listing;
pub mod replay;
pub mod session;
pub mod status;

pub use capture::CaptureSession;
pub use listing::{print_records, ListingFormat};
pub use replay::ReplaySession;
pub use session::SessionContext;
pub use status::TransferProgress;

/// Where a session currently is in the transfer.
///
/// Variants:
/// - `WaitingForStart`: capture waits for CR LF, replay for the peer's XON.
/// - `ReceivingHeader` / `ReceivingPayload`: a frame is being decoded.
/// - `Transmitting`: a frame is being sent.
/// - `AwaitingAck`: a section-end record was sent, waiting on the reply.
/// - `Terminated`: final, no transition leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    WaitingForStart,
    ReceivingHeader,
    ReceivingPayload,
    Transmitting,
    AwaitingAck,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Capture,
    Replay,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Capture => write!(f, "capture"),
            Direction::Replay => write!(f, "replay"),
        }
    }
}

/// What a finished session did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub direction: Direction,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub records: u64,
    pub sections: u64,
    pub state: SessionState,
}

impl SessionSummary {
    /// Single-line JSON rendering, used for the closing log line.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
