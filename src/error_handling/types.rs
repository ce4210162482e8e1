use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    MissingPort,
    NotInRange(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::MissingPort => write!(f, "No serial port configured"),
            ConfigError::NotInRange(e) => write!(f, "Value out of range: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

/// Failures of the byte transport and the flow controller sitting on top of it.
///
/// `WouldBlock` is only ever produced by a non-blocking read and is routine;
/// every other variant ends the session.
#[derive(Debug)]
pub enum TransportError {
    /// No byte arrived within the inactivity window of a blocking read.
    Timeout,
    /// A non-blocking read found nothing buffered.
    WouldBlock,
    /// The session stop signal was raised while waiting.
    Stopped,
    /// The peer sent STOP.
    PeerStop,
    /// The transport has already been closed.
    Closed,
    /// The underlying channel could not be opened.
    Open(String),
    Io(std::io::Error),
}

impl TransportError {
    /// Returns `true` for outcomes that are not failures (an empty
    /// non-blocking probe).
    pub fn is_routine(&self) -> bool {
        matches!(self, TransportError::WouldBlock)
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Timeout => write!(f, "Timed out waiting for the peer"),
            TransportError::WouldBlock => write!(f, "No byte available"),
            TransportError::Stopped => write!(f, "Session stop requested"),
            TransportError::PeerStop => write!(f, "Peer stopped the communication"),
            TransportError::Closed => write!(f, "Transport is closed"),
            TransportError::Open(e) => write!(f, "Unable to open transport: {}", e),
            TransportError::Io(e) => write!(f, "Transport IO error: {}", e),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io(err)
    }
}

impl From<serialport::Error> for TransportError {
    fn from(err: serialport::Error) -> Self {
        TransportError::Io(err.into())
    }
}

#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    /// The stream ended in the middle of a record.
    Truncated {
        offset: u64,
        expected: usize,
        got: usize,
    },
    InvalidRecord(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "Storage IO error: {}", e),
            StorageError::Truncated {
                offset,
                expected,
                got,
            } => write!(
                f,
                "Truncated record at offset {}: expected {} byte(s), got {}",
                offset, expected, got
            ),
            StorageError::InvalidRecord(e) => write!(f, "Invalid record: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err)
    }
}

#[derive(Debug)]
pub enum SessionError {
    Transport(TransportError),
    Storage(StorageError),
    /// The peer answered a section-end record with NACK.
    PeerNack,
    /// The session was already terminated when an operation was requested.
    AlreadyTerminated,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Transport(e) => write!(f, "Transport error: {}", e),
            SessionError::Storage(e) => write!(f, "Storage error: {}", e),
            SessionError::PeerNack => {
                write!(f, "Transmission error reported by peer, retransmit requested")
            }
            SessionError::AlreadyTerminated => write!(f, "Session already terminated"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<TransportError> for SessionError {
    fn from(err: TransportError) -> Self {
        SessionError::Transport(err)
    }
}

impl From<StorageError> for SessionError {
    fn from(err: StorageError) -> Self {
        SessionError::Storage(err)
    }
}

#[derive(Debug)]
pub enum ControllerError {
    ConfigurationError(ConfigError),
    TransportError(TransportError),
    SessionError(SessionError),
    StorageError(StorageError),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::ConfigurationError(e) => write!(f, "Configuration error: {}", e),
            ControllerError::TransportError(e) => write!(f, "Transport error: {}", e),
            ControllerError::SessionError(e) => write!(f, "Session error: {}", e),
            ControllerError::StorageError(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<ConfigError> for ControllerError {
    fn from(err: ConfigError) -> Self {
        ControllerError::ConfigurationError(err)
    }
}

impl From<TransportError> for ControllerError {
    fn from(err: TransportError) -> Self {
        ControllerError::TransportError(err)
    }
}

impl From<SessionError> for ControllerError {
    fn from(err: SessionError) -> Self {
        ControllerError::SessionError(err)
    }
}

impl From<StorageError> for ControllerError {
    fn from(err: StorageError) -> Self {
        ControllerError::StorageError(err)
    }
}
