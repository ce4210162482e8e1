use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::transport::TransportTiming;

/// Parity setting for the serial line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
}

/// Flow control performed by the operating system driver.
///
/// The protocol engine runs its own XON/XOFF handshake and has to see those
/// bytes, so the default leaves the driver out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowControlMode {
    #[default]
    None,
    Software,
    Hardware,
}

/// `[serial]` section of the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    /// Device path or port name, e.g. `/dev/ttyUSB0` or `COM3`
    pub port: Option<String>,
    pub baud_rate: u32,
    pub data_bits: u8,
    pub stop_bits: u8,
    pub parity: Parity,
    pub flow_control: FlowControlMode,
    /// Raise DTR and RTS after opening; the organiser's cable draws power from them
    pub assert_dtr_rts: bool,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: 9600,
            data_bits: 8,
            stop_bits: 1,
            parity: Parity::None,
            flow_control: FlowControlMode::None,
            assert_dtr_rts: true,
        }
    }
}

/// `[timing]` section of the configuration file, all values in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    pub inactivity_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub write_pacing_ms: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            inactivity_timeout_ms: 60_500,
            poll_interval_ms: 50,
            write_pacing_ms: 4,
        }
    }
}

impl TimingSettings {
    pub fn transport_timing(&self) -> TransportTiming {
        TransportTiming {
            inactivity_timeout: Duration::from_millis(self.inactivity_timeout_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            write_pacing: Duration::from_millis(self.write_pacing_ms),
        }
    }
}
