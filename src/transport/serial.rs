//! Serial line channel backed by the serialport crate.
//!
//! The port is opened from `SerialSettings`; baud rate, parity and handshake
//! are fixed for the lifetime of the channel.

use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use log::{debug, info, warn};
use serialport::{DataBits, FlowControl, Parity as SpParity, SerialPort, StopBits};

use super::channel::ByteChannel;
use crate::configuration::types::{FlowControlMode, Parity, SerialSettings};
use crate::error_handling::types::TransportError;

// ============================================================================
// Conversion Functions
// ============================================================================

/// Convert our Parity enum to serialport crate's Parity type
pub fn to_serialport_parity(p: Parity) -> SpParity {
    match p {
        Parity::None => SpParity::None,
        Parity::Odd => SpParity::Odd,
        Parity::Even => SpParity::Even,
    }
}

/// Convert data bits count to serialport crate's DataBits type
pub fn to_serialport_data_bits(bits: u8) -> DataBits {
    match bits {
        5 => DataBits::Five,
        6 => DataBits::Six,
        7 => DataBits::Seven,
        _ => DataBits::Eight,
    }
}

/// Convert stop bits count to serialport crate's StopBits type
pub fn to_serialport_stop_bits(bits: u8) -> StopBits {
    match bits {
        2 => StopBits::Two,
        _ => StopBits::One,
    }
}

pub fn to_serialport_flow_control(mode: FlowControlMode) -> FlowControl {
    match mode {
        FlowControlMode::None => FlowControl::None,
        FlowControlMode::Software => FlowControl::Software,
        FlowControlMode::Hardware => FlowControl::Hardware,
    }
}

// ============================================================================
// Serial Channel
// ============================================================================

pub struct SerialChannel {
    port: Box<dyn SerialPort>,
    name: String,
    timeout: Duration,
}

impl SerialChannel {
    pub fn open(port_name: &str, settings: &SerialSettings) -> Result<Self, TransportError> {
        let timeout = Duration::from_millis(1);
        let mut port = serialport::new(port_name, settings.baud_rate)
            .data_bits(to_serialport_data_bits(settings.data_bits))
            .stop_bits(to_serialport_stop_bits(settings.stop_bits))
            .parity(to_serialport_parity(settings.parity))
            .flow_control(to_serialport_flow_control(settings.flow_control))
            .timeout(timeout)
            .open()
            .map_err(|e| TransportError::Open(format!("{}: {}", port_name, e)))?;

        if settings.assert_dtr_rts {
            port.write_data_terminal_ready(true)?;
            port.write_request_to_send(true)?;
        }

        info!(
            "Opened {} at {} baud ({}-{}-{}) [os flow control: {:?}]",
            port_name,
            settings.baud_rate,
            settings.data_bits,
            match settings.parity {
                Parity::None => 'N',
                Parity::Odd => 'O',
                Parity::Even => 'E',
            },
            settings.stop_bits,
            settings.flow_control
        );

        Ok(Self {
            port,
            name: port_name.to_string(),
            timeout,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), TransportError> {
        if timeout != self.timeout {
            self.port.set_timeout(timeout)?;
            self.timeout = timeout;
        }
        Ok(())
    }
}

impl ByteChannel for SerialChannel {
    fn poll_byte(&mut self, wait: Duration) -> Result<Option<u8>, TransportError> {
        if wait.is_zero() && self.port.bytes_to_read()? == 0 {
            return Ok(None);
        }
        self.set_timeout(wait.max(Duration::from_millis(1)))?;

        let mut buf = [0u8; 1];
        match self.port.read(&mut buf) {
            Ok(1) => Ok(Some(buf[0])),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => {
                Ok(None)
            }
            Err(e) => Err(TransportError::Io(e)),
        }
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), TransportError> {
        self.port.write_all(&[byte]).map_err(|e| {
            warn!("Couldn't write {:#04x} to {}: {}", byte, self.name, e);
            TransportError::Io(e)
        })?;
        self.port.flush()?;
        Ok(())
    }

    fn close(&mut self) {
        if let Err(e) = self.port.write_request_to_send(false) {
            debug!("Failed to drop RTS on {}: {}", self.name, e);
        }
        if let Err(e) = self.port.write_data_terminal_ready(false) {
            debug!("Failed to drop DTR on {}: {}", self.name, e);
        }
        info!("Closed {}", self.name);
    }
}

// ============================================================================
// Tests
// ============================================================================
