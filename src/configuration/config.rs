use super::types::*;
use crate::error_handling::types::ConfigError;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Application configuration.
///
/// Every section is optional in the TOML file and falls back to the
/// defaults of the organiser cable setup (9600 8N1, 60.5 s
/// inactivity timeout).
///
/// # Examples
///
/// ```
/// use casiolink::configuration::config::Config;
///
/// let config = Config::from_toml_str(
///     r#"
///     [serial]
///     port = "/dev/ttyUSB0"
///
///     [timing]
///     inactivity_timeout_ms = 30000
///     "#,
/// )
/// .unwrap();
/// assert_eq!(config.serial.baud_rate, 9600);
/// assert_eq!(config.timing.inactivity_timeout_ms, 30000);
/// ```
///
/// # Fields Overview
///
/// - `serial`: how to open the line to the organiser
/// - `timing`: inactivity timeout, stop-signal polling granularity and
///   replay pacing
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub serial: SerialSettings,
    pub timing: TimingSettings,
}

/// Values given on the command line, applied over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<String>,
    pub baud_rate: Option<u32>,
    pub inactivity_timeout_ms: Option<u64>,
}

impl Config {
    /// Reads and validates a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        info!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::TomlError(e.to_string()))?;
        config.validate()?;
        debug!("Parsed configuration: {:?}", config);
        Ok(config)
    }

    /// Applies command-line values on top of this configuration and
    /// re-validates the result.
    pub fn with_overrides(mut self, overrides: Overrides) -> Result<Self, ConfigError> {
        if let Some(port) = overrides.port {
            self.serial.port = Some(port);
        }
        if let Some(baud_rate) = overrides.baud_rate {
            self.serial.baud_rate = baud_rate;
        }
        if let Some(timeout) = overrides.inactivity_timeout_ms {
            self.timing.inactivity_timeout_ms = timeout;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.serial.baud_rate == 0 {
            return Err(ConfigError::NotInRange(
                "serial.baud_rate must be greater than 0".to_string(),
            ));
        }
        if !(5..=8).contains(&self.serial.data_bits) {
            return Err(ConfigError::NotInRange(format!(
                "serial.data_bits must be between 5 and 8, got {}",
                self.serial.data_bits
            )));
        }
        if !(1..=2).contains(&self.serial.stop_bits) {
            return Err(ConfigError::NotInRange(format!(
                "serial.stop_bits must be 1 or 2, got {}",
                self.serial.stop_bits
            )));
        }
        if self.timing.poll_interval_ms == 0 {
            return Err(ConfigError::NotInRange(
                "timing.poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.timing.poll_interval_ms > self.timing.inactivity_timeout_ms {
            return Err(ConfigError::NotInRange(format!(
                "timing.poll_interval_ms ({}) exceeds timing.inactivity_timeout_ms ({})",
                self.timing.poll_interval_ms, self.timing.inactivity_timeout_ms
            )));
        }
        Ok(())
    }

    /// The configured serial port, required by capture and replay.
    pub fn port(&self) -> Result<&str, ConfigError> {
        self.serial.port.as_deref().ok_or(ConfigError::MissingPort)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.serial.baud_rate, 9600);
        assert_eq!(config.serial.parity, Parity::None);
        assert_eq!(config.serial.flow_control, FlowControlMode::None);

        let timing = config.timing.transport_timing();
        assert_eq!(timing.inactivity_timeout, Duration::from_millis(60_500));
        assert_eq!(timing.write_pacing, Duration::from_millis(4));
        assert!(matches!(config.port(), Err(ConfigError::MissingPort)));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[serial]
port = "/dev/ttyS1"
baud_rate = 4800
parity = "even"
flow_control = "software"

[timing]
poll_interval_ms = 10
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.port().unwrap(), "/dev/ttyS1");
        assert_eq!(config.serial.baud_rate, 4800);
        assert_eq!(config.serial.parity, Parity::Even);
        assert_eq!(config.serial.flow_control, FlowControlMode::Software);
        assert_eq!(config.serial.data_bits, 8);
        assert_eq!(config.timing.poll_interval_ms, 10);
        assert_eq!(config.timing.inactivity_timeout_ms, 60_500);
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file(Path::new("/nonexistent/casiolink.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            Config::from_toml_str("[serial]\ndata_bits = 9\n"),
            Err(ConfigError::NotInRange(_))
        ));
        assert!(matches!(
            Config::from_toml_str("[timing]\ninactivity_timeout_ms = 10\npoll_interval_ms = 20\n"),
            Err(ConfigError::NotInRange(_))
        ));
        assert!(matches!(
            Config::from_toml_str("[serial]\nparity = \"mark\"\n"),
            Err(ConfigError::TomlError(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let config = Config::default()
            .with_overrides(Overrides {
                port: Some("COM15".to_string()),
                baud_rate: Some(19200),
                inactivity_timeout_ms: Some(1000),
            })
            .unwrap();
        assert_eq!(config.port().unwrap(), "COM15");
        assert_eq!(config.serial.baud_rate, 19200);
        assert_eq!(config.timing.inactivity_timeout_ms, 1000);

        let err = Config::default()
            .with_overrides(Overrides {
                baud_rate: Some(0),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, ConfigError::NotInRange(_)));
    }
}
