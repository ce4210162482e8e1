pub mod config;
pub mod types;

pub use config::{Config, Overrides};
pub use types::{FlowControlMode, Parity, SerialSettings, TimingSettings};
