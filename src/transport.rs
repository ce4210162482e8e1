//! Byte transport, flow control and the channels underneath.
//!
//! ```text
//! ┌──────────────────┐    ┌─────────────┐    ┌──────────────────────┐
//! │ FlowController   │───▶│ Transport   │───▶│ ByteChannel          │
//! │ XON/XOFF gating  │    │ pushback,   │    │ SerialChannel /      │
//! │                  │    │ deadline,   │    │ MemoryChannel        │
//! └──────────────────┘    │ stop signal │    └──────────────────────┘
//!                         └─────────────┘
//! ```

pub mod byte_transport;
pub mod channel;
pub mod flow_control;
pub mod memory;
pub mod serial;
pub mod stop_signal;

pub use byte_transport::{ReadMode, Transport, TransportTiming};
pub use channel::ByteChannel;
pub use flow_control::{FlowController, FlowState};
pub use memory::{ChannelEvent, MemoryChannel};
pub use serial::SerialChannel;
pub use stop_signal::StopSignal;
