pub mod configuration;
pub mod controller;
pub mod error_handling;
pub mod protocol;
pub mod session_management;
pub mod storage;
pub mod transport;
