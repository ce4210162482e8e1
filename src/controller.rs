//! Top-level orchestration of the capture, replay and print commands.

pub mod controller_handler;
