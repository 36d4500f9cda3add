//! Device bridge layer.
//!
//! Everything that leaves this machine goes through the `adb` command-line
//! tool: commands are built as typed argument vectors, executed as child
//! processes, and their text output is parsed by the callers.

pub mod command;
pub mod device;
pub mod executor;

pub use command::BridgeCommand;
pub use device::{authorized_device_attached, probe_version};
pub use executor::{AdbBridge, BridgeExecutor, BridgeOutput};
