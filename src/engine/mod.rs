//! Command-chain execution engine
//!
//! This module handles:
//! - Turning requests into chains of daemon commands
//! - Serializing those commands so only one is outstanding at a time
//! - Advancing chains on replies and rolling back failed tethering
//! - Switching the USB network function and confirming the switch

pub mod catalog;
mod chain;
mod command;
mod executor;
mod params;
mod queue;
pub mod usb;

pub use catalog::{Operation, OperationError};
pub use chain::CommandChain;
pub use command::DaemonCommand;
pub use executor::{EngineOutput, NetworkEngine};
pub use params::NetworkParams;
pub use queue::DispatchQueue;
pub use usb::UsbStatePoller;
