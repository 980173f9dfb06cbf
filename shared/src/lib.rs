//! netd-bridge Shared Protocol Types
//!
//! This crate provides the pieces both ends of a socket have to agree on:
//! the network daemon's line protocol, the control-channel messages posted
//! to and from the bridge, and the USB function convergence state machine.

pub mod codec;
pub mod dialect;
pub mod messages;
pub mod response;
pub mod state_machine;

pub use dialect::{frame_command, Dialect, LineDecoder};
pub use messages::{NetworkCommand, NetworkResult};
pub use response::{BroadcastTopic, DaemonEvent, ResponseClass, ResponseCode, ResponseDecoder};

/// Daemon protocol parameters
pub mod netd {
    /// 1xx - requested action is proceeding, more lines follow
    pub const COMMAND_PROCEEDING: u32 = 100;

    /// 2xx - requested action completed successfully
    pub const COMMAND_OKAY: u32 = 200;

    /// 4xx - command accepted but the action did not take place
    pub const COMMAND_FAIL: u32 = 400;

    /// 5xx - command syntax or parameter error
    pub const COMMAND_ERROR: u32 = 500;

    /// 6xx - unsolicited broadcasts
    pub const COMMAND_UNSOLICITED: u32 = 600;

    /// Broadcast: an interface was added, removed or changed state
    pub const BROADCAST_INTERFACE_CHANGE: u32 = 600;

    /// Broadcast: a bandwidth alert fired
    pub const BROADCAST_BANDWIDTH_CONTROLLER: u32 = 601;

    /// Harmless status query sent in place of a skipped destructive step
    pub const DUMMY_COMMAND: &str = "tether status";

    /// Joins the reasons of a multi-line reply
    pub const INTERFACE_DELIMITER: char = '\0';

    /// Separates entries of a USB function list
    pub const USB_CONFIG_DELIMITER: char = ',';

    /// First platform version whose daemon expects sequence numbers
    pub const SEQUENCED_MIN_SDK_VERSION: u32 = 16;
}

/// USB function switching parameters
pub mod usb {
    /// Retries before a USB function switch is reported as failed
    pub const FUNCTION_RETRY_TIMES: u32 = 20;

    /// Delay between two samples of the USB state
    pub const FUNCTION_RETRY_INTERVAL_MS: u64 = 100;

    pub const FUNCTION_RNDIS: &str = "rndis";
    pub const FUNCTION_ADB: &str = "adb";
}
