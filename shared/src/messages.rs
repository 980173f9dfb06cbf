//! Control-channel messages
//!
//! Requests (`NetworkCommand`) and results (`NetworkResult`) exchanged with
//! whoever drives the bridge. Both travel as length-prefixed protobuf frames
//! (see [`crate::codec`]).

use prost::Message;

/// A request to run one named network operation.
///
/// Optional fields map to parameters that only some operations read.
#[derive(Clone, PartialEq, Message)]
pub struct NetworkCommand {
    /// Caller-chosen id echoed back in every result for this request
    #[prost(int32, tag = "1")]
    pub id: i32,

    /// Operation name, e.g. `setWifiTethering`
    #[prost(string, tag = "2")]
    pub cmd: String,

    #[prost(string, optional, tag = "3")]
    pub ifname: Option<String>,
    #[prost(string, optional, tag = "4")]
    pub ip: Option<String>,
    #[prost(string, optional, tag = "5")]
    pub prefix: Option<String>,
    #[prost(string, optional, tag = "6")]
    pub link: Option<String>,
    #[prost(string, optional, tag = "7")]
    pub mode: Option<String>,

    #[prost(bool, optional, tag = "8")]
    pub report: Option<bool>,
    #[prost(bool, optional, tag = "9")]
    pub is_async: Option<bool>,
    #[prost(bool, optional, tag = "10")]
    pub enabled: Option<bool>,
    #[prost(bool, optional, tag = "11")]
    pub enable: Option<bool>,

    #[prost(string, optional, tag = "12")]
    pub wifictrlinterfacename: Option<String>,
    #[prost(string, optional, tag = "13")]
    pub internal_ifname: Option<String>,
    #[prost(string, optional, tag = "14")]
    pub external_ifname: Option<String>,

    #[prost(string, optional, tag = "15")]
    pub ssid: Option<String>,
    #[prost(string, optional, tag = "16")]
    pub security: Option<String>,
    #[prost(string, optional, tag = "17")]
    pub key: Option<String>,

    #[prost(string, optional, tag = "18")]
    pub wifi_start_ip: Option<String>,
    #[prost(string, optional, tag = "19")]
    pub wifi_end_ip: Option<String>,
    #[prost(string, optional, tag = "20")]
    pub usb_start_ip: Option<String>,
    #[prost(string, optional, tag = "21")]
    pub usb_end_ip: Option<String>,

    #[prost(string, optional, tag = "22")]
    pub dns1: Option<String>,
    #[prost(string, optional, tag = "23")]
    pub dns2: Option<String>,
    #[prost(string, optional, tag = "24")]
    pub dns1_str: Option<String>,
    #[prost(string, optional, tag = "25")]
    pub dns2_str: Option<String>,

    #[prost(string, optional, tag = "26")]
    pub start_ip: Option<String>,
    #[prost(string, optional, tag = "27")]
    pub end_ip: Option<String>,
    #[prost(string, optional, tag = "28")]
    pub server_ip: Option<String>,
    #[prost(string, optional, tag = "29")]
    pub mask_length: Option<String>,

    #[prost(string, optional, tag = "30")]
    pub pre_internal_ifname: Option<String>,
    #[prost(string, optional, tag = "31")]
    pub pre_external_ifname: Option<String>,
    #[prost(string, optional, tag = "32")]
    pub cur_internal_ifname: Option<String>,
    #[prost(string, optional, tag = "33")]
    pub cur_external_ifname: Option<String>,

    /// Alert threshold in bytes
    #[prost(int64, optional, tag = "34")]
    pub threshold: Option<i64>,
}

impl NetworkCommand {
    /// Create a request with only the id and operation name set
    pub fn new(id: i32, cmd: impl Into<String>) -> Self {
        Self {
            id,
            cmd: cmd.into(),
            ..Default::default()
        }
    }
}

/// Outcome of a request, or an unsolicited daemon broadcast.
#[derive(Clone, PartialEq, Message)]
pub struct NetworkResult {
    #[prost(int32, tag = "1")]
    pub id: i32,

    /// Synchronous acknowledgement for requests sent with `is_async = false`
    #[prost(bool, tag = "2")]
    pub ret: bool,

    #[prost(bool, tag = "3")]
    pub broadcast: bool,
    #[prost(string, tag = "4")]
    pub topic: String,
    #[prost(string, tag = "5")]
    pub reason: String,

    /// Daemon response code of the last command in the chain
    #[prost(uint32, tag = "6")]
    pub result_code: u32,
    /// Reason text of the last command, multi-line replies joined with NUL
    #[prost(string, tag = "7")]
    pub result_reason: String,
    #[prost(bool, tag = "8")]
    pub error: bool,

    #[prost(bool, tag = "9")]
    pub enable: bool,
    /// USB function switch outcome
    #[prost(bool, tag = "10")]
    pub result: bool,
    /// DHCP server outcome
    #[prost(bool, tag = "11")]
    pub success: bool,

    #[prost(double, tag = "12")]
    pub rx_bytes: f64,
    #[prost(double, tag = "13")]
    pub tx_bytes: f64,

    #[prost(string, tag = "14")]
    pub cur_internal_ifname: String,
    #[prost(string, tag = "15")]
    pub cur_external_ifname: String,
}

impl NetworkResult {
    /// Result carrying one command's response code and reason
    pub fn response(code: u32, reason: impl Into<String>) -> Self {
        Self {
            result_code: code,
            result_reason: reason.into(),
            ..Default::default()
        }
    }

    /// Result delivered for an unsolicited daemon message
    pub fn broadcast(topic: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            broadcast: true,
            topic: topic.into(),
            reason: reason.into(),
            ..Default::default()
        }
    }

    /// Immediate acknowledgement of a synchronous request
    pub fn ack(id: i32) -> Self {
        Self {
            id,
            ret: true,
            ..Default::default()
        }
    }
}
