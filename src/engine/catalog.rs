//! Operation catalog
//!
//! Every chained operation is a static table of [`Step`]s ending in a
//! [`Step::Finish`], plus the [`ErrorHandler`] that runs if any step fails.
//! Steps are stateless: they read and write the chain's parameters and turn
//! them into at most one daemon command.

use std::fmt;
use std::str::FromStr;

use netd_shared::{netd, Dialect, NetworkResult};
use thiserror::Error;

use super::command::DaemonCommand;
use super::params::NetworkParams;

/// Quota large enough to never trigger; only the alert matters
pub const UNLIMITED_QUOTA: i64 = i64::MAX;

/// One unit of work in a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    WifiFirmwareReload,
    StartAccessPointDriver,
    StopAccessPointDriver,
    SetAccessPoint,
    StartSoftAp,
    StopSoftAp,
    SetInterfaceUp,
    TetherInterface,
    UntetherInterface,
    PreTetherInterfaceList,
    PostTetherInterfaceList,
    SetIpForwardingEnabled,
    TetheringStatus,
    StartTethering,
    StopTethering,
    SetDnsForwarders,
    EnableNat,
    DisableNat,
    CleanUpStream,
    CreateUpStream,
    GetRxBytes,
    GetTxBytes,
    EnableAlarm,
    DisableAlarm,
    SetQuota,
    RemoveQuota,
    SetAlarm,
    /// Deliver the operation's result
    Finish(Completion),
}

/// What running a step asks the engine to do
#[derive(Debug, Clone, PartialEq)]
pub enum StepAction {
    /// Queue this command; the chain resumes on its terminal reply
    Send(DaemonCommand),
    /// Nothing to send; continue at once with code 0 and an empty reason
    PassThrough,
    /// Post the result and drop the chain
    Complete(Completion),
}

/// Success terminal of a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    WifiTethering,
    UsbTethering,
    Dhcp,
    Stats,
    Alarm,
    Upstream,
    OperationMode,
}

/// Failure handler bound to a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorHandler {
    /// Report, then roll back the access point and tethering
    WifiTethering,
    /// Same as Wi-Fi, and also switch the USB network function off
    UsbTethering,
    /// Report with `success = false`
    Dhcp,
    /// Report the failure unchanged
    Report,
}

pub const WIFI_ENABLE_CHAIN: &[Step] = &[
    Step::WifiFirmwareReload,
    Step::StartAccessPointDriver,
    Step::SetAccessPoint,
    Step::StartSoftAp,
    Step::SetInterfaceUp,
    Step::TetherInterface,
    Step::SetIpForwardingEnabled,
    Step::TetheringStatus,
    Step::StartTethering,
    Step::SetDnsForwarders,
    Step::EnableNat,
    Step::Finish(Completion::WifiTethering),
];

pub const WIFI_DISABLE_CHAIN: &[Step] = &[
    Step::StopSoftAp,
    Step::StopAccessPointDriver,
    Step::WifiFirmwareReload,
    Step::UntetherInterface,
    Step::PreTetherInterfaceList,
    Step::PostTetherInterfaceList,
    Step::DisableNat,
    Step::SetIpForwardingEnabled,
    Step::StopTethering,
    Step::Finish(Completion::WifiTethering),
];

pub const USB_ENABLE_CHAIN: &[Step] = &[
    Step::SetInterfaceUp,
    Step::EnableNat,
    Step::SetIpForwardingEnabled,
    Step::TetherInterface,
    Step::TetheringStatus,
    Step::StartTethering,
    Step::SetDnsForwarders,
    Step::Finish(Completion::UsbTethering),
];

pub const USB_DISABLE_CHAIN: &[Step] = &[
    Step::UntetherInterface,
    Step::PreTetherInterfaceList,
    Step::PostTetherInterfaceList,
    Step::DisableNat,
    Step::SetIpForwardingEnabled,
    Step::StopTethering,
    Step::Finish(Completion::UsbTethering),
];

/// Best-effort undo after a tethering failure; runs without an error handler
pub const TETHERING_ROLLBACK_CHAIN: &[Step] = &[
    Step::StopSoftAp,
    Step::SetIpForwardingEnabled,
    Step::StopTethering,
];

pub const START_DHCP_SERVER_CHAIN: &[Step] = &[
    Step::SetInterfaceUp,
    Step::StartTethering,
    Step::Finish(Completion::Dhcp),
];

pub const STOP_DHCP_SERVER_CHAIN: &[Step] = &[Step::StopTethering, Step::Finish(Completion::Dhcp)];

pub const INTERFACE_STATS_CHAIN: &[Step] = &[
    Step::GetRxBytes,
    Step::GetTxBytes,
    Step::Finish(Completion::Stats),
];

pub const ENABLE_ALARM_CHAIN: &[Step] = &[
    Step::EnableAlarm,
    Step::SetQuota,
    Step::SetAlarm,
    Step::Finish(Completion::Alarm),
];

pub const DISABLE_ALARM_CHAIN: &[Step] = &[
    Step::RemoveQuota,
    Step::DisableAlarm,
    Step::Finish(Completion::Alarm),
];

pub const SET_ALARM_CHAIN: &[Step] = &[Step::SetAlarm, Step::Finish(Completion::Alarm)];

pub const WIFI_OPERATION_MODE_CHAIN: &[Step] = &[
    Step::WifiFirmwareReload,
    Step::Finish(Completion::OperationMode),
];

pub const UPDATE_UPSTREAM_CHAIN: &[Step] = &[
    Step::CleanUpStream,
    Step::CreateUpStream,
    Step::Finish(Completion::Upstream),
];

/// Parse a counter reply, reading anything unparsable as zero
fn parse_counter(reason: &str) -> f64 {
    reason.trim().parse().unwrap_or(0.0)
}

/// Split a joined multi-line reason into its non-empty parts
pub fn split_interface_list(reason: &str) -> Vec<String> {
    reason
        .split(netd::INTERFACE_DELIMITER)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Step {
    /// Run the step against the chain's parameters and the previous reply
    pub fn execute(self, params: &mut NetworkParams, prior: &NetworkResult, dialect: Dialect) -> StepAction {
        let sequenced = dialect.has_sequence();
        let dummy = || StepAction::Send(DaemonCommand::new(netd::DUMMY_COMMAND));
        // Another interface is still tethered; keep forwarding and tethering up
        let shared = params.interface_list.len() > 1;

        let cmd = match self {
            Step::WifiFirmwareReload => DaemonCommand::new("softap fwreload")
                .arg(&params.ifname)
                .arg(&params.mode),
            Step::StartAccessPointDriver | Step::StopAccessPointDriver if sequenced => {
                return StepAction::PassThrough;
            }
            Step::StartAccessPointDriver => DaemonCommand::new("softap start").arg(&params.ifname),
            Step::StopAccessPointDriver => DaemonCommand::new("softap stop").arg(&params.ifname),
            Step::SetAccessPoint if sequenced => DaemonCommand::new("softap set")
                .arg(&params.ifname)
                .quoted(&params.ssid)
                .arg(&params.security)
                .quoted(&params.key),
            Step::SetAccessPoint => DaemonCommand::new("softap set")
                .arg(&params.ifname)
                .arg(&params.wifictrlinterfacename)
                .quoted(&params.ssid)
                .arg(&params.security)
                .quoted(&params.key)
                .arg("6")
                .arg("0")
                .arg("8"),
            Step::StartSoftAp => DaemonCommand::new("softap startap"),
            Step::StopSoftAp => DaemonCommand::new("softap stopap"),
            Step::SetInterfaceUp => {
                let cmd = DaemonCommand::new("interface setcfg")
                    .arg(&params.ifname)
                    .arg(&params.ip)
                    .arg(&params.prefix);
                if sequenced {
                    cmd.arg(&params.link)
                } else {
                    cmd.bracketed(&params.link)
                }
            }
            Step::TetherInterface => DaemonCommand::new("tether interface add").arg(&params.ifname),
            Step::UntetherInterface => {
                DaemonCommand::new("tether interface remove").arg(&params.ifname)
            }
            Step::PreTetherInterfaceList if sequenced => DaemonCommand::new("tether interface list"),
            Step::PreTetherInterfaceList => DaemonCommand::new("tether interface list").arg("0"),
            Step::PostTetherInterfaceList => {
                params.interface_list = split_interface_list(&prior.result_reason);
                return dummy();
            }
            Step::SetIpForwardingEnabled if params.enable => DaemonCommand::new("ipfwd enable"),
            Step::SetIpForwardingEnabled if shared => return dummy(),
            Step::SetIpForwardingEnabled => DaemonCommand::new("ipfwd disable"),
            Step::TetheringStatus => DaemonCommand::new("tether status"),
            Step::StartTethering if prior.result_reason.contains("started") => return dummy(),
            Step::StartTethering => DaemonCommand::new("tether start")
                .arg(&params.wifi_start_ip)
                .arg(&params.wifi_end_ip)
                .optional_pair(&params.usb_start_ip, &params.usb_end_ip),
            Step::StopTethering if shared => return dummy(),
            Step::StopTethering => DaemonCommand::new("tether stop"),
            Step::SetDnsForwarders => DaemonCommand::new("tether dns set")
                .arg(&params.dns1)
                .arg(&params.dns2),
            Step::EnableNat => DaemonCommand::new("nat enable")
                .arg(&params.internal_ifname)
                .arg(&params.external_ifname)
                .arg("0"),
            Step::DisableNat => DaemonCommand::new("nat disable")
                .arg(&params.internal_ifname)
                .arg(&params.external_ifname)
                .arg("0"),
            Step::CleanUpStream => DaemonCommand::new("nat disable")
                .arg(&params.pre_internal_ifname)
                .arg(&params.pre_external_ifname)
                .arg("0"),
            Step::CreateUpStream => DaemonCommand::new("nat enable")
                .arg(&params.cur_internal_ifname)
                .arg(&params.cur_external_ifname)
                .arg("0"),
            Step::GetRxBytes => DaemonCommand::new("interface readrxcounter").arg(&params.ifname),
            Step::GetTxBytes => {
                params.rx_bytes = parse_counter(&prior.result_reason);
                DaemonCommand::new("interface readtxcounter").arg(&params.ifname)
            }
            Step::EnableAlarm => DaemonCommand::new("bandwidth enable"),
            Step::DisableAlarm => DaemonCommand::new("bandwidth disable"),
            Step::SetQuota => DaemonCommand::new("bandwidth setiquota")
                .arg(&params.ifname)
                .arg(UNLIMITED_QUOTA.to_string()),
            Step::RemoveQuota => DaemonCommand::new("bandwidth removeiquota").arg(&params.ifname),
            Step::SetAlarm => DaemonCommand::new("bandwidth setinterfacealert")
                .arg(&params.ifname)
                .arg(params.threshold.to_string()),
            Step::Finish(completion) => return StepAction::Complete(completion),
        };

        StepAction::Send(cmd)
    }
}

impl Completion {
    /// Build the success result from the last reply of the chain
    pub fn result(self, params: &NetworkParams, last: &NetworkResult) -> NetworkResult {
        let mut result = NetworkResult::response(last.result_code, last.result_reason.clone());
        result.id = params.id;

        match self {
            Completion::WifiTethering | Completion::UsbTethering => {
                result.enable = params.enable;
            }
            Completion::Dhcp => result.success = true,
            Completion::Stats => {
                result.rx_bytes = params.rx_bytes;
                result.tx_bytes = parse_counter(&last.result_reason);
            }
            Completion::Upstream => {
                result.cur_internal_ifname = params.cur_internal_ifname.clone();
                result.cur_external_ifname = params.cur_external_ifname.clone();
            }
            Completion::Alarm | Completion::OperationMode => {}
        }

        result
    }
}

/// Errors for request names the engine cannot run
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OperationError {
    #[error("Unknown operation: {0}")]
    Unknown(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

/// Operations a request can name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SetWifiTethering,
    SetUsbTethering,
    SetDhcpServer,
    GetNetworkInterfaceStats,
    SetNetworkInterfaceAlarm,
    EnableNetworkInterfaceAlarm,
    DisableNetworkInterfaceAlarm,
    SetWifiOperationMode,
    UpdateUpStream,
    EnableUsbRndis,
    SetDns,
}

/// Route operations belong to the platform's routing layer, not the daemon queue
const ROUTE_OPERATIONS: &[&str] = &[
    "setDefaultRouteAndDNS",
    "removeDefaultRoute",
    "addHostRoute",
    "removeHostRoute",
    "removeHostRoutes",
    "removeNetworkRoute",
];

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::SetWifiTethering => "setWifiTethering",
            Operation::SetUsbTethering => "setUSBTethering",
            Operation::SetDhcpServer => "setDhcpServer",
            Operation::GetNetworkInterfaceStats => "getNetworkInterfaceStats",
            Operation::SetNetworkInterfaceAlarm => "setNetworkInterfaceAlarm",
            Operation::EnableNetworkInterfaceAlarm => "enableNetworkInterfaceAlarm",
            Operation::DisableNetworkInterfaceAlarm => "disableNetworkInterfaceAlarm",
            Operation::SetWifiOperationMode => "setWifiOperationMode",
            Operation::UpdateUpStream => "updateUpStream",
            Operation::EnableUsbRndis => "enableUsbRndis",
            Operation::SetDns => "setDNS",
        }
    }

    /// The chain and error handler for a request, or `None` for operations
    /// that never touch the daemon
    pub fn chain(self, params: &NetworkParams) -> Option<(&'static [Step], ErrorHandler)> {
        let plan = match self {
            Operation::SetWifiTethering if params.enable => (WIFI_ENABLE_CHAIN, ErrorHandler::WifiTethering),
            Operation::SetWifiTethering => (WIFI_DISABLE_CHAIN, ErrorHandler::WifiTethering),
            Operation::SetUsbTethering if params.enable => (USB_ENABLE_CHAIN, ErrorHandler::UsbTethering),
            Operation::SetUsbTethering => (USB_DISABLE_CHAIN, ErrorHandler::UsbTethering),
            Operation::SetDhcpServer if params.enabled => (START_DHCP_SERVER_CHAIN, ErrorHandler::Dhcp),
            Operation::SetDhcpServer => (STOP_DHCP_SERVER_CHAIN, ErrorHandler::Dhcp),
            Operation::GetNetworkInterfaceStats => (INTERFACE_STATS_CHAIN, ErrorHandler::Report),
            Operation::SetNetworkInterfaceAlarm => (SET_ALARM_CHAIN, ErrorHandler::Report),
            Operation::EnableNetworkInterfaceAlarm => (ENABLE_ALARM_CHAIN, ErrorHandler::Report),
            Operation::DisableNetworkInterfaceAlarm => (DISABLE_ALARM_CHAIN, ErrorHandler::Report),
            Operation::SetWifiOperationMode => (WIFI_OPERATION_MODE_CHAIN, ErrorHandler::Report),
            Operation::UpdateUpStream => (UPDATE_UPSTREAM_CHAIN, ErrorHandler::Report),
            Operation::EnableUsbRndis | Operation::SetDns => return None,
        };
        Some(plan)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s {
            "setWifiTethering" => Operation::SetWifiTethering,
            "setUSBTethering" => Operation::SetUsbTethering,
            "setDhcpServer" => Operation::SetDhcpServer,
            "getNetworkInterfaceStats" => Operation::GetNetworkInterfaceStats,
            "setNetworkInterfaceAlarm" => Operation::SetNetworkInterfaceAlarm,
            "enableNetworkInterfaceAlarm" => Operation::EnableNetworkInterfaceAlarm,
            "disableNetworkInterfaceAlarm" => Operation::DisableNetworkInterfaceAlarm,
            "setWifiOperationMode" => Operation::SetWifiOperationMode,
            "updateUpStream" => Operation::UpdateUpStream,
            "enableUsbRndis" => Operation::EnableUsbRndis,
            "setDNS" => Operation::SetDns,
            other if ROUTE_OPERATIONS.contains(&other) => {
                return Err(OperationError::Unsupported(other.to_string()));
            }
            other => return Err(OperationError::Unknown(other.to_string())),
        };
        Ok(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sent(action: StepAction) -> String {
        match action {
            StepAction::Send(cmd) => cmd.into(),
            other => panic!("expected a command, got {:?}", other),
        }
    }

    fn wifi_params() -> NetworkParams {
        NetworkParams {
            ifname: "wlan0".into(),
            wifictrlinterfacename: "wl0.1".into(),
            ssid: "Guest AP".into(),
            security: "wpa2-psk".into(),
            key: "hunter22".into(),
            ip: "192.168.1.1".into(),
            prefix: "24".into(),
            link: "up".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_operation_names_round_trip() {
        for op in [
            Operation::SetWifiTethering,
            Operation::SetUsbTethering,
            Operation::SetDhcpServer,
            Operation::GetNetworkInterfaceStats,
            Operation::SetNetworkInterfaceAlarm,
            Operation::EnableNetworkInterfaceAlarm,
            Operation::DisableNetworkInterfaceAlarm,
            Operation::SetWifiOperationMode,
            Operation::UpdateUpStream,
            Operation::EnableUsbRndis,
            Operation::SetDns,
        ] {
            assert_eq!(op.name().parse::<Operation>(), Ok(op));
        }
    }

    #[test]
    fn test_route_operations_are_unsupported() {
        assert_eq!(
            "addHostRoute".parse::<Operation>(),
            Err(OperationError::Unsupported("addHostRoute".into()))
        );
        assert_eq!(
            "flyToTheMoon".parse::<Operation>(),
            Err(OperationError::Unknown("flyToTheMoon".into()))
        );
    }

    #[test]
    fn test_every_operation_chain_ends_in_finish() {
        for chain in [
            WIFI_ENABLE_CHAIN,
            WIFI_DISABLE_CHAIN,
            USB_ENABLE_CHAIN,
            USB_DISABLE_CHAIN,
            START_DHCP_SERVER_CHAIN,
            STOP_DHCP_SERVER_CHAIN,
            INTERFACE_STATS_CHAIN,
            ENABLE_ALARM_CHAIN,
            DISABLE_ALARM_CHAIN,
            SET_ALARM_CHAIN,
            WIFI_OPERATION_MODE_CHAIN,
            UPDATE_UPSTREAM_CHAIN,
        ] {
            assert!(matches!(chain.last(), Some(Step::Finish(_))));
            let finishes = chain.iter().filter(|s| matches!(s, Step::Finish(_))).count();
            assert_eq!(finishes, 1);
        }
        assert!(!TETHERING_ROLLBACK_CHAIN
            .iter()
            .any(|s| matches!(s, Step::Finish(_))));
    }

    #[test]
    fn test_set_access_point_per_dialect() {
        let prior = NetworkResult::default();
        let mut params = wifi_params();

        assert_eq!(
            sent(Step::SetAccessPoint.execute(&mut params, &prior, Dialect::Sequenced)),
            "softap set wlan0 \"Guest AP\" wpa2-psk \"hunter22\""
        );
        assert_eq!(
            sent(Step::SetAccessPoint.execute(&mut params, &prior, Dialect::Legacy)),
            "softap set wlan0 wl0.1 \"Guest AP\" wpa2-psk \"hunter22\" 6 0 8"
        );
    }

    #[test]
    fn test_interface_up_link_per_dialect() {
        let prior = NetworkResult::default();
        let mut params = wifi_params();

        assert_eq!(
            sent(Step::SetInterfaceUp.execute(&mut params, &prior, Dialect::Sequenced)),
            "interface setcfg wlan0 192.168.1.1 24 up"
        );
        assert_eq!(
            sent(Step::SetInterfaceUp.execute(&mut params, &prior, Dialect::Legacy)),
            "interface setcfg wlan0 192.168.1.1 24 [up]"
        );
    }

    #[test]
    fn test_access_point_driver_skipped_when_sequenced() {
        let prior = NetworkResult::default();
        let mut params = wifi_params();

        assert_eq!(
            Step::StartAccessPointDriver.execute(&mut params, &prior, Dialect::Sequenced),
            StepAction::PassThrough
        );
        assert_eq!(
            sent(Step::StopAccessPointDriver.execute(&mut params, &prior, Dialect::Legacy)),
            "softap stop wlan0"
        );
    }

    #[test]
    fn test_interface_list_per_dialect() {
        let prior = NetworkResult::default();
        let mut params = wifi_params();

        assert_eq!(
            sent(Step::PreTetherInterfaceList.execute(&mut params, &prior, Dialect::Sequenced)),
            "tether interface list"
        );
        assert_eq!(
            sent(Step::PreTetherInterfaceList.execute(&mut params, &prior, Dialect::Legacy)),
            "tether interface list 0"
        );
    }

    #[test]
    fn test_post_interface_list_guards_destructive_steps() {
        let mut params = NetworkParams {
            enable: false,
            ..Default::default()
        };
        let list = NetworkResult::response(200, "rndis0\0Tether interface list completed");

        assert_eq!(
            sent(Step::PostTetherInterfaceList.execute(&mut params, &list, Dialect::Sequenced)),
            "tether status"
        );
        assert_eq!(params.interface_list, vec!["rndis0", "Tether interface list completed"]);

        let prior = NetworkResult::response(200, "ok");
        assert_eq!(
            sent(Step::SetIpForwardingEnabled.execute(&mut params, &prior, Dialect::Sequenced)),
            "tether status"
        );
        assert_eq!(
            sent(Step::StopTethering.execute(&mut params, &prior, Dialect::Sequenced)),
            "tether status"
        );

        params.interface_list = split_interface_list("Tether interface list completed");
        assert_eq!(
            sent(Step::SetIpForwardingEnabled.execute(&mut params, &prior, Dialect::Sequenced)),
            "ipfwd disable"
        );
        assert_eq!(
            sent(Step::StopTethering.execute(&mut params, &prior, Dialect::Sequenced)),
            "tether stop"
        );
    }

    #[test]
    fn test_start_tethering() {
        let mut params = NetworkParams {
            wifi_start_ip: "192.168.1.10".into(),
            wifi_end_ip: "192.168.1.30".into(),
            usb_start_ip: "192.168.0.10".into(),
            ..Default::default()
        };
        let prior = NetworkResult::response(210, "Tethering services stopped");

        assert_eq!(
            sent(Step::StartTethering.execute(&mut params, &prior, Dialect::Sequenced)),
            "tether start 192.168.1.10 192.168.1.30"
        );

        params.usb_end_ip = "192.168.0.30".into();
        assert_eq!(
            sent(Step::StartTethering.execute(&mut params, &prior, Dialect::Sequenced)),
            "tether start 192.168.1.10 192.168.1.30 192.168.0.10 192.168.0.30"
        );

        let started = NetworkResult::response(210, "Tethering services started");
        assert_eq!(
            sent(Step::StartTethering.execute(&mut params, &started, Dialect::Sequenced)),
            "tether status"
        );
    }

    #[test]
    fn test_bandwidth_commands() {
        let prior = NetworkResult::default();
        let mut params = NetworkParams {
            ifname: "rmnet0".into(),
            threshold: 1_048_576,
            ..Default::default()
        };

        assert_eq!(
            sent(Step::SetQuota.execute(&mut params, &prior, Dialect::Sequenced)),
            "bandwidth setiquota rmnet0 9223372036854775807"
        );
        assert_eq!(
            sent(Step::SetAlarm.execute(&mut params, &prior, Dialect::Sequenced)),
            "bandwidth setinterfacealert rmnet0 1048576"
        );
        assert_eq!(
            sent(Step::RemoveQuota.execute(&mut params, &prior, Dialect::Sequenced)),
            "bandwidth removeiquota rmnet0"
        );
    }

    #[test]
    fn test_tx_step_stores_rx_counter() {
        let mut params = NetworkParams {
            ifname: "rmnet0".into(),
            ..Default::default()
        };

        let rx = NetworkResult::response(216, "52340");
        assert_eq!(
            sent(Step::GetTxBytes.execute(&mut params, &rx, Dialect::Sequenced)),
            "interface readtxcounter rmnet0"
        );
        assert_eq!(params.rx_bytes, 52340.0);

        let garbage = NetworkResult::response(216, "n/a");
        Step::GetTxBytes.execute(&mut params, &garbage, Dialect::Sequenced);
        assert_eq!(params.rx_bytes, 0.0);
    }

    #[test]
    fn test_completion_results() {
        let params = NetworkParams {
            id: 9,
            enable: true,
            rx_bytes: 100.0,
            cur_internal_ifname: "wlan0".into(),
            cur_external_ifname: "rmnet1".into(),
            ..Default::default()
        };
        let last = NetworkResult::response(216, "2048");

        let stats = Completion::Stats.result(&params, &last);
        assert_eq!(stats.id, 9);
        assert_eq!(stats.result_code, 216);
        assert_eq!(stats.rx_bytes, 100.0);
        assert_eq!(stats.tx_bytes, 2048.0);

        assert!(Completion::WifiTethering.result(&params, &last).enable);
        assert!(Completion::Dhcp.result(&params, &last).success);

        let upstream = Completion::Upstream.result(&params, &last);
        assert_eq!(upstream.cur_internal_ifname, "wlan0");
        assert_eq!(upstream.cur_external_ifname, "rmnet1");
    }

    #[test]
    fn test_chain_selection() {
        let mut params = NetworkParams::default();
        params.enable = true;
        assert_eq!(
            Operation::SetWifiTethering.chain(&params),
            Some((WIFI_ENABLE_CHAIN, ErrorHandler::WifiTethering))
        );

        params.enabled = false;
        assert_eq!(
            Operation::SetDhcpServer.chain(&params),
            Some((STOP_DHCP_SERVER_CHAIN, ErrorHandler::Dhcp))
        );
        assert_eq!(Operation::SetDns.chain(&params), None);
        assert_eq!(Operation::EnableUsbRndis.chain(&params), None);
    }
}
