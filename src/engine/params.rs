//! Operation parameters
//!
//! One flat record holds every field a chain step may read or write. It is
//! built from the caller's request and then owned by the chain, so later
//! steps see what earlier steps stored (the interface list, the rx counter).

use netd_shared::NetworkCommand;

use crate::properties::{InterfaceProperties, PropertyStore};

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkParams {
    pub id: i32,
    pub cmd: String,

    pub ifname: String,
    pub ip: String,
    pub prefix: String,
    pub link: String,
    pub mode: String,

    pub report: bool,
    pub is_async: bool,
    pub enabled: bool,
    pub enable: bool,

    pub wifictrlinterfacename: String,
    pub internal_ifname: String,
    pub external_ifname: String,

    pub ssid: String,
    pub security: String,
    pub key: String,

    pub wifi_start_ip: String,
    pub wifi_end_ip: String,
    pub usb_start_ip: String,
    pub usb_end_ip: String,

    pub dns1: String,
    pub dns2: String,
    pub dns1_str: String,
    pub dns2_str: String,

    pub start_ip: String,
    pub end_ip: String,
    pub server_ip: String,
    pub mask_length: String,

    pub pre_internal_ifname: String,
    pub pre_external_ifname: String,
    pub cur_internal_ifname: String,
    pub cur_external_ifname: String,

    pub threshold: i64,

    /// Written by the stats chain
    pub rx_bytes: f64,
    pub tx_bytes: f64,
    /// Written by the interface-list step of the disable chains
    pub interface_list: Vec<String>,
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self::from(NetworkCommand::default())
    }
}

/// Absent fields and the literal `"null"` both mean "not given"
fn text(value: Option<String>) -> String {
    match value {
        Some(s) if s != "null" => s,
        _ => String::new(),
    }
}

impl From<NetworkCommand> for NetworkParams {
    fn from(cmd: NetworkCommand) -> Self {
        Self {
            id: cmd.id,
            cmd: cmd.cmd,
            ifname: text(cmd.ifname),
            ip: text(cmd.ip),
            prefix: text(cmd.prefix),
            link: text(cmd.link),
            mode: text(cmd.mode),
            report: cmd.report.unwrap_or(false),
            is_async: cmd.is_async.unwrap_or(true),
            enabled: cmd.enabled.unwrap_or(false),
            enable: cmd.enable.unwrap_or(false),
            wifictrlinterfacename: text(cmd.wifictrlinterfacename),
            internal_ifname: text(cmd.internal_ifname),
            external_ifname: text(cmd.external_ifname),
            ssid: text(cmd.ssid),
            security: text(cmd.security),
            key: text(cmd.key),
            wifi_start_ip: text(cmd.wifi_start_ip),
            wifi_end_ip: text(cmd.wifi_end_ip),
            usb_start_ip: text(cmd.usb_start_ip),
            usb_end_ip: text(cmd.usb_end_ip),
            dns1: text(cmd.dns1),
            dns2: text(cmd.dns2),
            dns1_str: text(cmd.dns1_str),
            dns2_str: text(cmd.dns2_str),
            start_ip: text(cmd.start_ip),
            end_ip: text(cmd.end_ip),
            server_ip: text(cmd.server_ip),
            mask_length: text(cmd.mask_length),
            pre_internal_ifname: text(cmd.pre_internal_ifname),
            pre_external_ifname: text(cmd.pre_external_ifname),
            cur_internal_ifname: text(cmd.cur_internal_ifname),
            cur_external_ifname: text(cmd.cur_external_ifname),
            threshold: cmd.threshold.unwrap_or(-1),
            rx_bytes: -1.0,
            tx_bytes: -1.0,
            interface_list: Vec::new(),
        }
    }
}

impl NetworkParams {
    /// Fill the tethering fields a DHCP start request expresses differently
    pub fn derive_dhcp_fields(&mut self) {
        self.wifi_start_ip = self.start_ip.clone();
        self.wifi_end_ip = self.end_ip.clone();
        self.ip = self.server_ip.clone();
        self.prefix = self.mask_length.clone();
        self.link = "up".into();
    }

    /// Prefer the DNS servers the upstream interface publishes
    pub fn resolve_upstream_dns(&mut self, store: &dyn PropertyStore) {
        let upstream = InterfaceProperties::read(store, &self.external_ifname);
        if !upstream.dns1.is_empty() {
            self.dns1 = upstream.dns1;
        }
        if !upstream.dns2.is_empty() {
            self.dns2 = upstream.dns2;
        }
    }
}
