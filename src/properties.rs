//! Platform property store
//!
//! Named string properties the engine reads and writes: per-interface
//! gateway/DNS, the USB function lists, the DNS change counter. Missing keys
//! read as the empty string. There is no transactional guarantee.

use std::collections::HashMap;

/// Active USB function list
pub const SYS_USB_CONFIG: &str = "sys.usb.config";
/// USB function list the platform falls back to
pub const PERSIST_SYS_USB_CONFIG: &str = "persist.sys.usb.config";
/// USB functions the platform reports as running
pub const SYS_USB_STATE: &str = "sys.usb.state";
/// Platform version used to pick the wire dialect
pub const BUILD_VERSION_SDK: &str = "ro.build.version.sdk";

pub const NET_DNS1: &str = "net.dns1";
pub const NET_DNS2: &str = "net.dns2";
pub const NET_DNS_CHANGE: &str = "net.dnschange";

/// Read/write access to named string properties
pub trait PropertyStore: Send {
    /// Value of `key`, or an empty string if unset
    fn get(&self, key: &str) -> String;

    fn set(&mut self, key: &str, value: &str);
}

/// In-process property table
#[derive(Debug, Clone, Default)]
pub struct MemoryPropertyStore {
    values: HashMap<String, String>,
}

impl MemoryPropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `values`
    pub fn with_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PropertyStore for MemoryPropertyStore {
    fn get(&self, key: &str) -> String {
        self.values.get(key).cloned().unwrap_or_default()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

/// Gateway and DNS properties published for one interface
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceProperties {
    pub gateway: String,
    pub dns1: String,
    pub dns2: String,
}

impl InterfaceProperties {
    pub fn read(store: &dyn PropertyStore, ifname: &str) -> Self {
        Self {
            gateway: store.get(&format!("net.{}.gw", ifname)),
            dns1: store.get(&format!("net.{}.dns1", ifname)),
            dns2: store.get(&format!("net.{}.dns2", ifname)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_reads_empty() {
        let store = MemoryPropertyStore::new();
        assert_eq!(store.get(SYS_USB_STATE), "");
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_overwrites() {
        let mut store = MemoryPropertyStore::with_values([(SYS_USB_CONFIG, "mtp")]);
        store.set(SYS_USB_CONFIG, "rndis,adb");
        assert_eq!(store.get(SYS_USB_CONFIG), "rndis,adb");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_interface_properties() {
        let store = MemoryPropertyStore::with_values([
            ("net.rmnet0.gw", "10.0.0.1"),
            ("net.rmnet0.dns1", "8.8.8.8"),
        ]);

        let props = InterfaceProperties::read(&store, "rmnet0");
        assert_eq!(props.gateway, "10.0.0.1");
        assert_eq!(props.dns1, "8.8.8.8");
        assert_eq!(props.dns2, "");
    }
}
