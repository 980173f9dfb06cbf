//! Bridge configuration

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "NETD_BRIDGE_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "BridgeConfig::default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub netd: NetdSettings,
    #[serde(default)]
    pub control: ControlSettings,
    /// Initial contents of the property store
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
            netd: NetdSettings::default(),
            control: ControlSettings::default(),
            properties: BTreeMap::new(),
        }
    }
}

impl BridgeConfig {
    fn default_log_level() -> String {
        "info".into()
    }

    /// Parse a config from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&text)
    }

    /// Load from the first CLI argument or `NETD_BRIDGE_CONFIG`, else defaults
    pub fn load_from_env() -> Result<Self> {
        let path = std::env::args()
            .nth(1)
            .or_else(|| std::env::var(CONFIG_ENV).ok());

        match path {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        NetdAddress::parse(&self.netd.address)?;
        if self.netd.reconnect_delay_ms == 0 {
            return Err(anyhow!("netd.reconnect_delay_ms must be greater than zero"));
        }
        if self.netd.max_reconnect_delay_ms < self.netd.reconnect_delay_ms {
            return Err(anyhow!(
                "netd.max_reconnect_delay_ms must not be below netd.reconnect_delay_ms"
            ));
        }
        Ok(())
    }
}

/// Daemon socket settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetdSettings {
    /// `unix:<path>` or `tcp:<host>:<port>`
    pub address: String,
    pub reconnect_delay_ms: u64,
    pub max_reconnect_delay_ms: u64,
    pub connect_timeout_ms: u64,
}

impl Default for NetdSettings {
    fn default() -> Self {
        Self {
            address: "unix:/dev/socket/netd".into(),
            reconnect_delay_ms: 1000,
            max_reconnect_delay_ms: 30_000,
            connect_timeout_ms: 5000,
        }
    }
}

impl NetdSettings {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn max_reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.max_reconnect_delay_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Where the daemon listens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetdAddress {
    Unix(String),
    Tcp(String),
}

impl NetdAddress {
    pub fn parse(address: &str) -> Result<Self> {
        if let Some(path) = address.strip_prefix("unix:") {
            if path.is_empty() {
                return Err(anyhow!("Empty unix socket path in netd address"));
            }
            Ok(NetdAddress::Unix(path.into()))
        } else if let Some(addr) = address.strip_prefix("tcp:") {
            if addr.is_empty() {
                return Err(anyhow!("Empty tcp address in netd address"));
            }
            Ok(NetdAddress::Tcp(addr.into()))
        } else {
            Err(anyhow!(
                "Invalid netd address '{}': expected unix:<path> or tcp:<host>:<port>",
                address
            ))
        }
    }
}

impl std::fmt::Display for NetdAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetdAddress::Unix(path) => write!(f, "unix:{}", path),
            NetdAddress::Tcp(addr) => write!(f, "tcp:{}", addr),
        }
    }
}

/// Control channel settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlSettings {
    pub bind_addr: String,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:7700".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.netd.address, "unix:/dev/socket/netd");
        assert_eq!(config.control.bind_addr, "127.0.0.1:7700");
        assert!(config.properties.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let config = BridgeConfig::from_toml(
            r#"
            log_level = "debug"

            [netd]
            address = "tcp:127.0.0.1:7070"
            reconnect_delay_ms = 200
            max_reconnect_delay_ms = 5000
            connect_timeout_ms = 1000

            [control]
            bind_addr = "0.0.0.0:7701"

            [properties]
            "ro.build.version.sdk" = "19"
            "persist.sys.usb.config" = "mtp,adb"
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.log_level, "debug");
        assert_eq!(
            NetdAddress::parse(&config.netd.address).expect("address"),
            NetdAddress::Tcp("127.0.0.1:7070".into())
        );
        assert_eq!(config.netd.reconnect_delay(), Duration::from_millis(200));
        assert_eq!(config.control.bind_addr, "0.0.0.0:7701");
        assert_eq!(
            config.properties.get("persist.sys.usb.config").map(String::as_str),
            Some("mtp,adb")
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = BridgeConfig::from_toml("[properties]\n\"ro.build.version.sdk\" = \"15\"\n")
            .expect("config should parse");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.netd.connect_timeout_ms, 5000);
        assert_eq!(config.properties.len(), 1);
    }

    #[test]
    fn test_invalid_address_rejected() {
        assert!(NetdAddress::parse("/dev/socket/netd").is_err());
        assert!(NetdAddress::parse("unix:").is_err());
        assert!(BridgeConfig::from_toml("[netd]\naddress = \"serial:/dev/ttyS0\"\nreconnect_delay_ms = 1\nmax_reconnect_delay_ms = 1\nconnect_timeout_ms = 1\n").is_err());
    }

    #[test]
    fn test_backoff_bounds_validated() {
        let mut config = BridgeConfig::default();
        config.netd.max_reconnect_delay_ms = 10;
        assert!(config.validate().is_err());
    }
}
