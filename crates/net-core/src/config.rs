//! Plugin configuration
//!
//! Each policy reads its own section; nothing is registered globally.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use share_net_types::{Label, VnicType};

/// Environment variable prefix for configuration overrides, e.g.
/// `SHARE_NETWORK_BIND__BIND_TIMEOUT=60`.
pub const ENV_PREFIX: &str = "SHARE_NETWORK";

pub const DEFAULT_BIND_TIMEOUT_SECS: u64 = 240;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid plugin kind: {0}")]
    InvalidKind(String),

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },

    #[error("Unable to determine local host name: {0}")]
    Hostname(#[from] std::io::Error),
}

/// Allocation policy composition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PluginKind {
    /// Per-tenant network, plain ports.
    #[default]
    Neutron,
    /// Every allocation pinned to the configured network and subnet.
    NeutronSingleNetwork,
    /// Ports bound to a host, allocation waits for the binding.
    NeutronBind,
    /// Single network and host binding combined.
    NeutronBindSingleNetwork,
}

impl PluginKind {
    pub fn uses_single_network(&self) -> bool {
        matches!(
            self,
            PluginKind::NeutronSingleNetwork | PluginKind::NeutronBindSingleNetwork
        )
    }

    pub fn uses_binding(&self) -> bool {
        matches!(
            self,
            PluginKind::NeutronBind | PluginKind::NeutronBindSingleNetwork
        )
    }
}

impl std::fmt::Display for PluginKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PluginKind::Neutron => write!(f, "neutron"),
            PluginKind::NeutronSingleNetwork => write!(f, "neutron-single-network"),
            PluginKind::NeutronBind => write!(f, "neutron-bind"),
            PluginKind::NeutronBindSingleNetwork => write!(f, "neutron-bind-single-network"),
        }
    }
}

impl std::str::FromStr for PluginKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "neutron" => Ok(PluginKind::Neutron),
            "neutron-single-network" | "neutron_single_network" => {
                Ok(PluginKind::NeutronSingleNetwork)
            }
            "neutron-bind" | "neutron_bind" => Ok(PluginKind::NeutronBind),
            "neutron-bind-single-network" | "neutron_bind_single_network" => {
                Ok(PluginKind::NeutronBindSingleNetwork)
            }
            _ => Err(ConfigError::InvalidKind(s.to_string())),
        }
    }
}

/// Static network used by single network plugins. Both ids must be set and
/// the subnet must belong to the network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SingleNetworkConfig {
    pub network_id: Option<String>,
    pub subnet_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindConfig {
    pub vnic_type: VnicType,
    /// Seconds to wait for all ports of an allocation to become active.
    pub bind_timeout: u64,
    /// Host the ports are bound to. Defaults to the local host name.
    pub host_id: Option<String>,
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            vnic_type: VnicType::default(),
            bind_timeout: DEFAULT_BIND_TIMEOUT_SECS,
            host_id: None,
        }
    }
}

impl BindConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.bind_timeout)
    }

    /// Explicit host id, falling back to the local host name.
    pub fn host_id(&self) -> Result<String, ConfigError> {
        match &self.host_id {
            Some(host_id) => Ok(host_id.clone()),
            None => Ok(hostname::get()?.to_string_lossy().into_owned()),
        }
    }
}

/// Full plugin configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    pub plugin: PluginKind,
    pub label: Label,
    pub single_network: SingleNetworkConfig,
    pub bind: BindConfig,
}

impl PluginConfig {
    /// Load configuration from file, format picked by extension, with
    /// environment overrides on top.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: PluginConfig = settings.try_deserialize()?;
        config.validate()?;

        log::info!(
            "Loaded {} plugin configuration (label: {}) from {}",
            config.plugin,
            config.label,
            path.as_ref().display()
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.plugin.uses_binding() && self.bind.bind_timeout == 0 {
            return Err(ConfigError::InvalidValue {
                field: "bind_timeout",
                value: self.bind.bind_timeout.to_string(),
            });
        }

        if let Some(host_id) = &self.bind.host_id {
            if host_id.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "host_id",
                    value: host_id.clone(),
                });
            }
        }

        Ok(())
    }
}
