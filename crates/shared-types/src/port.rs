use std::net::IpAddr;
use std::str::FromStr;

use ipnet::IpNet;
use mac_address::MacAddress;
use serde::{Deserialize, Serialize};

use crate::error::SharedTypeError;
use crate::network::IpVersion;

/// Value the provider reports in `binding_vif_type` when it could not bind
/// a port to the requested host.
pub const BINDING_FAILED_VIF_TYPE: &str = "binding_failed";

/// vNIC type hint passed to the provider with every bound port.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum VnicType {
    #[default]
    Baremetal,
    Normal,
    Direct,
    DirectPhysical,
    Macvtap,
}

impl std::fmt::Display for VnicType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VnicType::Baremetal => write!(f, "baremetal"),
            VnicType::Normal => write!(f, "normal"),
            VnicType::Direct => write!(f, "direct"),
            VnicType::DirectPhysical => write!(f, "direct-physical"),
            VnicType::Macvtap => write!(f, "macvtap"),
        }
    }
}

impl FromStr for VnicType {
    type Err = SharedTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "baremetal" => Ok(VnicType::Baremetal),
            "normal" => Ok(VnicType::Normal),
            "direct" => Ok(VnicType::Direct),
            "direct-physical" => Ok(VnicType::DirectPhysical),
            "macvtap" => Ok(VnicType::Macvtap),
            other => Err(SharedTypeError::Unsupported(format!("vnic type '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortStatus {
    #[serde(rename = "ACTIVE")]
    Active,
    #[serde(rename = "DOWN")]
    Down,
    #[serde(rename = "BUILD")]
    Build,
    #[serde(rename = "ERROR")]
    Error,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for PortStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortStatus::Active => write!(f, "ACTIVE"),
            PortStatus::Down => write!(f, "DOWN"),
            PortStatus::Build => write!(f, "BUILD"),
            PortStatus::Error => write!(f, "ERROR"),
            PortStatus::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedIp {
    pub subnet_id: Option<String>,
    pub ip_address: IpAddr,
}

/// Port as reported by the network provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub id: String,
    pub network_id: String,
    pub device_id: String,
    pub device_owner: String,
    #[serde(default)]
    pub fixed_ips: Vec<FixedIp>,
    pub mac_address: MacAddr,
    pub status: PortStatus,
    #[serde(default)]
    pub binding_vif_type: Option<String>,
    #[serde(default)]
    pub binding_host_id: Option<String>,
    #[serde(default)]
    pub binding_vnic_type: Option<VnicType>,
}

/// Network metadata reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderNetwork {
    pub id: String,
    pub network_type: Option<String>,
    pub segmentation_id: Option<u32>,
    #[serde(default)]
    pub subnets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSubnet {
    pub id: String,
    pub cidr: IpNet,
    pub ip_version: IpVersion,
}

/// Host binding fields added to a port create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortBinding {
    pub host_id: String,
    pub vnic_type: VnicType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortCreateRequest {
    pub network_id: String,
    pub subnet_id: String,
    pub device_owner: String,
    pub device_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binding: Option<PortBinding>,
}

/// Binding progress of a port, derived from one `show_port` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortBindingState {
    Active,
    BindFailed,
    Pending,
}

impl PortBindingState {
    pub fn of(port: &Port) -> Self {
        let vif_failed = port.binding_vif_type.as_deref() == Some(BINDING_FAILED_VIF_TYPE);
        match port.status {
            PortStatus::Error => PortBindingState::BindFailed,
            _ if vif_failed => PortBindingState::BindFailed,
            PortStatus::Active => PortBindingState::Active,
            _ => PortBindingState::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacAddr(pub MacAddress);

struct MacAddrVisitor;

impl<'de> serde::de::Visitor<'de> for MacAddrVisitor {
    type Value = MacAddr;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a MAC address string")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        v.parse::<MacAddress>()
            .map(MacAddr)
            .map_err(|_| E::custom(format!("invalid MAC address: {}", v)))
    }
}

impl<'de> Deserialize<'de> for MacAddr {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(MacAddrVisitor)
    }
}

impl Serialize for MacAddr {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl FromStr for MacAddr {
    type Err = SharedTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<MacAddress>()
            .map(MacAddr)
            .map_err(|_| SharedTypeError::InvalidValue {
                field: "mac_address",
                value: s.to_string(),
            })
    }
}

impl std::fmt::Display for MacAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
