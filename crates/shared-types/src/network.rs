use std::fmt;

use ipnet::IpNet;
use serde::{Deserialize, Serialize};

use crate::error::SharedTypeError;

/// IP protocol version of a provider subnet, serialized as `4` or `6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum IpVersion {
    V4,
    V6,
}

impl TryFrom<u8> for IpVersion {
    type Error = SharedTypeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            4 => Ok(IpVersion::V4),
            6 => Ok(IpVersion::V6),
            other => Err(SharedTypeError::InvalidValue {
                field: "ip_version",
                value: other.to_string(),
            }),
        }
    }
}

impl From<IpVersion> for u8 {
    fn from(value: IpVersion) -> Self {
        match value {
            IpVersion::V4 => 4,
            IpVersion::V6 => 6,
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

/// Logical server that owns provisioned ports. Only referenced, never
/// created or destroyed by the allocator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareServer {
    pub id: String,
    pub host: Option<String>,
}

impl ShareServer {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            host: None,
        }
    }
}

/// Caller supplied description of the network a share server attaches to.
///
/// The provider discovered fields (`network_type`, `segmentation_id`,
/// `cidr`, `ip_version`) start out empty and are filled in during
/// allocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpecification {
    /// Record id in the allocation store. Synthesized specifications used by
    /// privileged instances have none.
    pub id: Option<String>,
    pub project_id: String,
    pub network_id: Option<String>,
    pub subnet_id: Option<String>,
    /// Identifier from the legacy compute-managed networking service.
    pub legacy_network_id: Option<String>,
    pub network_type: Option<String>,
    pub segmentation_id: Option<u32>,
    pub cidr: Option<IpNet>,
    pub ip_version: Option<IpVersion>,
}

impl NetworkSpecification {
    pub fn new(id: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            project_id: project_id.into(),
            ..Default::default()
        }
    }

    pub fn with_network(
        mut self,
        network_id: impl Into<String>,
        subnet_id: impl Into<String>,
    ) -> Self {
        self.network_id = Some(network_id.into());
        self.subnet_id = Some(subnet_id.into());
        self
    }

    /// Merge every field set in `update` into this specification.
    pub fn apply(&mut self, update: &NetworkSpecUpdate) {
        if let Some(network_id) = &update.network_id {
            self.network_id = Some(network_id.clone());
        }
        if let Some(subnet_id) = &update.subnet_id {
            self.subnet_id = Some(subnet_id.clone());
        }
        if let Some(network_type) = &update.network_type {
            self.network_type = Some(network_type.clone());
        }
        if let Some(segmentation_id) = update.segmentation_id {
            self.segmentation_id = Some(segmentation_id);
        }
        if let Some(cidr) = update.cidr {
            self.cidr = Some(cidr);
        }
        if let Some(ip_version) = update.ip_version {
            self.ip_version = Some(ip_version);
        }
    }
}

/// Partial update of a stored [`NetworkSpecification`]. Unset fields are
/// left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpecUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segmentation_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidr: Option<IpNet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_version: Option<IpVersion>,
}

impl NetworkSpecUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
