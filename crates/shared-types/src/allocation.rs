use std::net::IpAddr;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use ipnet::IpNet;
use serde::{Deserialize, Serialize};

use crate::error::SharedTypeError;
use crate::network::IpVersion;
use crate::port::MacAddr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AllocationStatus {
    #[serde(rename = "ACTIVE")]
    Active,
    #[serde(rename = "ERROR")]
    Error,
}

impl std::fmt::Display for AllocationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllocationStatus::Active => write!(f, "ACTIVE"),
            AllocationStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// Policy label of a plugin instance. `Admin` instances serve privileged
/// share servers and never write back to the caller's network record.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    #[default]
    User,
    Admin,
}

impl Label {
    pub fn is_admin(&self) -> bool {
        matches!(self, Label::Admin)
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Label::User => write!(f, "user"),
            Label::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Label {
    type Err = SharedTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Label::User),
            "admin" => Ok(Label::Admin),
            other => Err(SharedTypeError::InvalidValue {
                field: "label",
                value: other.to_string(),
            }),
        }
    }
}

/// One record per provisioned provider port. The record id is the remote
/// port id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRecord {
    pub id: String,
    pub share_server_id: String,
    pub ip_address: IpAddr,
    pub mac_address: MacAddr,
    pub status: AllocationStatus,
    pub label: Label,
    pub network_type: Option<String>,
    pub segmentation_id: Option<u32>,
    pub ip_version: Option<IpVersion>,
    pub cidr: Option<IpNet>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Mutable fields of a stored [`AllocationRecord`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationUpdate {
    pub status: Option<AllocationStatus>,
}

impl AllocationUpdate {
    pub fn status(status: AllocationStatus) -> Self {
        Self {
            status: Some(status),
        }
    }
}
