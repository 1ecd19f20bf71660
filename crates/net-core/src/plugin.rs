//! Caller-facing allocation plugin contract

use async_trait::async_trait;

use crate::config::PluginKind;
use crate::context::RequestContext;
use crate::Result;
use share_net_types::{AllocationRecord, Label, NetworkSpecification, ShareServer};

/// Namespace prepended to the device owner tag of every created port.
pub const DEVICE_OWNER_PREFIX: &str = "manila:";

pub const DEFAULT_DEVICE_OWNER: &str = "share";

/// Per-call allocation parameters supplied by the share back end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationOptions {
    /// Number of ports to create.
    pub count: usize,
    /// Device owner tag, sent to the provider as `DEVICE_OWNER_PREFIX + device_owner`.
    pub device_owner: String,
}

impl AllocationOptions {
    pub fn with_count(count: usize) -> Self {
        Self {
            count,
            ..Default::default()
        }
    }

    pub fn namespaced_device_owner(&self) -> String {
        format!("{}{}", DEVICE_OWNER_PREFIX, self.device_owner)
    }
}

impl Default for AllocationOptions {
    fn default() -> Self {
        Self {
            count: 1,
            device_owner: DEFAULT_DEVICE_OWNER.to_string(),
        }
    }
}

#[async_trait]
pub trait NetworkPlugin: Send + Sync {
    fn kind(&self) -> PluginKind;
    fn label(&self) -> Label;

    /// Create `options.count` provider ports for `server` and persist one
    /// allocation record per port.
    ///
    /// A failure part way through leaves the ports and records created so
    /// far in place.
    async fn allocate(
        &self,
        ctx: &RequestContext,
        server: &ShareServer,
        network: Option<NetworkSpecification>,
        options: AllocationOptions,
    ) -> Result<Vec<AllocationRecord>>;

    /// Delete every provider port recorded for `server_id` along with its
    /// record. Stops at the first provider failure after marking that
    /// record `ERROR`.
    async fn deallocate(&self, ctx: &RequestContext, server_id: &str) -> Result<()>;
}
