//! Allocation policy seam

use async_trait::async_trait;

use share_net_core::{AllocationStore, ProviderClient, RequestContext, Result};
use share_net_types::{
    AllocationRecord, Label, NetworkSpecification, PortCreateRequest, ShareServer,
};

/// Collaborators available to a policy during one call.
pub struct PolicyContext<'a> {
    pub client: &'a dyn ProviderClient,
    pub store: &'a dyn AllocationStore,
    pub label: Label,
}

/// One independently toggleable allocation behaviour.
///
/// A plugin runs the hooks of all its policies in registration order:
/// every `prepare_network`, then base allocation (calling
/// `decorate_port_request` per port), then every `after_allocate`.
#[async_trait]
pub trait AllocationPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Validate or replace the caller's network specification.
    async fn prepare_network(
        &self,
        _ctx: &RequestContext,
        _policy_ctx: &PolicyContext<'_>,
        _server: &ShareServer,
        network: Option<NetworkSpecification>,
    ) -> Result<Option<NetworkSpecification>> {
        Ok(network)
    }

    fn decorate_port_request(&self, _server: &ShareServer, _request: &mut PortCreateRequest) {}

    async fn after_allocate(
        &self,
        _ctx: &RequestContext,
        _policy_ctx: &PolicyContext<'_>,
        _server: &ShareServer,
        _records: &[AllocationRecord],
    ) -> Result<()> {
        Ok(())
    }
}
