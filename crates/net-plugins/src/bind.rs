//! Port binding policy
//!
//! Every port request carries a host binding. After creation the policy
//! polls the provider until all ports report active, one of them fails to
//! bind, the bind timeout elapses or the request is cancelled.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, info};
use tokio::time::Instant;

use crate::policy::{AllocationPolicy, PolicyContext};
use share_net_core::{BindConfig, NetworkError, ProviderClient, RequestContext, Result};
use share_net_types::{
    AllocationRecord, PortBinding, PortBindingState, PortCreateRequest, ShareServer, VnicType,
};

/// Pause between two polls of the port states.
pub const BIND_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindPolicy {
    host_id: String,
    vnic_type: VnicType,
    timeout: Duration,
}

impl BindPolicy {
    /// Check the provider supports port binding and resolve the host id.
    pub async fn new(config: &BindConfig, client: &dyn ProviderClient) -> Result<Self> {
        if config.bind_timeout == 0 {
            return Err(NetworkError::configuration(
                "Option 'bind_timeout' must be greater than zero",
            ));
        }

        if !client.has_port_binding_extension().await? {
            return Err(NetworkError::configuration(
                "Port binding is configured but the network provider does not support the \
                 'binding' extension",
            ));
        }

        let host_id = config
            .host_id()
            .map_err(|e| NetworkError::configuration(e.to_string()))?;

        Ok(Self {
            host_id,
            vnic_type: config.vnic_type,
            timeout: config.timeout(),
        })
    }

    pub fn host_id(&self) -> &str {
        &self.host_id
    }

    pub fn vnic_type(&self) -> VnicType {
        self.vnic_type
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl AllocationPolicy for BindPolicy {
    fn name(&self) -> &'static str {
        "bind"
    }

    fn decorate_port_request(&self, _server: &ShareServer, request: &mut PortCreateRequest) {
        request.binding = Some(PortBinding {
            host_id: self.host_id.clone(),
            vnic_type: self.vnic_type,
        });
    }

    async fn after_allocate(
        &self,
        ctx: &RequestContext,
        policy_ctx: &PolicyContext<'_>,
        server: &ShareServer,
        records: &[AllocationRecord],
    ) -> Result<()> {
        wait_for_ports_bind(policy_ctx.client, ctx, records, server, self.timeout).await
    }
}

/// Poll the ports behind `records` until every one is active.
///
/// Fails at once when a port reports a binding failure. Fails with
/// [`NetworkError::BindTimeout`] listing the ports still inactive when
/// `timeout` elapses, and with [`NetworkError::Cancelled`] when the request
/// is cancelled while waiting.
pub async fn wait_for_ports_bind(
    client: &dyn ProviderClient,
    ctx: &RequestContext,
    records: &[AllocationRecord],
    server: &ShareServer,
    timeout: Duration,
) -> Result<()> {
    info!(
        "Waiting for {} port(s) of share server {} to be bound",
        records.len(),
        server.id
    );

    let start = Instant::now();
    let mut inactive: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
    while start.elapsed() < timeout {
        inactive.clear();
        for record in records {
            let port = client.show_port(&record.id).await?;
            match PortBindingState::of(&port) {
                PortBindingState::Active => {}
                PortBindingState::BindFailed => {
                    error!(
                        "Port {} of share server {} failed to bind (status: {:?}, vif type: {:?})",
                        port.id, server.id, port.status, port.binding_vif_type
                    );
                    return Err(NetworkError::BindFailed { port_id: port.id });
                }
                PortBindingState::Pending => {
                    debug!("Port {} is not bound yet (status: {:?})", port.id, port.status);
                    inactive.push(port.id);
                }
            }
        }

        if inactive.is_empty() {
            info!("All ports of share server {} are bound", server.id);
            return Ok(());
        }

        tokio::select! {
            _ = tokio::time::sleep(BIND_POLL_INTERVAL) => {}
            _ = ctx.cancelled() => {
                return Err(NetworkError::Cancelled {
                    operation: format!("port binding for share server {}", server.id),
                });
            }
        }
    }

    error!(
        "Ports {:?} of share server {} are not bound after {:?}",
        inactive, server.id, timeout
    );
    Err(NetworkError::BindTimeout {
        server_id: server.id.clone(),
        ports: inactive,
    })
}
