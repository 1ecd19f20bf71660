//! Base allocation plugin
//!
//! Creates provider ports for a share server, records them in the
//! allocation store and deletes them again on deallocation. Policies plug
//! into [`BasePlugin::allocate`] through [`AllocationPolicy`] hooks.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use tokio::sync::OnceCell;

use crate::bind::BindPolicy;
use crate::policy::{AllocationPolicy, PolicyContext};
use crate::single_network::SingleNetworkPolicy;
use share_net_core::{
    AllocationOptions, AllocationStore, BindConfig, Capability, NetworkError, NetworkPlugin,
    PluginKind, ProviderClient, ProviderConnector, RequestContext, Result, SingleNetworkConfig,
};
use share_net_types::{
    AllocationRecord, AllocationStatus, AllocationUpdate, Label, NetworkSpecUpdate,
    NetworkSpecification, PortCreateRequest, ShareServer,
};

/// Capability every allocation needs from the provider.
const REQUIRED_CAPABILITY: Capability = Capability::ProviderNetwork;

pub struct BasePlugin {
    kind: PluginKind,
    label: Label,
    connector: Arc<dyn ProviderConnector>,
    client: OnceCell<Arc<dyn ProviderClient>>,
    store: Arc<dyn AllocationStore>,
    policies: Vec<Box<dyn AllocationPolicy>>,
}

impl BasePlugin {
    /// Plain per-tenant network plugin. The provider is not contacted until
    /// the first call that needs it.
    pub fn new(
        connector: Arc<dyn ProviderConnector>,
        store: Arc<dyn AllocationStore>,
        label: Label,
    ) -> Self {
        Self {
            kind: PluginKind::Neutron,
            label,
            connector,
            client: OnceCell::new(),
            store,
            policies: Vec::new(),
        }
    }

    /// Plugin pinned to the configured network and subnet.
    pub async fn single_network(
        connector: Arc<dyn ProviderConnector>,
        store: Arc<dyn AllocationStore>,
        label: Label,
        config: &SingleNetworkConfig,
    ) -> Result<Self> {
        let mut plugin = Self::new(connector, store, label);
        let client = plugin.provider().await?;
        let policy = SingleNetworkPolicy::new(config, client.as_ref()).await?;

        plugin.kind = PluginKind::NeutronSingleNetwork;
        plugin.policies.push(Box::new(policy));
        Ok(plugin)
    }

    /// Plugin binding every port to a host.
    pub async fn bind(
        connector: Arc<dyn ProviderConnector>,
        store: Arc<dyn AllocationStore>,
        label: Label,
        config: &BindConfig,
    ) -> Result<Self> {
        let mut plugin = Self::new(connector, store, label);
        let client = plugin.provider().await?;
        let policy = BindPolicy::new(config, client.as_ref()).await?;

        plugin.kind = PluginKind::NeutronBind;
        plugin.policies.push(Box::new(policy));
        Ok(plugin)
    }

    /// Single network pinning and host binding. Network validation runs
    /// before ports are created, the bind wait after.
    pub async fn bind_single_network(
        connector: Arc<dyn ProviderConnector>,
        store: Arc<dyn AllocationStore>,
        label: Label,
        single_network: &SingleNetworkConfig,
        bind: &BindConfig,
    ) -> Result<Self> {
        let mut plugin = Self::new(connector, store, label);
        let client = plugin.provider().await?;
        let single = SingleNetworkPolicy::new(single_network, client.as_ref()).await?;
        let binding = BindPolicy::new(bind, client.as_ref()).await?;

        plugin.kind = PluginKind::NeutronBindSingleNetwork;
        plugin.policies.push(Box::new(single));
        plugin.policies.push(Box::new(binding));
        Ok(plugin)
    }

    /// Names of the registered policies, in the order their hooks run.
    pub fn policy_names(&self) -> Vec<&'static str> {
        self.policies.iter().map(|policy| policy.name()).collect()
    }

    /// Provider handle, built on first use. Concurrent first callers share
    /// a single connection attempt.
    pub async fn provider(&self) -> Result<Arc<dyn ProviderClient>> {
        let client = self
            .client
            .get_or_try_init(|| async {
                debug!("Connecting to network provider for {} plugin", self.kind);
                self.connector.connect().await
            })
            .await?;
        Ok(Arc::clone(client))
    }

    async fn verify_provider_capability(&self, client: &dyn ProviderClient) -> Result<()> {
        let capabilities = Capability::query(client).await?;
        if !capabilities.contains(&REQUIRED_CAPABILITY) {
            return Err(NetworkError::configuration(format!(
                "The network provider does not support the '{}' extension",
                REQUIRED_CAPABILITY
            )));
        }
        Ok(())
    }

    async fn save_network_data(
        &self,
        ctx: &RequestContext,
        client: &dyn ProviderClient,
        network: &mut NetworkSpecification,
        network_id: &str,
    ) -> Result<()> {
        let info = client.get_network(network_id).await?;
        network.network_type = info.network_type.clone();
        network.segmentation_id = info.segmentation_id;

        let update = NetworkSpecUpdate {
            network_type: info.network_type,
            segmentation_id: info.segmentation_id,
            ..Default::default()
        };
        self.persist_network_update(ctx, network, update).await
    }

    async fn save_subnet_data(
        &self,
        ctx: &RequestContext,
        client: &dyn ProviderClient,
        network: &mut NetworkSpecification,
        subnet_id: &str,
    ) -> Result<()> {
        let info = client.get_subnet(subnet_id).await?;
        network.cidr = Some(info.cidr);
        network.ip_version = Some(info.ip_version);

        let update = NetworkSpecUpdate {
            cidr: Some(info.cidr),
            ip_version: Some(info.ip_version),
            ..Default::default()
        };
        self.persist_network_update(ctx, network, update).await
    }

    async fn persist_network_update(
        &self,
        ctx: &RequestContext,
        network: &NetworkSpecification,
        update: NetworkSpecUpdate,
    ) -> Result<()> {
        if self.label.is_admin() {
            debug!("Skipping share network update for admin plugin");
            return Ok(());
        }

        match &network.id {
            Some(id) => {
                self.store.update_network_spec(ctx, id, update).await?;
            }
            None => debug!("Share network has no record id, update not persisted"),
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn create_port(
        &self,
        ctx: &RequestContext,
        client: &dyn ProviderClient,
        server: &ShareServer,
        network: &NetworkSpecification,
        network_id: &str,
        subnet_id: &str,
        device_owner: &str,
    ) -> Result<AllocationRecord> {
        let mut request = PortCreateRequest {
            network_id: network_id.to_string(),
            subnet_id: subnet_id.to_string(),
            device_owner: device_owner.to_string(),
            device_id: server.id.clone(),
            binding: None,
        };
        for policy in &self.policies {
            policy.decorate_port_request(server, &mut request);
        }

        let port = client.create_port(&network.project_id, &request).await?;
        let fixed_ip = port
            .fixed_ips
            .first()
            .ok_or_else(|| NetworkError::InvalidResponse {
                message: format!("port {} was created without a fixed IP", port.id),
            })?;

        let record = AllocationRecord {
            id: port.id.clone(),
            share_server_id: server.id.clone(),
            ip_address: fixed_ip.ip_address,
            mac_address: port.mac_address,
            status: AllocationStatus::Active,
            label: self.label,
            network_type: network.network_type.clone(),
            segmentation_id: network.segmentation_id,
            ip_version: network.ip_version,
            cidr: network.cidr,
            created_at: Utc::now(),
            updated_at: None,
        };
        Ok(self.store.create_allocation(ctx, record).await?)
    }

    async fn delete_port(
        &self,
        ctx: &RequestContext,
        client: &dyn ProviderClient,
        record: &AllocationRecord,
    ) -> Result<()> {
        if let Err(e) = client.delete_port(&record.id).await {
            warn!(
                "Failed to delete port {} of share server {}: {}",
                record.id, record.share_server_id, e
            );
            self.store
                .update_allocation(
                    ctx,
                    &record.id,
                    AllocationUpdate::status(AllocationStatus::Error),
                )
                .await?;
            return Err(e.into());
        }

        self.store.delete_allocation(ctx, &record.id).await?;
        Ok(())
    }
}

/// Network and subnet ids a specification must carry by the time ports are
/// created.
fn required_ids(
    server: &ShareServer,
    network: &NetworkSpecification,
) -> Result<(String, String)> {
    match (&network.network_id, &network.subnet_id) {
        (Some(network_id), Some(subnet_id)) => Ok((network_id.clone(), subnet_id.clone())),
        _ => Err(NetworkError::configuration(format!(
            "Share network for share server '{}' must have both network id and subnet id set \
             (network_id: {:?}, subnet_id: {:?})",
            server.id, network.network_id, network.subnet_id
        ))),
    }
}

#[async_trait]
impl NetworkPlugin for BasePlugin {
    fn kind(&self) -> PluginKind {
        self.kind
    }

    fn label(&self) -> Label {
        self.label
    }

    async fn allocate(
        &self,
        ctx: &RequestContext,
        server: &ShareServer,
        network: Option<NetworkSpecification>,
        options: AllocationOptions,
    ) -> Result<Vec<AllocationRecord>> {
        info!(
            "Allocating {} network port(s) for share server {}",
            options.count, server.id
        );

        let client = self.provider().await?;
        let policy_ctx = PolicyContext {
            client: client.as_ref(),
            store: self.store.as_ref(),
            label: self.label,
        };

        let mut network = network;
        for policy in &self.policies {
            network = policy
                .prepare_network(ctx, &policy_ctx, server, network)
                .await?;
        }
        let mut network = network.ok_or_else(|| {
            NetworkError::configuration(format!(
                "No share network given for share server '{}'",
                server.id
            ))
        })?;
        let (network_id, subnet_id) = required_ids(server, &network)?;

        self.verify_provider_capability(client.as_ref()).await?;
        self.save_network_data(ctx, client.as_ref(), &mut network, &network_id)
            .await?;
        self.save_subnet_data(ctx, client.as_ref(), &mut network, &subnet_id)
            .await?;

        let device_owner = options.namespaced_device_owner();
        let mut records = Vec::with_capacity(options.count);
        for _ in 0..options.count {
            ctx.check_cancelled("allocate")?;
            let record = self
                .create_port(
                    ctx,
                    client.as_ref(),
                    server,
                    &network,
                    &network_id,
                    &subnet_id,
                    &device_owner,
                )
                .await?;
            debug!("Created port {} for share server {}", record.id, server.id);
            records.push(record);
        }

        for policy in &self.policies {
            policy
                .after_allocate(ctx, &policy_ctx, server, &records)
                .await?;
        }

        info!(
            "Allocated {} network port(s) for share server {}",
            records.len(),
            server.id
        );
        Ok(records)
    }

    async fn deallocate(&self, ctx: &RequestContext, server_id: &str) -> Result<()> {
        let records = self.store.get_allocations_for_server(ctx, server_id).await?;
        if records.is_empty() {
            debug!("No network allocations for share server {}", server_id);
            return Ok(());
        }

        info!(
            "Deallocating {} network port(s) for share server {}",
            records.len(),
            server_id
        );

        let client = self.provider().await?;
        for record in &records {
            ctx.check_cancelled("deallocate")?;
            self.delete_port(ctx, client.as_ref(), record).await?;
        }

        info!("Deallocated network ports for share server {}", server_id);
        Ok(())
    }
}
