//! Single network policy
//!
//! Pins every allocation to one statically configured provider network and
//! subnet. Callers may leave the ids unset or repeat the configured values;
//! anything else is a configuration error.

use async_trait::async_trait;
use log::debug;

use crate::policy::{AllocationPolicy, PolicyContext};
use share_net_core::{NetworkError, ProviderClient, RequestContext, Result, SingleNetworkConfig};
use share_net_types::{NetworkSpecUpdate, NetworkSpecification, ShareServer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleNetworkPolicy {
    network_id: String,
    subnet_id: String,
}

impl SingleNetworkPolicy {
    /// Validate the configured pair against the provider: both ids must be
    /// set and the subnet must belong to the network.
    pub async fn new(config: &SingleNetworkConfig, client: &dyn ProviderClient) -> Result<Self> {
        let network_id = config.network_id.clone().ok_or_else(|| {
            NetworkError::configuration("Option 'network_id' must be set for single network mode")
        })?;
        let subnet_id = config.subnet_id.clone().ok_or_else(|| {
            NetworkError::configuration("Option 'subnet_id' must be set for single network mode")
        })?;

        let network = client.get_network(&network_id).await?;
        if !network.subnets.iter().any(|id| id == &subnet_id) {
            return Err(NetworkError::configuration(format!(
                "Subnet '{}' does not belong to network '{}' (network subnets: {:?})",
                subnet_id, network_id, network.subnets
            )));
        }

        Ok(Self {
            network_id,
            subnet_id,
        })
    }

    pub fn network_id(&self) -> &str {
        &self.network_id
    }

    pub fn subnet_id(&self) -> &str {
        &self.subnet_id
    }

    /// Fields that need overriding in `network`, or an error if the caller
    /// asked for a different network.
    fn overrides(&self, network: &NetworkSpecification) -> Result<NetworkSpecUpdate> {
        if let Some(legacy_id) = &network.legacy_network_id {
            return Err(NetworkError::configuration(format!(
                "Legacy network id '{}' is not allowed in single network mode \
                 (configured network: '{}')",
                legacy_id, self.network_id
            )));
        }

        let mut update = NetworkSpecUpdate::default();
        match &network.network_id {
            None => update.network_id = Some(self.network_id.clone()),
            Some(id) if id == &self.network_id => {}
            Some(id) => {
                return Err(NetworkError::configuration(format!(
                    "Network id '{}' is not allowed, only '{}' is configured",
                    id, self.network_id
                )))
            }
        }
        match &network.subnet_id {
            None => update.subnet_id = Some(self.subnet_id.clone()),
            Some(id) if id == &self.subnet_id => {}
            Some(id) => {
                return Err(NetworkError::configuration(format!(
                    "Subnet id '{}' is not allowed, only '{}' is configured",
                    id, self.subnet_id
                )))
            }
        }
        Ok(update)
    }
}

#[async_trait]
impl AllocationPolicy for SingleNetworkPolicy {
    fn name(&self) -> &'static str {
        "single-network"
    }

    async fn prepare_network(
        &self,
        ctx: &RequestContext,
        policy_ctx: &PolicyContext<'_>,
        server: &ShareServer,
        network: Option<NetworkSpecification>,
    ) -> Result<Option<NetworkSpecification>> {
        if policy_ctx.label.is_admin() {
            let project_id = policy_ctx.client.admin_project_id();
            debug!(
                "Using configured network {} in admin project {} for share server {}",
                self.network_id, project_id, server.id
            );
            let spec = NetworkSpecification {
                id: None,
                project_id,
                ..Default::default()
            }
            .with_network(self.network_id.clone(), self.subnet_id.clone());
            return Ok(Some(spec));
        }

        let mut network = network.ok_or_else(|| {
            NetworkError::configuration(format!(
                "No share network given for share server '{}'",
                server.id
            ))
        })?;

        let update = self.overrides(&network)?;
        if update.is_empty() {
            return Ok(Some(network));
        }

        let id = network.id.clone().ok_or_else(|| {
            NetworkError::configuration(format!(
                "Share network for share server '{}' has no record id to store network '{}'",
                server.id, self.network_id
            ))
        })?;
        network.apply(&update);
        policy_ctx.store.update_network_spec(ctx, &id, update).await?;
        debug!(
            "Share network {} pinned to network {} subnet {}",
            id, self.network_id, self.subnet_id
        );
        Ok(Some(network))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use share_net_core::{MockAllocationStore, MockProviderClient};
    use share_net_types::{Label, ProviderNetwork};

    fn provider_with_network(subnets: &[&str]) -> MockProviderClient {
        let subnets: Vec<String> = subnets.iter().map(|s| s.to_string()).collect();
        let mut client = MockProviderClient::new();
        client
            .expect_get_network()
            .withf(|id| id == "net-A")
            .returning(move |id| {
                Ok(ProviderNetwork {
                    id: id.to_string(),
                    network_type: Some("vlan".to_string()),
                    segmentation_id: Some(1001),
                    subnets: subnets.clone(),
                })
            });
        client
    }

    fn config(network_id: Option<&str>, subnet_id: Option<&str>) -> SingleNetworkConfig {
        SingleNetworkConfig {
            network_id: network_id.map(str::to_string),
            subnet_id: subnet_id.map(str::to_string),
        }
    }

    async fn policy() -> SingleNetworkPolicy {
        let client = provider_with_network(&["subnet-A"]);
        SingleNetworkPolicy::new(&config(Some("net-A"), Some("subnet-A")), &client)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_new_requires_both_ids() {
        let client = MockProviderClient::new();

        let err = SingleNetworkPolicy::new(&config(None, Some("subnet-A")), &client)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("network_id"));

        let err = SingleNetworkPolicy::new(&config(Some("net-A"), None), &client)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("subnet_id"));
    }

    #[tokio::test]
    async fn test_new_rejects_foreign_subnet() {
        let client = provider_with_network(&["subnet-B", "subnet-C"]);

        let err = SingleNetworkPolicy::new(&config(Some("net-A"), Some("subnet-A")), &client)
            .await
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("subnet-A"));
        assert!(err.to_string().contains("net-A"));
    }

    #[tokio::test]
    async fn test_overrides() {
        let policy = policy().await;

        let unset = NetworkSpecification::new("sn-1", "tenant");
        let update = policy.overrides(&unset).unwrap();
        assert_eq!(update.network_id.as_deref(), Some("net-A"));
        assert_eq!(update.subnet_id.as_deref(), Some("subnet-A"));

        let matching = unset.clone().with_network("net-A", "subnet-A");
        assert!(policy.overrides(&matching).unwrap().is_empty());

        let mut partial = unset.clone();
        partial.network_id = Some("net-A".to_string());
        let update = policy.overrides(&partial).unwrap();
        assert!(update.network_id.is_none());
        assert_eq!(update.subnet_id.as_deref(), Some("subnet-A"));
    }

    #[tokio::test]
    async fn test_overrides_reject_other_values() {
        let policy = policy().await;

        let other_network =
            NetworkSpecification::new("sn-1", "tenant").with_network("other", "subnet-A");
        let message = policy.overrides(&other_network).unwrap_err().to_string();
        assert!(message.contains("'other'"));
        assert!(message.contains("'net-A'"));

        let other_subnet =
            NetworkSpecification::new("sn-1", "tenant").with_network("net-A", "other");
        let message = policy.overrides(&other_subnet).unwrap_err().to_string();
        assert!(message.contains("'other'"));
        assert!(message.contains("'subnet-A'"));

        let mut legacy = NetworkSpecification::new("sn-1", "tenant");
        legacy.legacy_network_id = Some("nova-net-1".to_string());
        assert!(policy.overrides(&legacy).unwrap_err().is_configuration());
    }

    #[tokio::test]
    async fn test_prepare_persists_only_overridden_fields() {
        let policy = policy().await;
        let client = MockProviderClient::new();
        let mut store = MockAllocationStore::new();
        store
            .expect_update_network_spec()
            .withf(|_, id, update| {
                id == "sn-1"
                    && update.network_id.is_none()
                    && update.subnet_id.as_deref() == Some("subnet-A")
            })
            .times(1)
            .returning(|_, _, _| {
                Ok(NetworkSpecification::new("sn-1", "tenant").with_network("net-A", "subnet-A"))
            });

        let policy_ctx = PolicyContext {
            client: &client,
            store: &store,
            label: Label::User,
        };
        let mut network = NetworkSpecification::new("sn-1", "tenant");
        network.network_id = Some("net-A".to_string());

        let prepared = policy
            .prepare_network(
                &RequestContext::new(),
                &policy_ctx,
                &ShareServer::new("server-1"),
                Some(network),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(prepared.subnet_id.as_deref(), Some("subnet-A"));
    }

    #[tokio::test]
    async fn test_prepare_admin_synthesizes_network() {
        let policy = policy().await;
        let mut client = MockProviderClient::new();
        client
            .expect_admin_project_id()
            .returning(|| "admin-project".to_string());
        let store = MockAllocationStore::new();

        let policy_ctx = PolicyContext {
            client: &client,
            store: &store,
            label: Label::Admin,
        };
        let prepared = policy
            .prepare_network(
                &RequestContext::new(),
                &policy_ctx,
                &ShareServer::new("server-1"),
                None,
            )
            .await
            .unwrap()
            .unwrap();

        assert!(prepared.id.is_none());
        assert_eq!(prepared.project_id, "admin-project");
        assert_eq!(prepared.network_id.as_deref(), Some("net-A"));
        assert_eq!(prepared.subnet_id.as_deref(), Some("subnet-A"));
    }
}
