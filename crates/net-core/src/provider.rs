//! Network provider abstractions

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ProviderError;
use share_net_types::{Port, PortCreateRequest, ProviderNetwork, ProviderSubnet};

/// Provider extensions the allocator knows how to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Provider network attributes (network type, segmentation id).
    ProviderNetwork,
    /// Host binding of ports.
    PortBinding,
}

impl Capability {
    /// Extension alias advertised by the provider.
    pub fn alias(&self) -> &'static str {
        match self {
            Capability::ProviderNetwork => "provider",
            Capability::PortBinding => "binding",
        }
    }

    pub fn from_alias(alias: &str) -> Option<Self> {
        match alias {
            "provider" => Some(Capability::ProviderNetwork),
            "binding" => Some(Capability::PortBinding),
            _ => None,
        }
    }

    /// Query the provider once and return the known capabilities it offers.
    pub async fn query(client: &dyn ProviderClient) -> Result<HashSet<Capability>, ProviderError> {
        let extensions = client.list_extensions().await?;
        Ok(extensions
            .iter()
            .filter_map(|alias| Capability::from_alias(alias))
            .collect())
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.alias())
    }
}

/// Remote SDN provider API
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Aliases of every extension the provider has loaded.
    async fn list_extensions(&self) -> Result<Vec<String>, ProviderError>;
    async fn get_network(&self, network_id: &str) -> Result<ProviderNetwork, ProviderError>;
    async fn get_subnet(&self, subnet_id: &str) -> Result<ProviderSubnet, ProviderError>;
    async fn create_port(
        &self,
        project_id: &str,
        request: &PortCreateRequest,
    ) -> Result<Port, ProviderError>;
    async fn show_port(&self, port_id: &str) -> Result<Port, ProviderError>;
    async fn delete_port(&self, port_id: &str) -> Result<(), ProviderError>;

    async fn has_port_binding_extension(&self) -> Result<bool, ProviderError> {
        let extensions = self.list_extensions().await?;
        Ok(extensions
            .iter()
            .any(|alias| alias == Capability::PortBinding.alias()))
    }

    /// Project owning ports created for privileged share servers.
    fn admin_project_id(&self) -> String;
}

/// Builds the provider client handle. Plugins call this at most once per
/// instance.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait ProviderConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn ProviderClient>, ProviderError>;
}
