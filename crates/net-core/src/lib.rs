//! Share network allocation core
//!
//! Error taxonomy, collaborator seams and configuration shared by the
//! allocation plugins.

pub mod config;
pub mod context;
pub mod error;
pub mod plugin;
pub mod provider;
pub mod store;


pub use config::{BindConfig, ConfigError, PluginConfig, PluginKind, SingleNetworkConfig};
pub use context::RequestContext;
pub use error::{NetworkError, ProviderError, StoreError};
pub use plugin::{AllocationOptions, NetworkPlugin, DEFAULT_DEVICE_OWNER, DEVICE_OWNER_PREFIX};
pub use provider::{Capability, ProviderClient, ProviderConnector};
pub use store::{AllocationStore, MemoryAllocationStore};

#[cfg(any(test, feature = "mock"))]
pub use provider::{MockProviderClient, MockProviderConnector};
#[cfg(any(test, feature = "mock"))]
pub use store::MockAllocationStore;

pub use share_net_types as types;

/// Result type for allocation operations
pub type Result<T> = std::result::Result<T, NetworkError>;
