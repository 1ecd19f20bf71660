//! Share network allocation plugins
//!
//! [`BasePlugin`] creates and deletes provider ports and their records.
//! Optional [`AllocationPolicy`] implementations narrow the network before
//! allocation, add fields to port requests and finish the allocation
//! afterwards:
//!
//! - [`SingleNetworkPolicy`] pins every allocation to one configured network
//! - [`BindPolicy`] binds ports to a host and waits for them to go active

pub mod base;
pub mod bind;
pub mod factory;
pub mod policy;
pub mod single_network;


pub use base::BasePlugin;
pub use bind::{wait_for_ports_bind, BindPolicy, BIND_POLL_INTERVAL};
pub use factory::NetworkPluginFactory;
pub use policy::{AllocationPolicy, PolicyContext};
pub use single_network::SingleNetworkPolicy;
