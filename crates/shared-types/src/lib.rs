pub mod allocation;
pub mod error;
pub mod network;
pub mod port;

pub use allocation::{AllocationRecord, AllocationStatus, AllocationUpdate, Label};
pub use error::{SharedResult, SharedTypeError};
pub use network::{IpVersion, NetworkSpecUpdate, NetworkSpecification, ShareServer};
pub use port::{
    FixedIp, MacAddr, Port, PortBinding, PortBindingState, PortCreateRequest, PortStatus,
    ProviderNetwork, ProviderSubnet, VnicType, BINDING_FAILED_VIF_TYPE,
};
