//! Error types for network allocation

use thiserror::Error;

/// Main error type for allocation and deallocation
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Fatal configuration problem; retrying cannot help.
    #[error("Bad network configuration: {message}")]
    Configuration { message: String },

    #[error("Network provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Allocation store error: {0}")]
    Store(#[from] StoreError),

    #[error("Port binding {port_id} failed")]
    BindFailed { port_id: String },

    #[error(
        "Ports are not bound during timeout for share server '{server_id}' (inactive ports: {ports:?})"
    )]
    BindTimeout {
        server_id: String,
        ports: Vec<String>,
    },

    #[error("Operation cancelled: {operation}")]
    Cancelled { operation: String },

    #[error("Invalid provider response: {message}")]
    InvalidResponse { message: String },
}

impl NetworkError {
    pub fn configuration(message: impl Into<String>) -> Self {
        NetworkError::Configuration {
            message: message.into(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, NetworkError::Configuration { .. })
    }
}

/// Errors raised by a [`crate::ProviderClient`]
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{resource} {id} not found")]
    NotFound { resource: String, id: String },

    #[error("API request failed: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("provider unavailable: {message}")]
    Unavailable { message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors raised by a [`crate::AllocationStore`]
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("{kind} {id} already exists")]
    Conflict { kind: &'static str, id: String },

    #[error("storage backend failure: {message}")]
    Backend { message: String },
}
