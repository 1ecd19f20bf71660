//! Per-request context handed to every plugin operation

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::NetworkError;

/// Identifies one caller request and carries its cancellation token.
///
/// Cancelling the token aborts an allocation at its next suspension point
/// (between port creates, between bind polls, between port deletes).
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: Uuid,
    pub project_id: Option<String>,
    cancel: CancellationToken,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            project_id: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn for_project(project_id: impl Into<String>) -> Self {
        Self {
            project_id: Some(project_id.into()),
            ..Self::new()
        }
    }

    /// Tie this context to an externally owned token, e.g. the caller's
    /// operation deadline.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once the request has been cancelled.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    /// Fail with [`NetworkError::Cancelled`] if the request was cancelled.
    pub fn check_cancelled(&self, operation: &str) -> Result<(), NetworkError> {
        if self.is_cancelled() {
            return Err(NetworkError::Cancelled {
                operation: operation.to_string(),
            });
        }
        Ok(())
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
