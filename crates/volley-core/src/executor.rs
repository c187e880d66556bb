//! The `RequestExecutor` trait: one outbound call per attempt.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::AttemptError;

/// Performs a single outbound call with one credential and the batch payload.
///
/// # Thread Safety
/// Implementations must be `Send + Sync`; one executor is shared by every
/// worker of a batch and stored as `Arc<dyn RequestExecutor>`.
#[async_trait]
pub trait RequestExecutor: Send + Sync + 'static {
    /// Returns the response body on a success status. Every other outcome,
    /// including timeouts, is an [`AttemptError`].
    async fn execute(&self, credential: &str, payload: Bytes) -> Result<Bytes, AttemptError>;

    /// Identifier of the upstream (URL or name), used in logs.
    fn endpoint(&self) -> &str;
}
