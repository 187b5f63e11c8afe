use crate::core::RelayError;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// Ordered text fragments produced by an upstream generation call.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, RelayError>> + Send + 'static>>;

#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Opens one streaming generation call for `prompt`.
    ///
    /// The returned stream is lazy and finite: it ends when the upstream
    /// signals completion, and yields an `Err` if production fails midway.
    async fn stream_generate(&self, prompt: &str) -> Result<FragmentStream, RelayError>;
}
