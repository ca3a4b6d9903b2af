use crate::{CompleteResponse, Error, GenerateRequest, Response};

/// A backend that can turn a [`GenerateRequest`] into model output.
///
/// Each call issues exactly one request; implementations never retry.
#[async_trait::async_trait]
pub trait ContentGenerator: Send + Sync + 'static {
    /// Generate a complete reply in one round trip.
    async fn generate(&self, request: &GenerateRequest) -> Result<CompleteResponse, Error>;

    /// Generate a reply as a stream of events.
    async fn generate_stream(&self, request: &GenerateRequest) -> Result<Response, Error>;
}
