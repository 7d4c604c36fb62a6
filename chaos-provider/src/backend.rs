//! The backend seam (spec §4.5 `ProviderAdapter`, spec §6 concrete
//! provider SDKs as external collaborators) — what a concrete provider
//! integration implements, and what [`crate::adapter::ProviderAdapter`]
//! wraps transparently.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::ProviderError;
use crate::types::{CallContext, CompletionRequest, CompletionResponse};

/// One raw chunk of a streaming response, exactly as the wire format
/// would deliver it (an SSE `event:`/`data:` block, a chunked-encoding
/// frame, whatever the concrete provider uses).
pub type ChunkStream = Pin<Box<dyn Stream<Item = Vec<u8>> + Send>>;

/// An LLM provider integration, real or simulated.
///
/// Kept `async-trait`-based rather than using `impl Future` return types
/// so both a concrete provider SDK and [`crate::adapter::ProviderAdapter`]
/// (which wraps one `Backend` and is itself a `Backend`) can be stored
/// as `Arc<dyn Backend>` — the harness always talks to "a backend",
/// never to a specific provider's concrete type.
#[async_trait]
pub trait Backend: Send + Sync {
    /// The provider's name, used in events and reports.
    fn name(&self) -> &str;

    /// Complete a request in one shot.
    async fn complete(
        &self,
        request: &CompletionRequest,
        ctx: &CallContext,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Complete a request as a stream of raw chunks.
    async fn complete_stream(
        &self,
        request: &CompletionRequest,
        ctx: &CallContext,
    ) -> Result<ChunkStream, ProviderError>;
}
