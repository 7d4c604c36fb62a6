//! Errors a [`crate::backend::Backend`] may report.

use thiserror::Error;

/// A real (non-injected) failure talking to a provider, or the shape a
/// matching injected fault takes once reported to a caller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProviderError {
    /// The provider rejected the call as rate-limited.
    #[error("rate limited")]
    RateLimited,
    /// The call did not complete within the harness's deadline.
    #[error("call timed out")]
    Timeout,
    /// The provider reported a server-side failure.
    #[error("server error")]
    ServerError,
    /// The provider rejected the call's credentials.
    #[error("authentication failed")]
    AuthError,
    /// The provider "succeeded" but the response couldn't be interpreted.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    /// A chaos rule's fault factory misbehaved — this is a scenario-fatal
    /// condition (spec §4.3), not an ordinary provider failure, and must
    /// never be retried or mistaken for a real `ServerError`.
    #[error(transparent)]
    FactoryFailure(#[from] AdapterError),
    /// Anything else.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ProviderError {
    /// Whether retrying the same call might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::RateLimited | ProviderError::ServerError | ProviderError::Timeout)
    }

    /// Map a LLM-stage [`chaos_core::fault::FaultKind`] to the error an
    /// agent would observe if the real provider had failed that way
    /// (spec §4.5: "raise the mapped error... without contacting the
    /// real provider").
    pub fn from_injected_fault(fault: &chaos_core::fault::FaultKind) -> Option<Self> {
        use chaos_core::fault::FaultKind;
        match fault {
            FaultKind::RateLimit => Some(ProviderError::RateLimited),
            FaultKind::Timeout => Some(ProviderError::Timeout),
            FaultKind::ServerError => Some(ProviderError::ServerError),
            FaultKind::AuthError => Some(ProviderError::AuthError),
            FaultKind::MalformedResponse => {
                Some(ProviderError::MalformedResponse("injected malformed response".to_string()))
            }
            _ => None,
        }
    }
}

/// Errors installing or uninstalling a [`crate::adapter::ProviderAdapter`]
/// on a [`crate::adapter::ProviderHandle`] (spec §4.5 install/uninstall
/// contract).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AdapterError {
    /// A chaos rule's fault factory misbehaved (spec §4.3: "a malformed
    /// factory... is a fatal scenario error").
    #[error("fault factory error: {0}")]
    FactoryFailure(String),
    /// Anything else.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
