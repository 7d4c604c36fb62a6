#![deny(missing_docs)]
//! Provider interception for the agent-chaos harness (spec §4.5).
//!
//! [`backend::Backend`] is the seam a concrete (or mock) LLM provider
//! implements; [`adapter::ProviderAdapter`] wraps one transparently,
//! consulting an injector at the LLM, STREAM, and TOOL points so an
//! agent under test never has to know it's being tested.
//!
//! | Module | Responsibility |
//! |---|---|
//! | [`backend`] | The `Backend` trait and its chunk-stream type |
//! | [`adapter`] | `ProviderAdapter`, `ProviderHandle` install/uninstall seam |
//! | [`types`] | Request/response/content-block shapes |
//! | [`error`] | Provider and adapter error types |
//! | [`mock`] | A dependency-free simulated backend for tests and scenarios |

pub mod adapter;
pub mod backend;
pub mod error;
pub mod mock;
pub mod types;

pub use adapter::{ProviderAdapter, ProviderHandle, ToolOutcome};
pub use backend::{Backend, ChunkStream};
pub use error::{AdapterError, ProviderError};
pub use mock::MockBackend;
pub use types::{CallContext, CompletionRequest, CompletionResponse, ContentBlock, ToolSpec};
