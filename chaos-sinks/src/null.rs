//! A sink that discards every event — useful for scenarios that only
//! care about the run report, or for benchmarking the rest of the
//! pipeline without I/O in the loop.

use async_trait::async_trait;
use chaos_core::event::Event;
use chaos_core::error::SinkError;
use chaos_core::sink::EventSink;

/// Discards every event it receives.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NullSink {
    /// Create a new null sink.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventSink for NullSink {
    async fn emit(&self, _event: &Event) -> Result<(), SinkError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), SinkError> {
        Ok(())
    }
}
