//! Fans one event stream out to several sinks at once — e.g. a memory
//! sink for an in-process caller alongside a file sink for the run's
//! permanent artifact.

use std::sync::Arc;

use async_trait::async_trait;
use chaos_core::error::SinkError;
use chaos_core::event::Event;
use chaos_core::sink::EventSink;

/// Delivers every event to each of a fixed list of sinks.
///
/// `emit` fans out concurrently and succeeds only if every sink
/// accepted the event; `close` closes every sink regardless of earlier
/// failures, returning the first error encountered, if any.
pub struct FanOutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanOutSink {
    /// Build a fan-out sink over the given sinks, delivered in order.
    pub fn new(sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self { sinks }
    }
}

#[async_trait]
impl EventSink for FanOutSink {
    async fn emit(&self, event: &Event) -> Result<(), SinkError> {
        let results = futures::future::join_all(self.sinks.iter().map(|s| s.emit(event))).await;
        for result in results {
            result?;
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), SinkError> {
        let results = futures::future::join_all(self.sinks.iter().map(|s| s.close())).await;
        let mut first_err = None;
        for result in results {
            if let Err(err) = result {
                tracing::warn!(error = %err, "a fanned-out sink failed to close");
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
