//! The event sink protocol (spec §6 `EventSink`) — where a run's event
//! timeline goes as it's produced.

use async_trait::async_trait;

use crate::error::SinkError;
use crate::event::Event;

/// A destination for a run's event timeline.
///
/// Implementations live in `chaos-sinks` (an in-memory sink for tests, a
/// newline-delimited JSON file sink, a fan-out sink broadcasting to
/// several others). The recorder treats every sink identically and
/// never blocks a run on a slow one beyond what `emit` itself takes.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver one event.
    async fn emit(&self, event: &Event) -> Result<(), SinkError>;

    /// Flush and release any resources the sink holds. Called once, at
    /// the end of a run; further `emit` calls after `close` must fail
    /// with [`SinkError::Closed`].
    async fn close(&self) -> Result<(), SinkError>;
}
