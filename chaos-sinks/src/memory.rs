//! An in-memory sink, mainly for assertions in tests that want to
//! inspect the exact event sequence a run produced.

use std::sync::Mutex;

use async_trait::async_trait;
use chaos_core::error::SinkError;
use chaos_core::event::Event;
use chaos_core::sink::EventSink;

/// Collects every event in memory, in emission order.
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
    closed: Mutex<bool>,
}

impl MemorySink {
    /// Create an empty memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot every event recorded so far, in order.
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().expect("MemorySink mutex poisoned").clone()
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        *self.closed.lock().expect("MemorySink mutex poisoned")
    }
}

#[async_trait]
impl EventSink for MemorySink {
    async fn emit(&self, event: &Event) -> Result<(), SinkError> {
        if self.is_closed() {
            return Err(SinkError::Closed);
        }
        self.events.lock().expect("MemorySink mutex poisoned").push(event.clone());
        Ok(())
    }

    async fn close(&self) -> Result<(), SinkError> {
        *self.closed.lock().expect("MemorySink mutex poisoned") = true;
        Ok(())
    }
}
