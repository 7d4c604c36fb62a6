//! Test fixtures shared across the workspace, gated behind the
//! `test-utils` feature so they never ship in a release build (mirrors
//! the teacher's per-crate `test-utils`/`testing` feature convention).

use std::sync::Mutex;

use async_trait::async_trait;

use crate::assertion::{Assertion, AssertionContext, AssertionOutcome};
use crate::error::SinkError;
use crate::event::Event;
use crate::sink::EventSink;

/// A seeded, deterministic `[0.0, 1.0)` generator for
/// [`crate::trigger::Trigger::WithProbability`] in tests — a tiny
/// xorshift, not `rand`, so the workspace's own tests don't need to pin
/// a particular `rand` version's output to stay reproducible.
pub struct SeededDraw {
    state: u64,
}

impl SeededDraw {
    /// Create a generator from a seed. A seed of `0` is remapped to a
    /// fixed nonzero value, since xorshift is fixed-point at zero.
    pub fn new(seed: u64) -> Self {
        Self { state: if seed == 0 { 0x9E3779B97F4A7C15 } else { seed } }
    }

    /// Draw the next value in `[0.0, 1.0)`.
    pub fn next(&mut self) -> f64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        (x >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Borrow a closure over this generator, for
    /// [`crate::trigger::Trigger::evaluate`].
    pub fn as_draw_fn(&mut self) -> impl FnMut() -> f64 + '_ {
        move || self.next()
    }
}

/// An [`EventSink`] that records every event in memory, for assertions
/// in tests.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Event>>,
    closed: Mutex<bool>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot every event recorded so far.
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().expect("RecordingSink mutex poisoned").clone()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn emit(&self, event: &Event) -> Result<(), SinkError> {
        if *self.closed.lock().expect("RecordingSink mutex poisoned") {
            return Err(SinkError::Closed);
        }
        self.events.lock().expect("RecordingSink mutex poisoned").push(event.clone());
        Ok(())
    }

    async fn close(&self) -> Result<(), SinkError> {
        *self.closed.lock().expect("RecordingSink mutex poisoned") = true;
        Ok(())
    }
}

/// An [`Assertion`] that always passes, for exercising the assertion
/// engine's plumbing without a real check.
#[derive(Debug)]
pub struct AlwaysPass(pub &'static str);

#[async_trait]
impl Assertion for AlwaysPass {
    fn name(&self) -> &str {
        self.0
    }

    async fn check(&self, _ctx: &dyn AssertionContext) -> AssertionOutcome {
        AssertionOutcome::pass()
    }
}

/// An [`Assertion`] that always fails, for exercising failure handling.
#[derive(Debug)]
pub struct AlwaysFail(pub &'static str);

#[async_trait]
impl Assertion for AlwaysFail {
    fn name(&self) -> &str {
        self.0
    }

    async fn check(&self, _ctx: &dyn AssertionContext) -> AssertionOutcome {
        AssertionOutcome::fail("AlwaysFail always fails")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_draw_is_deterministic_for_a_given_seed() {
        let mut a = SeededDraw::new(42);
        let mut b = SeededDraw::new(42);
        let sequence_a: Vec<f64> = (0..10).map(|_| a.next()).collect();
        let sequence_b: Vec<f64> = (0..10).map(|_| b.next()).collect();
        assert_eq!(sequence_a, sequence_b);
    }

    #[test]
    fn seeded_draw_stays_in_unit_range() {
        let mut draw = SeededDraw::new(7);
        for _ in 0..1000 {
            let v = draw.next();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[tokio::test]
    async fn recording_sink_rejects_emit_after_close() {
        use crate::id::TraceId;
        use crate::event::EventType;

        let sink = RecordingSink::new();
        let event = Event::new(TraceId::new("t1"), None, None, EventType::TraceStart, serde_json::json!({}));
        sink.emit(&event).await.unwrap();
        sink.close().await.unwrap();
        let err = sink.emit(&event).await.unwrap_err();
        assert!(matches!(err, SinkError::Closed));
        assert_eq!(sink.events().len(), 1);
    }
}
