//! The assertion protocol (spec §4.8 `AssertionEngine`).
//!
//! [`Assertion`] is the seam between this crate's pure data model and
//! `chaos-assert`'s concrete checks; [`AssertionContext`] is the matching
//! seam on the other side, implemented by `chaos-runtime`'s
//! `ScenarioContext` so assertions never need to know how the context is
//! actually stored.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::duration::DurationMs;
use crate::metrics::{CallRecord, CallStats, ConversationState, FaultRecord, StreamStats, TokenStats};

/// Read-only view of a run's accumulated state, as seen by an assertion.
///
/// Assertions only ever read; nothing here allows mutation, since the
/// assertion engine always runs after the state it inspects has settled
/// (spec §4.8: assertions run against the finished run, plus once per
/// turn for turn-scoped checks).
///
/// Every accessor returns an owned value rather than a reference — the
/// natural implementation (`chaos-engine`'s `MetricsStore`) guards its
/// state behind an `RwLock`, and returning borrowed data out of a lock
/// guard doesn't type-check. Run state is small enough that the clones
/// are free in practice.
pub trait AssertionContext: Send + Sync {
    /// Aggregate LLM call counters.
    fn call_stats(&self) -> CallStats;
    /// Aggregate token usage.
    fn token_stats(&self) -> TokenStats;
    /// Aggregate streaming observations.
    fn stream_stats(&self) -> StreamStats;
    /// The conversation as it stands.
    fn conversation(&self) -> ConversationState;
    /// Every completed call, in call order.
    fn history(&self) -> Vec<CallRecord>;
    /// Every fault injected so far, in injection order.
    fn fault_log(&self) -> Vec<FaultRecord>;
    /// Number of turns executed so far.
    fn turn_count(&self) -> usize;
    /// Wall-clock duration of one turn, if it has completed.
    fn turn_duration(&self, turn_index: usize) -> Option<DurationMs>;
    /// Whether one turn completed without error.
    fn turn_succeeded(&self, turn_index: usize) -> Option<bool>;
    /// The concatenated assistant output text for one turn, if available.
    fn turn_output(&self, turn_index: usize) -> Option<String>;
    /// Total wall-clock time elapsed in the run so far.
    fn elapsed(&self) -> DurationMs;
}

/// Whether an assertion passed, and why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionOutcome {
    /// Whether the assertion's condition held.
    pub passed: bool,
    /// A human-readable explanation, always present for failures and
    /// optional for passes.
    pub message: Option<String>,
}

impl AssertionOutcome {
    /// Build a passing outcome.
    pub fn pass() -> Self {
        Self { passed: true, message: None }
    }

    /// Build a passing outcome with an explanatory note.
    pub fn pass_with(message: impl Into<String>) -> Self {
        Self { passed: true, message: Some(message.into()) }
    }

    /// Build a failing outcome with a required explanation.
    pub fn fail(message: impl Into<String>) -> Self {
        Self { passed: false, message: Some(message.into()) }
    }
}

/// A named, checkable property of a scenario run (spec §4.8).
///
/// Implementations live in `chaos-assert`; this crate only defines the
/// seam, so the data model never depends on the concrete checks.
#[async_trait]
pub trait Assertion: Send + Sync + fmt::Debug {
    /// The assertion's name, as it appears in the run report.
    fn name(&self) -> &str;

    /// Evaluate the assertion against the current run state.
    async fn check(&self, ctx: &dyn AssertionContext) -> AssertionOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_has_no_message() {
        let outcome = AssertionOutcome::pass();
        assert!(outcome.passed);
        assert!(outcome.message.is_none());
    }

    #[test]
    fn fail_always_carries_a_message() {
        let outcome = AssertionOutcome::fail("exceeded 10 calls");
        assert!(!outcome.passed);
        assert_eq!(outcome.message.as_deref(), Some("exceeded 10 calls"));
    }
}
