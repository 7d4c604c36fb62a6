#![deny(missing_docs)]
//! Built-in assertions and the assertion engine for the agent-chaos
//! harness (spec §4.8).
//!
//! Every assertion here is a pure predicate over a
//! [`chaos_core::assertion::AssertionContext`] — no I/O, no knowledge of
//! how the context is actually stored. Third-party judge adapters (spec
//! §6 external collaborators) implement [`chaos_core::assertion::Assertion`]
//! directly; this crate doesn't privilege its own built-ins over one a
//! downstream crate supplies.
//!
//! | Module | Responsibility |
//! |---|---|
//! | [`engine`] | Runs a scenario's assertions against a context, collecting outcomes |

pub mod engine;

pub use engine::evaluate_all;

use async_trait::async_trait;
use chaos_core::assertion::{Assertion, AssertionContext, AssertionOutcome};
use chaos_core::duration::DurationMs;

/// The whole run must finish within `duration`.
#[derive(Debug, Clone, Copy)]
pub struct CompletesWithin(pub DurationMs);

#[async_trait]
impl Assertion for CompletesWithin {
    fn name(&self) -> &str {
        "completes_within"
    }

    async fn check(&self, ctx: &dyn AssertionContext) -> AssertionOutcome {
        let elapsed = ctx.elapsed();
        if elapsed <= self.0 {
            AssertionOutcome::pass()
        } else {
            AssertionOutcome::fail(format!("run took {elapsed}, exceeding the {} budget", self.0))
        }
    }
}

/// At most `n` LLM calls may have been made across the whole run.
#[derive(Debug, Clone, Copy)]
pub struct MaxLLMCalls(pub u64);

#[async_trait]
impl Assertion for MaxLLMCalls {
    fn name(&self) -> &str {
        "max_llm_calls"
    }

    async fn check(&self, ctx: &dyn AssertionContext) -> AssertionOutcome {
        let total = ctx.call_stats().total;
        if total <= self.0 {
            AssertionOutcome::pass()
        } else {
            AssertionOutcome::fail(format!("{total} calls made, exceeding the limit of {}", self.0))
        }
    }
}

/// At least `n` LLM calls must have been made across the whole run.
#[derive(Debug, Clone, Copy)]
pub struct MinLLMCalls(pub u64);

#[async_trait]
impl Assertion for MinLLMCalls {
    fn name(&self) -> &str {
        "min_llm_calls"
    }

    async fn check(&self, ctx: &dyn AssertionContext) -> AssertionOutcome {
        let total = ctx.call_stats().total;
        if total >= self.0 {
            AssertionOutcome::pass()
        } else {
            AssertionOutcome::fail(format!("only {total} calls made, short of the minimum {}", self.0))
        }
    }
}

/// Combined input and output tokens across the whole run must not exceed
/// `n`.
#[derive(Debug, Clone, Copy)]
pub struct MaxTokens(pub u64);

#[async_trait]
impl Assertion for MaxTokens {
    fn name(&self) -> &str {
        "max_tokens"
    }

    async fn check(&self, ctx: &dyn AssertionContext) -> AssertionOutcome {
        let stats = ctx.token_stats();
        let total = stats.input_tokens + stats.output_tokens;
        if total <= self.0 {
            AssertionOutcome::pass()
        } else {
            AssertionOutcome::fail(format!("{total} tokens used, exceeding the budget of {}", self.0))
        }
    }
}

/// Every turn executed so far must have completed without error.
#[derive(Debug, Clone, Copy)]
pub struct AllTurnsComplete;

#[async_trait]
impl Assertion for AllTurnsComplete {
    fn name(&self) -> &str {
        "all_turns_complete"
    }

    async fn check(&self, ctx: &dyn AssertionContext) -> AssertionOutcome {
        let failures: Vec<usize> = (0..ctx.turn_count())
            .filter(|&i| ctx.turn_succeeded(i) != Some(true))
            .collect();
        if failures.is_empty() {
            AssertionOutcome::pass()
        } else {
            AssertionOutcome::fail(format!("turns {failures:?} did not complete successfully"))
        }
    }
}

/// Turn `turn_index` must have completed without error.
#[derive(Debug, Clone, Copy)]
pub struct TurnCompletes {
    /// The 0-based turn index to check.
    pub turn_index: usize,
}

impl TurnCompletes {
    /// Check that turn `turn_index` completed.
    pub fn new(turn_index: usize) -> Self {
        Self { turn_index }
    }
}

#[async_trait]
impl Assertion for TurnCompletes {
    fn name(&self) -> &str {
        "turn_completes"
    }

    async fn check(&self, ctx: &dyn AssertionContext) -> AssertionOutcome {
        match ctx.turn_succeeded(self.turn_index) {
            Some(true) => AssertionOutcome::pass(),
            Some(false) => AssertionOutcome::fail(format!("turn {} did not complete successfully", self.turn_index)),
            None => AssertionOutcome::fail(format!("turn {} never ran", self.turn_index)),
        }
    }
}

/// Turn `turn_index` must complete, successfully, within `duration`.
#[derive(Debug, Clone, Copy)]
pub struct TurnCompletesWithin {
    /// The 0-based turn index to check.
    pub turn_index: usize,
    /// The turn's wall-clock budget.
    pub duration: DurationMs,
}

impl TurnCompletesWithin {
    /// Check that turn `turn_index` completes within `duration`.
    pub fn new(turn_index: usize, duration: DurationMs) -> Self {
        Self { turn_index, duration }
    }
}

#[async_trait]
impl Assertion for TurnCompletesWithin {
    fn name(&self) -> &str {
        "turn_completes_within"
    }

    async fn check(&self, ctx: &dyn AssertionContext) -> AssertionOutcome {
        match (ctx.turn_succeeded(self.turn_index), ctx.turn_duration(self.turn_index)) {
            (Some(true), Some(elapsed)) if elapsed <= self.duration => AssertionOutcome::pass(),
            (Some(true), Some(elapsed)) => AssertionOutcome::fail(format!(
                "turn {} took {elapsed}, exceeding the {} budget",
                self.turn_index, self.duration
            )),
            (Some(false), _) => AssertionOutcome::fail(format!("turn {} did not complete successfully", self.turn_index)),
            _ => AssertionOutcome::fail(format!("turn {} never ran", self.turn_index)),
        }
    }
}

/// Turn `turn_index`'s assistant output must contain `substring`.
#[derive(Debug, Clone)]
pub struct TurnResponseContains {
    /// The 0-based turn index to check.
    pub turn_index: usize,
    /// The substring the turn's output must contain.
    pub substring: String,
}

impl TurnResponseContains {
    /// Check that turn `turn_index`'s output contains `substring`.
    pub fn new(turn_index: usize, substring: impl Into<String>) -> Self {
        Self { turn_index, substring: substring.into() }
    }
}

#[async_trait]
impl Assertion for TurnResponseContains {
    fn name(&self) -> &str {
        "turn_response_contains"
    }

    async fn check(&self, ctx: &dyn AssertionContext) -> AssertionOutcome {
        match ctx.turn_output(self.turn_index) {
            Some(output) if output.contains(&self.substring) => AssertionOutcome::pass(),
            Some(output) => AssertionOutcome::fail(format!(
                "turn {} output {output:?} did not contain {:?}",
                self.turn_index, self.substring
            )),
            None => AssertionOutcome::fail(format!("turn {} never ran", self.turn_index)),
        }
    }
}
