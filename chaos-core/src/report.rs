//! Run outputs (spec §3 `RunReport`, spec §6 artifact layout) — what a
//! scenario run leaves behind once it finishes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::assertion::AssertionOutcome;
use crate::duration::DurationMs;
use crate::id::TraceId;
use crate::metrics::{CallStats, FaultRecord, StreamStats, TokenStats};

/// The outcome of one assertion, as recorded in a [`RunReport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionResult {
    /// The assertion's name.
    pub name: String,
    /// Whether it passed.
    pub passed: bool,
    /// An explanatory message, if any.
    pub message: Option<String>,
}

impl AssertionResult {
    /// Pair an assertion's name with its outcome.
    pub fn new(name: impl Into<String>, outcome: AssertionOutcome) -> Self {
        Self { name: name.into(), passed: outcome.passed, message: outcome.message }
    }
}

/// Per-turn summary included in a [`RunReport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnSummary {
    /// The turn's index.
    pub turn_index: usize,
    /// The turn's label, if it has one.
    pub label: Option<String>,
    /// Whether the turn completed without error.
    pub success: bool,
    /// Number of LLM calls made during this turn.
    pub call_count: usize,
    /// Wall-clock duration of the turn.
    pub duration: DurationMs,
    /// Error description, if the turn failed.
    pub error: Option<String>,
    /// Whether any turn-scoped assertion failed when checked against this
    /// turn's partial state (spec §4.7 step 6).
    pub assertions_failed: bool,
}

/// The full record of one scenario run (spec §3 `RunReport`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// The run's unique id.
    pub trace_id: TraceId,
    /// The scenario's name.
    pub scenario_name: String,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run ended.
    pub ended_at: DateTime<Utc>,
    /// Total wall-clock duration.
    pub duration: DurationMs,
    /// Per-turn summaries, in turn order.
    pub turns: Vec<TurnSummary>,
    /// Aggregate call counters.
    pub call_stats: CallStats,
    /// Aggregate token usage.
    pub token_stats: TokenStats,
    /// Aggregate streaming observations.
    pub stream_stats: StreamStats,
    /// Every fault injected during the run, in injection order.
    pub fault_log: Vec<FaultRecord>,
    /// Every assertion's outcome.
    pub assertions: Vec<AssertionResult>,
    /// The last turn's resolved input, captured verbatim where possible.
    pub final_input: Option<String>,
    /// The last turn's agent output, captured verbatim where possible.
    pub final_output: Option<String>,
    /// A description of the run's terminal error, if any turn ended in
    /// an unhandled agent error (spec §7 item iii) or the scenario itself
    /// was fatal (spec §7 item iv).
    pub error: Option<String>,
    /// Whether the run passed overall (every assertion passed and no
    /// turn ended in an unhandled error).
    pub passed: bool,
}

impl RunReport {
    /// Condense this report into its [`Scorecard`].
    pub fn scorecard(&self) -> Scorecard {
        let failed_assertions: Vec<String> = self
            .assertions
            .iter()
            .filter(|a| !a.passed)
            .map(|a| a.name.clone())
            .collect();
        Scorecard {
            trace_id: self.trace_id.clone(),
            scenario_name: self.scenario_name.clone(),
            passed: self.passed,
            total_assertions: self.assertions.len(),
            passed_assertions: self.assertions.len() - failed_assertions.len(),
            failed_assertions,
            call_count: self.call_stats.total as usize,
            fault_count: self.fault_log.len(),
            duration: self.duration,
        }
    }
}

/// The condensed summary written to `scorecard.json` (spec §6 artifact
/// layout) — enough to judge pass/fail at a glance without parsing the
/// full report or event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scorecard {
    /// The run's unique id.
    pub trace_id: TraceId,
    /// The scenario's name.
    pub scenario_name: String,
    /// Whether the run passed overall.
    pub passed: bool,
    /// Total number of assertions checked.
    pub total_assertions: usize,
    /// Number of assertions that passed.
    pub passed_assertions: usize,
    /// Names of assertions that failed.
    pub failed_assertions: Vec<String>,
    /// Total number of LLM calls made.
    pub call_count: usize,
    /// Total number of faults injected.
    pub fault_count: usize,
    /// Total wall-clock duration.
    pub duration: DurationMs,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_report() -> RunReport {
        RunReport {
            trace_id: TraceId::new("trace-1"),
            scenario_name: "s1".to_string(),
            started_at: Utc::now(),
            ended_at: Utc::now(),
            duration: DurationMs::from_millis(10),
            turns: vec![],
            call_stats: CallStats::default(),
            token_stats: TokenStats::default(),
            stream_stats: StreamStats::default(),
            fault_log: vec![],
            assertions: vec![
                AssertionResult::new("max-calls", AssertionOutcome::pass()),
                AssertionResult::new("completes-within", AssertionOutcome::fail("too slow")),
            ],
            final_input: None,
            final_output: None,
            error: None,
            passed: false,
        }
    }

    #[test]
    fn scorecard_counts_failures_by_name() {
        let report = empty_report();
        let scorecard = report.scorecard();
        assert_eq!(scorecard.total_assertions, 2);
        assert_eq!(scorecard.passed_assertions, 1);
        assert_eq!(scorecard.failed_assertions, vec!["completes-within".to_string()]);
        assert!(!scorecard.passed);
    }
}
