//! Errors the scenario execution runtime can raise (spec §7 items iii–v).

use thiserror::Error;

/// An unhandled failure from the agent callable under test (spec §7
/// item iii). Captured as `RunReport.error`; does not prevent teardown.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AgentError {
    /// The agent raised an error message of its own.
    #[error("agent error: {0}")]
    Failed(String),
    /// Anything else.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// A single turn failed to complete (spec §4.7 timeout/cancellation
/// behavior).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TurnError {
    /// The agent returned an error.
    #[error(transparent)]
    Agent(#[from] AgentError),
    /// The turn exceeded the scenario's deadline.
    #[error("turn {turn_index} timed out after {elapsed_ms}ms")]
    Timeout {
        /// The turn that timed out.
        turn_index: usize,
        /// How long the turn had run before being cancelled.
        elapsed_ms: u64,
    },
}

/// A scenario-fatal error (spec §7 item iv): fault factory misbehavior,
/// a missing provider adapter, or an unreadable scenario. Aborts the run
/// with `passed=false`; does not affect sibling runs in a worker pool.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScenarioError {
    /// The scenario declared no turns to execute.
    #[error("scenario {0:?} has no turns")]
    NoTurns(String),
    /// A chaos rule or fault factory was malformed.
    #[error(transparent)]
    Rule(#[from] chaos_core::rule::RuleError),
    /// A turn failed in a way the runner treats as scenario-fatal.
    #[error(transparent)]
    Turn(#[from] TurnError),
    /// Anything else.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// An artifact I/O failure at the runner level (spec §4.9 serialization).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunnerError {
    /// The scenario itself failed fatally.
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    /// Writing `scorecard.json` or `events.jsonl` failed.
    #[error("failed to write run artifacts to {path}: {source}")]
    ArtifactWrite {
        /// The path the runner tried to write to.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Serializing a `RunReport` to JSON failed.
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}
