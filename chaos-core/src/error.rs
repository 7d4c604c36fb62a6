//! Error taxonomy (spec §7) — every layer in this crate follows the same
//! shape: a closed, `#[non_exhaustive]` enum ending in an `Other`
//! catch-all so downstream crates can wrap errors this crate has never
//! heard of without losing type information.

use thiserror::Error;

use crate::duration::DurationMs;
use crate::point::ChaosPoint;

/// Errors evaluating a [`crate::trigger::Trigger`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TriggerError {
    /// A probability-based trigger was given a value outside `[0.0, 1.0]`.
    #[error("probability {0} is outside [0.0, 1.0]")]
    InvalidProbability(f64),
    /// Anything else.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors producing a fault from a [`crate::rule::FaultFactory`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FactoryError {
    /// The factory declares a point that doesn't match its owning rule.
    #[error("factory produced a fault for {actual:?}, expected {expected:?}")]
    PointMismatch {
        /// The point the owning rule expected.
        expected: ChaosPoint,
        /// The point the produced fault actually belongs to.
        actual: ChaosPoint,
    },
    /// Anything else.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors delivering an event to an [`crate::sink::EventSink`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SinkError {
    /// The sink has already been closed.
    #[error("sink is closed")]
    Closed,
    /// The sink failed to serialize or persist the event.
    #[error("failed to write event: {0}")]
    Write(String),
    /// Anything else.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors validating or assembling a [`crate::scenario::Scenario`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScenarioError {
    /// A chaos rule's factory doesn't match the point the rule declares.
    #[error(transparent)]
    Rule(#[from] crate::rule::RuleError),
    /// The scenario has no turns to execute.
    #[error("scenario {0:?} has no turns")]
    NoTurns(String),
    /// Anything else.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// The five-way error taxonomy a scenario run's single choke-point
/// function classifies every failure into (spec §7, spec §9 design
/// note: one place decides which of these a failure is).
///
/// Modeled as one closed enum rather than five independent error types
/// so that choke point stays enforceable — code that wants to react
/// differently to an injected fault than to a genuine provider error
/// matches on this enum instead of catching five different types.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ErrorTaxonomy {
    /// The failure was a fault the harness itself injected.
    #[error("injected fault: {fault_type} at {point:?}")]
    InjectedFault {
        /// The fault's kind tag.
        fault_type: String,
        /// The point it was injected at.
        point: ChaosPoint,
    },
    /// The provider genuinely failed, independent of any injected fault.
    #[error("provider error: {0}")]
    ProviderError(String),
    /// The agent under test failed on its own terms (e.g. it panicked,
    /// or returned a response the harness couldn't interpret).
    #[error("agent error: {0}")]
    AgentError(String),
    /// The scenario itself is malformed or misconfigured.
    #[error("scenario error: {0}")]
    ScenarioError(#[from] ScenarioError),
    /// The configured deadline elapsed before the call, turn, or run
    /// finished.
    #[error("timed out after {0}")]
    Timeout(DurationMs),
    /// Anything else.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injected_fault_message_names_point_and_kind() {
        let err = ErrorTaxonomy::InjectedFault {
            fault_type: "rate_limit".to_string(),
            point: ChaosPoint::Llm,
        };
        assert_eq!(err.to_string(), "injected fault: rate_limit at Llm");
    }

    #[test]
    fn timeout_carries_the_deadline() {
        let err = ErrorTaxonomy::Timeout(DurationMs::from_millis(5000));
        assert_eq!(err.to_string(), "timed out after 5000ms");
    }
}
