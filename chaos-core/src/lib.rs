#![deny(missing_docs)]
//! Protocol traits and data model for the agent-chaos harness.
//!
//! This crate defines the vocabulary every other crate in the workspace
//! shares: interception points, the fault catalog, triggers and rules,
//! the scenario data model, the event timeline, run reports, and the two
//! seams (`EventSink`, `Assertion`) concrete crates implement against.
//! It has no opinion on how faults are actually injected, where events
//! end up, or how a scenario is executed — that's `chaos-engine`,
//! `chaos-sinks`, `chaos-provider`, `chaos-assert`, and `chaos-runtime`.
//!
//! | Module | Responsibility |
//! |---|---|
//! | [`point`] | The five interception points a chaos rule can bind to |
//! | [`fault`] | The closed fault vocabulary (`FaultKind`) |
//! | [`trigger`] | When a rule fires (`Trigger`) |
//! | [`rule`] | Trigger + fault factory pairing (`ChaosRule`) |
//! | [`scenario`] | The declarative run input (`Scenario`, `Turn`) |
//! | [`metrics`] | Per-run accumulated state (`CallStats`, `ConversationState`, ...) |
//! | [`event`] | The append-only event timeline (`Event`) |
//! | [`report`] | Run outputs (`RunReport`, `Scorecard`) |
//! | [`assertion`] | The assertion seam (`Assertion`, `AssertionContext`) |
//! | [`sink`] | The event sink seam (`EventSink`) |
//! | [`error`] | The shared error taxonomy |
//! | [`id`] | Typed id newtypes |
//! | [`duration`] | Stable millisecond duration newtype |

pub mod assertion;
pub mod duration;
pub mod error;
pub mod event;
pub mod fault;
pub mod id;
pub mod metrics;
pub mod point;
pub mod report;
pub mod rule;
pub mod scenario;
pub mod sink;
pub mod trigger;

#[cfg(feature = "test-utils")]
pub mod test_utils;

/// Re-exports of the types most consumers need, so downstream crates can
/// `use chaos_core::prelude::*;` instead of naming every module.
pub mod prelude {
    pub use crate::assertion::{Assertion, AssertionContext, AssertionOutcome};
    pub use crate::duration::DurationMs;
    pub use crate::error::{ErrorTaxonomy, FactoryError, ScenarioError, SinkError, TriggerError};
    pub use crate::event::{Event, EventType};
    pub use crate::fault::{CorruptEventKind, FaultKind, Mutator, RemovePredicate};
    pub use crate::id::{CallId, SessionId, SpanId, ToolUseId, TraceId};
    pub use crate::metrics::{
        CallRecord, CallStats, ConversationEntry, ConversationState, FaultRecord, Role,
        StreamStats, ToolCallState, ToolTrackingEntry, TokenStats,
    };
    pub use crate::point::ChaosPoint;
    pub use crate::report::{AssertionResult, RunReport, Scorecard, TurnSummary};
    pub use crate::rule::{ChaosRule, FaultFactory, RuleError, StaticFault};
    pub use crate::scenario::{Scenario, Turn, TurnInput};
    pub use crate::sink::EventSink;
    pub use crate::trigger::{Trigger, TriggerContext};
}
