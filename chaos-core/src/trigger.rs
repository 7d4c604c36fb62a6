//! Triggers decide *when* a chaos rule fires (spec §3 `Trigger`).
//!
//! Evaluation is a pure function of a [`TriggerContext`] plus (for
//! [`Trigger::WithProbability`]) a caller-supplied RNG — the RNG lives
//! outside this module so a whole run can share one seeded generator and
//! stay reproducible (spec §8 S5, "probability stability under seed").

use serde::{Deserialize, Serialize};

/// The facts a trigger may consult when deciding whether to fire.
///
/// Constructed fresh by the engine at each point a rule could apply;
/// which fields are meaningful depends on the point (e.g. `tool_name` is
/// only set at the TOOL point).
#[derive(Debug, Clone, Default)]
pub struct TriggerContext<'a> {
    /// Index of the current turn (0-based).
    pub turn_index: usize,
    /// Index of the current LLM call within its turn (0-based).
    pub call_index_in_turn: usize,
    /// Index of the current LLM call across the whole run (0-based).
    pub call_index_in_run: usize,
    /// The tool name in play, at the TOOL point.
    pub tool_name: Option<&'a str>,
}

/// A condition deciding whether a [`crate::rule::ChaosRule`] fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum Trigger {
    /// Fires every time its point is reached.
    Always,
    /// Fires only on a specific turn index.
    OnTurn {
        /// The 0-based turn index to match.
        turn: usize,
    },
    /// Fires only on a specific call index within the current turn.
    OnCall {
        /// The 0-based in-turn call index to match.
        call: usize,
    },
    /// Fires once the run-wide call count exceeds a threshold.
    AfterCalls {
        /// Fire once `call_index_in_run` is at least this many.
        count: usize,
    },
    /// Fires with a fixed probability, drawn from the run's seeded RNG.
    WithProbability {
        /// Probability in `[0.0, 1.0]`.
        probability: f64,
    },
    /// Fires only when the tool in play matches by name (TOOL point only).
    TargetingTool {
        /// The tool name to match.
        tool: String,
    },
    /// Fires if any inner trigger fires.
    AnyOf(Vec<Trigger>),
    /// Fires only if every inner trigger fires.
    AllOf(Vec<Trigger>),
    /// Fires iff the inner trigger does not.
    Not(Box<Trigger>),
}

impl Trigger {
    /// Evaluate this trigger against a point in the run.
    ///
    /// `draw` supplies a fresh uniform sample in `[0.0, 1.0)` for
    /// [`Trigger::WithProbability`]; callers pass a closure over their
    /// own seeded RNG so sequencing across a run stays deterministic.
    pub fn evaluate(&self, ctx: &TriggerContext<'_>, draw: &mut impl FnMut() -> f64) -> bool {
        match self {
            Trigger::Always => true,
            Trigger::OnTurn { turn } => ctx.turn_index == *turn,
            Trigger::OnCall { call } => ctx.call_index_in_turn == *call,
            Trigger::AfterCalls { count } => ctx.call_index_in_run >= *count,
            Trigger::WithProbability { probability } => draw() < probability.clamp(0.0, 1.0),
            Trigger::TargetingTool { tool } => ctx.tool_name == Some(tool.as_str()),
            Trigger::AnyOf(triggers) => triggers.iter().any(|t| t.evaluate(ctx, draw)),
            Trigger::AllOf(triggers) => triggers.iter().all(|t| t.evaluate(ctx, draw)),
            Trigger::Not(inner) => !inner.evaluate(ctx, draw),
        }
    }
}
