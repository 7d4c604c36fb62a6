//! The scenario data model (spec §3 `Scenario`) — the declarative input
//! to a harness run.

use std::fmt;
use std::sync::Arc;

use crate::assertion::Assertion;
use crate::duration::DurationMs;
use crate::metrics::ConversationState;
use crate::rule::ChaosRule;

/// The text a turn feeds to the agent under test.
///
/// Either a literal utterance fixed at scenario-authoring time, or a
/// function of the conversation so far — useful for scenarios whose
/// later turns react to what an earlier (possibly faulted) turn
/// produced.
#[derive(Clone)]
pub enum TurnInput {
    /// A fixed utterance.
    Literal(String),
    /// Derived from the conversation state at the time the turn runs.
    Generated(Arc<dyn Fn(&ConversationState) -> String + Send + Sync>),
}

impl TurnInput {
    /// Resolve this input against the current conversation state.
    pub fn resolve(&self, conversation: &ConversationState) -> String {
        match self {
            TurnInput::Literal(text) => text.clone(),
            TurnInput::Generated(f) => f(conversation),
        }
    }
}

impl fmt::Debug for TurnInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnInput::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            TurnInput::Generated(_) => f.write_str("Generated(..)"),
        }
    }
}

impl From<&str> for TurnInput {
    fn from(s: &str) -> Self {
        TurnInput::Literal(s.to_string())
    }
}

impl From<String> for TurnInput {
    fn from(s: String) -> Self {
        TurnInput::Literal(s)
    }
}

/// One turn in a scenario's conversation.
#[derive(Debug, Clone)]
pub struct Turn {
    /// A short label for this turn, used in event logs and reports.
    pub label: Option<String>,
    /// The input fed to the agent at the start of this turn.
    pub input: TurnInput,
}

impl Turn {
    /// Build a turn from a literal utterance.
    pub fn new(input: impl Into<TurnInput>) -> Self {
        Self { label: None, input: input.into() }
    }

    /// Attach a label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// A declarative scenario: the conversation to drive, the faults to
/// inject along the way, and the properties to check at the end.
pub struct Scenario {
    /// The scenario's name, used in run reports and artifact paths.
    pub name: String,
    /// The turns to execute, in order.
    pub turns: Vec<Turn>,
    /// The chaos rules in effect for this scenario, in declaration order
    /// (declaration order is the tie-break when more than one rule could
    /// fire at the same point).
    pub chaos_rules: Vec<ChaosRule>,
    /// The assertions checked once the scenario completes.
    pub assertions: Vec<Arc<dyn Assertion>>,
    /// An optional seed for the run's RNG, for reproducible
    /// probability-triggered faults (spec §8 S5).
    pub seed: Option<u64>,
    /// An optional per-turn wall-clock deadline (spec §4.7). `None` means
    /// a turn may run as long as the agent takes.
    pub turn_timeout: Option<DurationMs>,
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("turns", &self.turns)
            .field("chaos_rule_count", &self.chaos_rules.len())
            .field("assertion_count", &self.assertions.len())
            .field("seed", &self.seed)
            .finish()
    }
}

impl Scenario {
    /// Start building a scenario with no turns, rules, or assertions.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            turns: Vec::new(),
            chaos_rules: Vec::new(),
            assertions: Vec::new(),
            seed: None,
            turn_timeout: None,
        }
    }

    /// Append a turn.
    pub fn with_turn(mut self, turn: Turn) -> Self {
        self.turns.push(turn);
        self
    }

    /// Append a chaos rule.
    pub fn with_rule(mut self, rule: ChaosRule) -> Self {
        self.chaos_rules.push(rule);
        self
    }

    /// Append an assertion.
    pub fn with_assertion(mut self, assertion: Arc<dyn Assertion>) -> Self {
        self.assertions.push(assertion);
        self
    }

    /// Fix the run's RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Bound every turn in this scenario by a wall-clock deadline (spec
    /// §4.7).
    pub fn with_turn_timeout(mut self, timeout: DurationMs) -> Self {
        self.turn_timeout = Some(timeout);
        self
    }

    /// A scenario identical to this one but with every chaos rule
    /// stripped out — the "clean" half of a baseline-vs-chaos pair
    /// (spec §8 S6).
    pub fn without_chaos(&self) -> Self
    where
        Self: Sized,
    {
        Self {
            name: format!("{}-baseline", self.name),
            turns: self.turns.clone(),
            chaos_rules: Vec::new(),
            assertions: Vec::new(),
            seed: self.seed,
            turn_timeout: self.turn_timeout,
        }
    }
}
