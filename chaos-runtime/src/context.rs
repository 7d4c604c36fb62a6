//! The scenario context (spec §3 `ScenarioContext`) — shared, append-mostly
//! run state threaded through the agent, injector, and recorder.
//!
//! Exclusively owned by the turn executor; the agent only ever reads it
//! (the call-context counters it hands out are the one exception, and
//! those are independent atomics rather than anything the agent could
//! use to corrupt turn bookkeeping).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chaos_core::prelude::{ConversationState, SessionId, TraceId};
use chaos_engine::{Injector, Recorder};
use chaos_provider::{CallContext, ProviderHandle};

use crate::error::AgentError;

/// Hands out [`CallContext`] values with monotonically increasing call
/// indices, scoped to whichever turn is currently running.
///
/// A plain struct of atomics rather than a mutex-guarded counter: the
/// turn executor is the only writer of `turn_index` (via
/// [`CallSequencer::begin_turn`]), and the agent is the only reader/
/// incrementer of the call counters, so there's no critical section to
/// protect beyond what `Ordering::SeqCst` already guarantees per field.
#[derive(Debug, Default)]
pub struct CallSequencer {
    turn_index: AtomicUsize,
    call_index_in_turn: AtomicUsize,
    call_index_in_run: AtomicUsize,
}

impl CallSequencer {
    /// Start a fresh sequencer at turn 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the per-turn call counter for a newly starting turn.
    pub fn begin_turn(&self, turn_index: usize) {
        self.turn_index.store(turn_index, Ordering::SeqCst);
        self.call_index_in_turn.store(0, Ordering::SeqCst);
    }

    /// Allocate the next call's context, advancing both the per-turn and
    /// per-run call counters.
    pub fn next_call_context(&self) -> CallContext {
        let turn_index = self.turn_index.load(Ordering::SeqCst);
        let call_index_in_turn = self.call_index_in_turn.fetch_add(1, Ordering::SeqCst);
        let call_index_in_run = self.call_index_in_run.fetch_add(1, Ordering::SeqCst);
        CallContext { turn_index, call_index_in_turn, call_index_in_run }
    }

    /// Number of calls allocated so far in the current turn.
    pub fn calls_in_current_turn(&self) -> usize {
        self.call_index_in_turn.load(Ordering::SeqCst)
    }
}

/// Per-run shared state: identity, the injector and recorder handles, the
/// provider seam, and the call-numbering sequencer.
///
/// Read-only to the agent callback; the turn executor is the only thing
/// that calls [`ScenarioContext::begin_turn`].
pub struct ScenarioContext {
    /// The scenario's name.
    pub name: String,
    /// This run's unique trace id, shared by every event it emits.
    pub trace_id: TraceId,
    /// A session id distinguishing this run from concurrent sibling runs.
    pub session_id: SessionId,
    /// The injector consulted at every interception point.
    pub injector: Arc<Injector>,
    /// The recorder every observed action funnels through.
    pub recorder: Arc<Recorder>,
    /// The swappable provider seam the agent calls through.
    pub provider: Arc<ProviderHandle>,
    sequencer: CallSequencer,
}

impl ScenarioContext {
    /// Build a context for one run.
    pub fn new(
        name: impl Into<String>,
        trace_id: TraceId,
        injector: Arc<Injector>,
        recorder: Arc<Recorder>,
        provider: Arc<ProviderHandle>,
    ) -> Self {
        Self {
            name: name.into(),
            trace_id,
            session_id: SessionId::generate(),
            injector,
            recorder,
            provider,
            sequencer: CallSequencer::new(),
        }
    }

    /// Mark a new turn as starting, resetting its call counter.
    pub fn begin_turn(&self, turn_index: usize) {
        self.sequencer.begin_turn(turn_index);
    }

    /// Allocate the next call's context within the current turn.
    pub fn next_call_context(&self) -> CallContext {
        self.sequencer.next_call_context()
    }

    /// Number of calls made so far in the current turn.
    pub fn calls_in_current_turn(&self) -> usize {
        self.sequencer.calls_in_current_turn()
    }

    /// The conversation as it stands right now.
    pub fn conversation(&self) -> ConversationState {
        use chaos_core::assertion::AssertionContext;
        self.recorder.store().conversation()
    }
}

/// The callable under test: an agent that turns one resolved user
/// utterance into a response, issuing whatever LLM calls and tool
/// invocations it needs along the way through `ctx.provider`.
///
/// Implementations own their own system prompt, tool registry, and
/// retry policy — the harness only cares that a response (or an
/// [`AgentError`]) eventually comes back.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Produce a response to `input`, given the current run context.
    async fn respond(&self, input: &str, ctx: &ScenarioContext) -> Result<String, AgentError>;
}
