//! The metrics store (spec §3 `MetricsStore`) — the single, lock-guarded
//! home for a run's accumulated state.
//!
//! Mirrors the teacher's `RwLock<HashMap<...>>` state-store shape
//! (composite-key scoping there becomes per-turn scoping here): many
//! readers (assertions, sinks rendering a progress view) and exactly one
//! writer, the recorder.

use std::collections::HashMap;
use std::sync::RwLock;

use chaos_core::prelude::{
    CallRecord, CallStats, ConversationEntry, ConversationState, DurationMs, FaultRecord, Role,
    StreamStats, TokenStats, ToolCallState, ToolTrackingEntry,
};
use chaos_core::report::TurnSummary;
use chrono::Utc;

struct Inner {
    call_stats: CallStats,
    token_stats: TokenStats,
    stream_stats: StreamStats,
    conversation: ConversationState,
    history: Vec<CallRecord>,
    fault_log: Vec<FaultRecord>,
    tool_tracking: HashMap<String, ToolTrackingEntry>,
    turns: Vec<TurnSummary>,
    turn_outputs: HashMap<usize, String>,
    started_at: chrono::DateTime<Utc>,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            call_stats: CallStats::default(),
            token_stats: TokenStats::default(),
            stream_stats: StreamStats::default(),
            conversation: ConversationState::new(),
            history: Vec::new(),
            fault_log: Vec::new(),
            tool_tracking: HashMap::new(),
            turns: Vec::new(),
            turn_outputs: HashMap::new(),
            started_at: Utc::now(),
        }
    }
}

/// The concrete, thread-safe accumulator behind a run's
/// [`chaos_core::assertion::AssertionContext`].
///
/// Only the recorder (`Recorder` in this crate) is expected to call the
/// `record_*`/`push_*` methods; everything else reads.
#[derive(Default)]
pub struct MetricsStore {
    inner: RwLock<Inner>,
}

impl MetricsStore {
    /// Create a fresh, empty store, stamping its start time.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().expect("MetricsStore lock poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().expect("MetricsStore lock poisoned")
    }

    /// Record one completed LLM call.
    pub fn record_call(&self, record: CallRecord) {
        let mut inner = self.write();
        inner.call_stats.record(record.provider.as_deref(), record.latency, false);
        inner.token_stats.record(record.input_tokens, record.output_tokens);
        inner.history.push(record);
    }

    /// Record one injected fault.
    pub fn record_fault(&self, record: FaultRecord) {
        self.write().fault_log.push(record);
    }

    /// Record a stream's observed time-to-first-token.
    pub fn record_ttft(&self, ttft: DurationMs) {
        self.write().stream_stats.ttft_samples.push(ttft);
    }

    /// Record one chunk's observed delay.
    pub fn record_chunk_delay(&self, delay: DurationMs) {
        self.write().stream_stats.per_chunk_delays.push(delay);
    }

    /// Record that a stream hung.
    pub fn record_stream_hang(&self) {
        self.write().stream_stats.hang_events += 1;
    }

    /// Record that a stream was cut short.
    pub fn record_stream_cut(&self) {
        self.write().stream_stats.cut_events += 1;
    }

    /// Append a conversation entry.
    pub fn push_conversation(&self, entry: ConversationEntry) {
        self.write().conversation.push(entry);
    }

    /// Append multiple conversation entries.
    pub fn inject_conversation(&self, messages: Vec<ConversationEntry>) {
        self.write().conversation.inject(messages);
    }

    /// Keep only the last `keep_last` conversation entries.
    pub fn truncate_conversation(&self, keep_last: usize) -> usize {
        self.write().conversation.truncate_keep_last(keep_last)
    }

    /// Remove conversation entries by role (the common case for a
    /// `FaultKind::Remove` predicate running against stored state).
    pub fn remove_conversation_by_role(&self, role: Role) -> usize {
        self.write().conversation.remove_where(|e| e.role == role)
    }

    /// Remove conversation entries matching an arbitrary predicate (the
    /// general case behind `FaultKind::Remove`, which carries its own
    /// closure rather than being scoped to a single role).
    pub fn remove_conversation_where(&self, predicate: impl FnMut(&ConversationEntry) -> bool) -> usize {
        self.write().conversation.remove_where(predicate)
    }

    /// Rewrite every conversation entry's content through a mutator.
    pub fn mutate_conversation(&self, mutator: impl Fn(&str) -> String) {
        self.write().conversation.mutate_all(mutator);
    }

    /// Begin tracking a newly requested tool use.
    pub fn track_tool_requested(&self, entry: ToolTrackingEntry) {
        self.write().tool_tracking.insert(entry.tool_use_id.as_str().to_string(), entry);
    }

    /// Mark a tracked tool use as rewritten by a fault before resolving.
    pub fn track_tool_faulted(&self, tool_use_id: &str) {
        if let Some(entry) = self.write().tool_tracking.get_mut(tool_use_id) {
            entry.mark_faulted();
        }
    }

    /// Resolve a tracked tool use with its final outcome.
    pub fn track_tool_resolved(
        &self,
        tool_use_id: &str,
        call_id: chaos_core::prelude::CallId,
        result_bytes: usize,
        duration: DurationMs,
        success: bool,
    ) {
        if let Some(entry) = self.write().tool_tracking.get_mut(tool_use_id) {
            entry.resolve(call_id, result_bytes, duration, success);
        }
    }

    /// Whether a tool use is currently known (requested or later).
    pub fn tool_state(&self, tool_use_id: &str) -> Option<ToolCallState> {
        self.read().tool_tracking.get(tool_use_id).map(|e| e.state)
    }

    /// Record a finished turn's summary and output text.
    pub fn record_turn(&self, summary: TurnSummary, output: String) {
        let mut inner = self.write();
        inner.turn_outputs.insert(summary.turn_index, output);
        inner.turns.push(summary);
    }

    /// Snapshot every per-turn summary recorded so far.
    pub fn turn_summaries(&self) -> Vec<TurnSummary> {
        self.read().turns.clone()
    }

    /// A single-lock-acquisition copy of the aggregates a [`chaos_core::report::RunReport`]
    /// needs, so assembling a report doesn't take and release the read
    /// lock four times over.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let inner = self.read();
        MetricsSnapshot {
            call_stats: inner.call_stats.clone(),
            token_stats: inner.token_stats,
            stream_stats: inner.stream_stats.clone(),
            fault_log: inner.fault_log.clone(),
        }
    }
}

/// A point-in-time copy of the aggregates carried into a run's
/// [`chaos_core::report::RunReport`].
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    /// Aggregate call counters.
    pub call_stats: CallStats,
    /// Aggregate token usage.
    pub token_stats: TokenStats,
    /// Aggregate streaming observations.
    pub stream_stats: StreamStats,
    /// Every fault injected so far, in injection order.
    pub fault_log: Vec<FaultRecord>,
}

impl chaos_core::assertion::AssertionContext for MetricsStore {
    fn call_stats(&self) -> CallStats {
        self.read().call_stats.clone()
    }

    fn token_stats(&self) -> TokenStats {
        self.read().token_stats
    }

    fn stream_stats(&self) -> StreamStats {
        self.read().stream_stats.clone()
    }

    fn conversation(&self) -> ConversationState {
        self.read().conversation.clone()
    }

    fn history(&self) -> Vec<CallRecord> {
        self.read().history.clone()
    }

    fn fault_log(&self) -> Vec<FaultRecord> {
        self.read().fault_log.clone()
    }

    fn turn_count(&self) -> usize {
        self.read().turns.len()
    }

    fn turn_duration(&self, turn_index: usize) -> Option<DurationMs> {
        self.read().turns.iter().find(|t| t.turn_index == turn_index).map(|t| t.duration)
    }

    fn turn_succeeded(&self, turn_index: usize) -> Option<bool> {
        self.read().turns.iter().find(|t| t.turn_index == turn_index).map(|t| t.success)
    }

    fn turn_output(&self, turn_index: usize) -> Option<String> {
        self.read().turn_outputs.get(&turn_index).cloned()
    }

    fn elapsed(&self) -> DurationMs {
        let inner = self.read();
        DurationMs::from((Utc::now() - inner.started_at).to_std().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaos_core::assertion::AssertionContext;
    use chaos_core::prelude::{CallId, ToolUseId};

    #[test]
    fn record_call_updates_call_and_token_stats() {
        let store = MetricsStore::new();
        store.record_call(CallRecord {
            call_id: CallId::new("c1"),
            turn_index: 0,
            call_index_in_turn: 0,
            call_index_in_run: 0,
            provider: Some("mock".to_string()),
            success: true,
            injected: false,
            error: None,
            input_tokens: 10,
            output_tokens: 20,
            latency: DurationMs::from_millis(5),
            started_at: Utc::now(),
            ended_at: Utc::now(),
        });
        assert_eq!(store.call_stats().total, 1);
        assert_eq!(store.token_stats().input_tokens, 10);
        assert_eq!(store.history().len(), 1);
    }

    #[test]
    fn tool_tracking_round_trips_through_store() {
        let store = MetricsStore::new();
        let entry = ToolTrackingEntry::requested(
            ToolUseId::new("tu1"),
            "search",
            CallId::new("c1"),
            16,
        );
        store.track_tool_requested(entry);
        assert_eq!(store.tool_state("tu1"), Some(ToolCallState::Requested));
        store.track_tool_faulted("tu1");
        assert_eq!(store.tool_state("tu1"), Some(ToolCallState::Faulted));
        store.track_tool_resolved("tu1", CallId::new("c2"), 8, DurationMs::from_millis(3), false);
        assert_eq!(store.tool_state("tu1"), Some(ToolCallState::Resolved));
    }

    #[test]
    fn turn_output_is_retrievable_by_index() {
        let store = MetricsStore::new();
        store.record_turn(
            TurnSummary {
                turn_index: 0,
                label: None,
                success: true,
                call_count: 1,
                duration: DurationMs::from_millis(100),
                error: None,
                assertions_failed: false,
            },
            "hello back".to_string(),
        );
        assert_eq!(store.turn_output(0).as_deref(), Some("hello back"));
        assert_eq!(store.turn_succeeded(0), Some(true));
        assert_eq!(store.turn_count(), 1);
    }
}
