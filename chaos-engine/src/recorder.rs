//! The recorder (spec §4.6) — the single funnel through which a run's
//! metrics and event timeline are written.
//!
//! Nothing else in the workspace mutates a [`MetricsStore`] directly;
//! going through the recorder keeps metric updates and their matching
//! event always happen together, in the same order they occurred.

use std::sync::Arc;

use chaos_core::prelude::{
    CallId, CallRecord, ConversationEntry, DurationMs, Event, EventType, FaultRecord, Role,
    SpanId, ToolTrackingEntry, TraceId,
};
use chaos_core::report::TurnSummary;
use chaos_core::sink::EventSink;
use serde_json::json;

use crate::metrics_store::MetricsStore;

/// Writes to a run's [`MetricsStore`] and its [`EventSink`] together.
pub struct Recorder {
    trace_id: TraceId,
    store: Arc<MetricsStore>,
    sink: Arc<dyn EventSink>,
}

impl Recorder {
    /// Build a recorder for one run.
    pub fn new(trace_id: TraceId, store: Arc<MetricsStore>, sink: Arc<dyn EventSink>) -> Self {
        Self { trace_id, store, sink }
    }

    /// Borrow the underlying store, for assertion evaluation.
    pub fn store(&self) -> &Arc<MetricsStore> {
        &self.store
    }

    async fn emit(&self, span_id: Option<SpanId>, provider: Option<String>, event_type: EventType, data: serde_json::Value) {
        let event = Event::new(self.trace_id.clone(), span_id, provider, event_type, data);
        if let Err(err) = self.sink.emit(&event).await {
            tracing::warn!(error = %err, ?event_type, "event sink failed to accept event");
        }
    }

    /// Record the run starting.
    pub async fn run_started(&self, scenario_name: &str) {
        self.emit(None, None, EventType::TraceStart, json!({"scenario": scenario_name})).await;
    }

    /// Record the run finishing.
    pub async fn run_completed(&self, passed: bool) {
        self.emit(None, None, EventType::TraceEnd, json!({"passed": passed})).await;
    }

    /// Record a turn starting.
    pub async fn turn_started(&self, turn_index: usize, label: Option<&str>) {
        self.emit(None, None, EventType::TurnStarted, json!({"turn_index": turn_index, "label": label})).await;
    }

    /// Record a turn's input being appended to the conversation.
    pub fn push_conversation(&self, entry: ConversationEntry) {
        self.store.push_conversation(entry);
    }

    /// Record a completed turn, both in the store and the timeline.
    pub async fn turn_completed(&self, summary: TurnSummary, output: String) {
        let data = json!({
            "turn_index": summary.turn_index,
            "success": summary.success,
            "call_count": summary.call_count,
            "duration_ms": summary.duration.as_millis(),
            "error": summary.error,
        });
        self.store.record_turn(summary, output);
        self.emit(None, None, EventType::TurnCompleted, data).await;
    }

    /// Record an LLM call starting.
    pub async fn call_started(&self, span_id: SpanId, provider: &str) {
        self.emit(Some(span_id), Some(provider.to_string()), EventType::SpanStart, json!({})).await;
    }

    /// Record a completed LLM call, both in the store and the timeline.
    ///
    /// Emits both `SpanEnd` (the span's closing bracket, paired with the
    /// `SpanStart` from [`Recorder::call_started`]) and a separate
    /// `TokenUsage` event (spec §6), since downstream sinks treat token
    /// accounting as its own event rather than a field buried in the
    /// span's close.
    pub async fn call_completed(&self, span_id: SpanId, record: CallRecord) {
        let data = json!({
            "success": record.success,
            "injected": record.injected,
            "error": record.error,
            "input_tokens": record.input_tokens,
            "output_tokens": record.output_tokens,
            "latency_ms": record.latency.as_millis(),
        });
        let token_data = json!({
            "input_tokens": record.input_tokens,
            "output_tokens": record.output_tokens,
        });
        let provider = record.provider.clone();
        self.store.record_call(record);
        self.emit(Some(span_id.clone()), provider.clone(), EventType::SpanEnd, data).await;
        self.emit(Some(span_id), provider, EventType::TokenUsage, token_data).await;
    }

    /// Record one observed stream chunk.
    pub async fn stream_chunk(&self, span_id: SpanId, provider: &str, chunk_index: u32, delay: DurationMs) {
        self.store.record_chunk_delay(delay);
        self.emit(
            Some(span_id),
            Some(provider.to_string()),
            EventType::StreamChunk,
            json!({"chunk_index": chunk_index, "delay_ms": delay.as_millis()}),
        )
        .await;
    }

    /// Record a stream's time-to-first-token, both in the store and the
    /// timeline (spec §6 `ttft`).
    pub async fn record_ttft(&self, span_id: SpanId, provider: &str, ttft: DurationMs) {
        self.store.record_ttft(ttft);
        self.emit(
            Some(span_id),
            Some(provider.to_string()),
            EventType::Ttft,
            json!({"ttft_ms": ttft.as_millis()}),
        )
        .await;
    }

    /// Record that a stream hung after a `STREAM_HANG` fault. Emitted
    /// before the hang actually happens, since once it does there is no
    /// "after" to observe from — the stream never yields again.
    pub async fn record_stream_hang(&self, span_id: SpanId, provider: &str, after_chunks: u32) {
        self.store.record_stream_hang();
        self.emit(
            Some(span_id),
            Some(provider.to_string()),
            EventType::StreamHang,
            json!({"after_chunks": after_chunks}),
        )
        .await;
    }

    /// Record that a stream was cut short by a `STREAM_CUT` fault,
    /// carrying the number of chunks actually yielded before the cut
    /// (spec §6 `stream_cut`, spec.md §8 S2: "StreamCut event with
    /// `chunk_count=5`").
    pub async fn record_stream_cut(&self, span_id: SpanId, provider: &str, chunk_count: u32) {
        self.store.record_stream_cut();
        self.emit(
            Some(span_id),
            Some(provider.to_string()),
            EventType::StreamCut,
            json!({"chunk_count": chunk_count}),
        )
        .await;
    }

    /// Record a stream's aggregate stats at completion (spec §4.4,
    /// §6 `stream_stats`): chunk count, total bytes, and elapsed time.
    pub async fn record_stream_stats(&self, span_id: SpanId, provider: &str, chunk_count: u32, bytes: usize, elapsed: DurationMs) {
        self.emit(
            Some(span_id),
            Some(provider.to_string()),
            EventType::StreamStats,
            json!({"chunk_count": chunk_count, "bytes": bytes, "elapsed_ms": elapsed.as_millis()}),
        )
        .await;
    }

    /// Record a chaos rule firing.
    pub async fn fault_injected(&self, span_id: Option<SpanId>, record: FaultRecord) {
        let data = json!({
            "fault_type": record.fault_type,
            "point": record.point,
            "parameters": record.parameters,
            "origin_rule": record.origin_rule_fingerprint,
        });
        self.store.record_fault(record);
        self.emit(span_id, None, EventType::FaultInjected, data).await;
    }

    /// Record a tool use observed in the model's response, before any
    /// invocation has started (spec §6 `tool_use`).
    pub async fn tool_use(&self, span_id: SpanId, entry: ToolTrackingEntry) {
        let data = json!({
            "tool_use_id": entry.tool_use_id.as_str(),
            "name": entry.name,
            "arg_bytes": entry.arg_bytes,
        });
        self.store.track_tool_requested(entry);
        self.emit(Some(span_id), None, EventType::ToolUse, data).await;
    }

    /// Record a tool invocation beginning (spec §6 `tool_start`) — the
    /// adapter is about to run, or fault-substitute, this tool's result.
    pub async fn tool_start(&self, span_id: SpanId, entry: ToolTrackingEntry) {
        let data = json!({
            "tool_use_id": entry.tool_use_id.as_str(),
            "name": entry.name,
            "arg_bytes": entry.arg_bytes,
        });
        self.store.track_tool_requested(entry);
        self.emit(Some(span_id), None, EventType::ToolStart, data).await;
    }

    /// Record a tool use resolving with its result (spec §6 `tool_end`).
    pub async fn tool_end(
        &self,
        span_id: SpanId,
        tool_use_id: &str,
        call_id: CallId,
        result_bytes: usize,
        duration: DurationMs,
        success: bool,
    ) {
        self.store.track_tool_resolved(tool_use_id, call_id, result_bytes, duration, success);
        self.emit(
            Some(span_id),
            None,
            EventType::ToolEnd,
            json!({"tool_use_id": tool_use_id, "success": success, "duration_ms": duration.as_millis()}),
        )
        .await;
    }

    /// Mark a tracked tool use as rewritten by a TOOL-stage fault before it
    /// resolves (spec §3 strict transition order: requested → faulted →
    /// resolved).
    pub fn tool_faulted(&self, tool_use_id: &str) {
        self.store.track_tool_faulted(tool_use_id);
    }

    /// Remove every conversation entry with a given role (used by a
    /// `FaultKind::Remove` predicate scoped to role).
    pub fn remove_conversation_by_role(&self, role: Role) -> usize {
        self.store.remove_conversation_by_role(role)
    }

    /// Remove conversation entries matching an arbitrary predicate (the
    /// general case behind `FaultKind::Remove`).
    pub fn remove_conversation_where(&self, predicate: impl FnMut(&ConversationEntry) -> bool) -> usize {
        self.store.remove_conversation_where(predicate)
    }

    /// Keep only the last `keep_last` conversation entries, returning how
    /// many were removed (`FaultKind::Truncate`).
    pub fn truncate_conversation(&self, keep_last: usize) -> usize {
        self.store.truncate_conversation(keep_last)
    }

    /// Append synthetic entries to the conversation (`FaultKind::Inject`).
    pub fn inject_conversation(&self, messages: Vec<ConversationEntry>) {
        self.store.inject_conversation(messages);
    }

    /// Rewrite every conversation entry's content through a mutator
    /// (`FaultKind::ContextMutate`).
    pub fn mutate_conversation(&self, mutator: impl Fn(&str) -> String) {
        self.store.mutate_conversation(mutator);
    }

    /// Record one assertion's outcome against the run's event timeline.
    pub async fn assertion_checked(&self, result: &chaos_core::report::AssertionResult) {
        let data = json!({"name": result.name, "passed": result.passed, "message": result.message});
        self.emit(None, None, EventType::AssertionChecked, data).await;
    }

    /// Flush the sink. Call once, at the very end of the run.
    pub async fn close(&self) {
        if let Err(err) = self.sink.close().await {
            tracing::warn!(error = %err, "event sink failed to close cleanly");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaos_core::assertion::AssertionOutcome;
    use chaos_core::prelude::{AssertionResult, TraceId};
    use chaos_core::test_utils::RecordingSink;

    fn recorder() -> (Recorder, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let recorder = Recorder::new(TraceId::new("t1"), Arc::new(MetricsStore::new()), sink.clone());
        (recorder, sink)
    }

    #[tokio::test]
    async fn context_wrappers_mutate_the_store_directly() {
        let (recorder, _sink) = recorder();
        recorder.push_conversation(ConversationEntry::new(Role::User, "hi", 0));
        recorder.push_conversation(ConversationEntry::new(Role::Assistant, "hello", 0));
        recorder.inject_conversation(vec![ConversationEntry::new(Role::System, "injected", 0)]);
        assert_eq!(recorder.store().conversation().len(), 3);

        let removed = recorder.truncate_conversation(1);
        assert_eq!(removed, 2);
        assert_eq!(recorder.store().conversation().len(), 1);
    }

    #[tokio::test]
    async fn remove_conversation_where_applies_an_arbitrary_predicate() {
        let (recorder, _sink) = recorder();
        recorder.push_conversation(ConversationEntry::new(Role::User, "keep", 0));
        recorder.push_conversation(ConversationEntry::new(Role::Tool, "drop", 0));
        let removed = recorder.remove_conversation_where(|e| e.role == Role::Tool);
        assert_eq!(removed, 1);
        assert_eq!(recorder.store().conversation().len(), 1);
    }

    #[tokio::test]
    async fn assertion_checked_emits_a_matching_event() {
        let (recorder, sink) = recorder();
        let result = AssertionResult::new("max_tokens", AssertionOutcome::pass());
        recorder.assertion_checked(&result).await;
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, chaos_core::prelude::EventType::AssertionChecked);
        assert_eq!(events[0].data["name"], "max_tokens");
    }
}
