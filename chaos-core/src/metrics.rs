//! The metrics store's typed sub-records (spec §3).
//!
//! These are plain data — accumulation is exposed as small inherent
//! methods, but the thread-safe, single-writer wrapper around them lives
//! in `chaos-engine`'s `MetricsStore`. Keeping the types here and the
//! locking discipline there mirrors the teacher's split between
//! `layer0`'s pure protocol types and a concrete store crate.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::duration::DurationMs;
use crate::id::{CallId, ToolUseId};
use crate::point::ChaosPoint;

/// Who authored one conversation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The human/caller side of the conversation.
    User,
    /// The model's own output.
    Assistant,
    /// The system prompt.
    System,
    /// A tool result folded back into the conversation.
    Tool,
}

/// One entry in the ordered conversation view (spec §3 `ConversationState`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationEntry {
    /// Who said it.
    pub role: Role,
    /// The entry's content, verbatim.
    pub content: String,
    /// Which turn produced this entry.
    pub turn_index: usize,
    /// When it was added.
    pub timestamp: DateTime<Utc>,
    /// For a `Role::Tool` entry, the tool use this result resolves.
    /// `None` for every other role.
    pub tool_use_id: Option<ToolUseId>,
}

impl ConversationEntry {
    /// Create a new conversation entry.
    pub fn new(role: Role, content: impl Into<String>, turn_index: usize) -> Self {
        Self {
            role,
            content: content.into(),
            turn_index,
            timestamp: Utc::now(),
            tool_use_id: None,
        }
    }

    /// Attach the tool use id this entry resolves (spec §4.5 tool-result
    /// correlation). Only meaningful for `Role::Tool` entries.
    pub fn with_tool_use_id(mut self, tool_use_id: ToolUseId) -> Self {
        self.tool_use_id = Some(tool_use_id);
        self
    }
}

/// The ordered conversation view plus truncate/inject/remove helpers.
///
/// Append-mostly: CONTEXT-stage faults are the only thing allowed to
/// remove or reorder entries (spec §3 `ScenarioContext` is "append-mostly
/// run state").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationState {
    entries: Vec<ConversationEntry>,
}

impl ConversationState {
    /// Create an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry.
    pub fn push(&mut self, entry: ConversationEntry) {
        self.entries.push(entry);
    }

    /// Borrow all entries in order.
    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the conversation is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keep only the last `keep_last` entries, returning how many were
    /// removed. Used by `FaultKind::Truncate`.
    pub fn truncate_keep_last(&mut self, keep_last: usize) -> usize {
        let removed = self.entries.len().saturating_sub(keep_last);
        if removed > 0 {
            self.entries.drain(0..removed);
        }
        removed
    }

    /// Insert messages at the end. Used by `FaultKind::Inject`.
    pub fn inject(&mut self, messages: Vec<ConversationEntry>) {
        self.entries.extend(messages);
    }

    /// Remove entries matching a predicate, returning how many were
    /// removed. Used by `FaultKind::Remove`.
    pub fn remove_where(&mut self, mut predicate: impl FnMut(&ConversationEntry) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !predicate(e));
        before - self.entries.len()
    }

    /// Apply a pure `str -> str` mutator to every entry's content.
    /// Used by `FaultKind::ContextMutate`.
    pub fn mutate_all(&mut self, mutator: impl Fn(&str) -> String) {
        for entry in &mut self.entries {
            entry.content = mutator(&entry.content);
        }
    }
}

/// Call counters and latency samples (spec §3 `CallStats`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallStats {
    /// Total number of LLM calls observed.
    pub total: u64,
    /// Number of calls that were retries of a failed predecessor.
    pub retries: u64,
    /// Per-provider call counts.
    pub per_provider: HashMap<String, u64>,
    /// Latency of each completed call, in call order.
    pub latency_samples: Vec<DurationMs>,
}

impl CallStats {
    /// Record one completed call.
    pub fn record(&mut self, provider: Option<&str>, latency: DurationMs, is_retry: bool) {
        self.total += 1;
        if is_retry {
            self.retries += 1;
        }
        if let Some(p) = provider {
            *self.per_provider.entry(p.to_string()).or_insert(0) += 1;
        }
        self.latency_samples.push(latency);
    }
}

/// Cumulative token usage (spec §3 `TokenStats`).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenStats {
    /// Cumulative input tokens across all calls.
    pub input_tokens: u64,
    /// Cumulative output tokens across all calls.
    pub output_tokens: u64,
}

impl TokenStats {
    /// Fold in one call's token usage.
    pub fn record(&mut self, input_tokens: u64, output_tokens: u64) {
        self.input_tokens += input_tokens;
        self.output_tokens += output_tokens;
    }
}

/// Streaming-specific observations (spec §3 `StreamStats`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamStats {
    /// Time-to-first-token for each stream, in stream order.
    pub ttft_samples: Vec<DurationMs>,
    /// Number of `STREAM_HANG` events observed.
    pub hang_events: u64,
    /// Number of `STREAM_CUT` events observed.
    pub cut_events: u64,
    /// Observed per-chunk delays across all streams.
    pub per_chunk_delays: Vec<DurationMs>,
}

/// The lifecycle state of one tracked tool use (spec §3 strict transition
/// order: requested → (optional faulted) → resolved).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallState {
    /// `tool_use` observed in an assistant response; awaiting a result.
    Requested,
    /// A TOOL-stage fault rewrote the result before it resolved.
    Faulted,
    /// The matching `tool_result` has been observed.
    Resolved,
}

/// One tracked tool invocation (spec §3 `ToolTracking` map entry).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolTrackingEntry {
    /// The tool's unique use id.
    pub tool_use_id: ToolUseId,
    /// The tool's name.
    pub name: String,
    /// The call in which the tool was requested.
    pub requested_in_call_id: CallId,
    /// The call in which the result resolved, once known.
    pub resolved_in_call_id: Option<CallId>,
    /// Size of the serialized tool arguments.
    pub arg_bytes: usize,
    /// Size of the serialized tool result, once resolved.
    pub result_bytes: usize,
    /// Wall-clock time between request and resolution, once resolved.
    pub duration: Option<DurationMs>,
    /// Whether the tool call succeeded, once resolved.
    pub success: Option<bool>,
    /// Current lifecycle state.
    pub state: ToolCallState,
}

impl ToolTrackingEntry {
    /// Start tracking a newly requested tool use.
    pub fn requested(tool_use_id: ToolUseId, name: impl Into<String>, call_id: CallId, arg_bytes: usize) -> Self {
        Self {
            tool_use_id,
            name: name.into(),
            requested_in_call_id: call_id,
            resolved_in_call_id: None,
            arg_bytes,
            result_bytes: 0,
            duration: None,
            success: None,
            state: ToolCallState::Requested,
        }
    }

    /// Mark this entry as having been rewritten by a TOOL-stage fault
    /// before resolving. Valid only from `Requested`.
    pub fn mark_faulted(&mut self) {
        if self.state == ToolCallState::Requested {
            self.state = ToolCallState::Faulted;
        }
    }

    /// Resolve the tool use with its final outcome.
    pub fn resolve(
        &mut self,
        call_id: CallId,
        result_bytes: usize,
        duration: DurationMs,
        success: bool,
    ) {
        self.resolved_in_call_id = Some(call_id);
        self.result_bytes = result_bytes;
        self.duration = Some(duration);
        self.success = Some(success);
        self.state = ToolCallState::Resolved;
    }
}

/// Immutable record of one completed LLM call (spec §3 `CallRecord`,
/// spec §3 invariant: every call produces exactly one of these).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    /// This call's id (shared with its span id).
    pub call_id: CallId,
    /// Index of the turn that issued this call.
    pub turn_index: usize,
    /// Index of this call within its turn.
    pub call_index_in_turn: usize,
    /// Index of this call across the whole run.
    pub call_index_in_run: usize,
    /// The provider name, if known.
    pub provider: Option<String>,
    /// Whether the call succeeded.
    pub success: bool,
    /// Whether the failure (if any) was an injected fault rather than a
    /// real provider/agent error (spec §7 taxonomy).
    pub injected: bool,
    /// Error description, if the call failed.
    pub error: Option<String>,
    /// Input tokens consumed by this call.
    pub input_tokens: u64,
    /// Output tokens produced by this call.
    pub output_tokens: u64,
    /// Wall-clock latency of this call.
    pub latency: DurationMs,
    /// When the call started.
    pub started_at: DateTime<Utc>,
    /// When the call ended.
    pub ended_at: DateTime<Utc>,
}

/// Immutable record of one fault injection (spec §3 `FaultRecord`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaultRecord {
    /// The injected fault's kind tag (e.g. `"rate_limit"`, `"stream_cut"`).
    pub fault_type: String,
    /// The interception point at which it fired.
    pub point: ChaosPoint,
    /// Kind-specific parameters, for the event log.
    pub parameters: serde_json::Value,
    /// A stable fingerprint of the rule that produced this fault, so
    /// repeated firings of the same rule can be correlated.
    pub origin_rule_fingerprint: String,
    /// The call this fault applied to, if point-scoped to a call.
    pub call_id: Option<CallId>,
    /// The turn in which this fault fired.
    pub turn_index: usize,
    /// When the fault was recorded.
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keep_last_removes_oldest() {
        let mut cs = ConversationState::new();
        for i in 0..5 {
            cs.push(ConversationEntry::new(Role::User, format!("msg {i}"), 0));
        }
        let removed = cs.truncate_keep_last(1);
        assert_eq!(removed, 4);
        assert_eq!(cs.len(), 1);
        assert_eq!(cs.entries()[0].content, "msg 4");
    }

    #[test]
    fn truncate_keep_last_is_noop_when_already_short() {
        let mut cs = ConversationState::new();
        cs.push(ConversationEntry::new(Role::User, "only", 0));
        let removed = cs.truncate_keep_last(5);
        assert_eq!(removed, 0);
        assert_eq!(cs.len(), 1);
    }

    #[test]
    fn inject_is_noop_on_empty_list() {
        let mut cs = ConversationState::new();
        cs.push(ConversationEntry::new(Role::User, "hi", 0));
        cs.inject(vec![]);
        assert_eq!(cs.len(), 1);
    }

    #[test]
    fn remove_where_counts_removed() {
        let mut cs = ConversationState::new();
        cs.push(ConversationEntry::new(Role::User, "keep", 0));
        cs.push(ConversationEntry::new(Role::Tool, "drop", 0));
        let removed = cs.remove_where(|e| e.role == Role::Tool);
        assert_eq!(removed, 1);
        assert_eq!(cs.len(), 1);
    }

    #[test]
    fn tool_tracking_transition_order() {
        let mut entry = ToolTrackingEntry::requested(
            ToolUseId::new("tu_1"),
            "get_weather",
            CallId::new("call_1"),
            32,
        );
        assert_eq!(entry.state, ToolCallState::Requested);
        entry.mark_faulted();
        assert_eq!(entry.state, ToolCallState::Faulted);
        entry.resolve(CallId::new("call_2"), 64, DurationMs::from_millis(12), false);
        assert_eq!(entry.state, ToolCallState::Resolved);
        assert_eq!(entry.success, Some(false));
    }

    #[test]
    fn call_stats_accumulates() {
        let mut stats = CallStats::default();
        stats.record(Some("anthropic"), DurationMs::from_millis(100), false);
        stats.record(Some("anthropic"), DurationMs::from_millis(200), true);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.retries, 1);
        assert_eq!(stats.per_provider["anthropic"], 2);
        assert_eq!(stats.latency_samples.len(), 2);
    }
}
