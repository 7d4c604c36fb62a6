//! The event timeline (spec §6 event schema) — the flat, append-only
//! record every sink receives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{SpanId, TraceId};

/// The kind of thing an [`Event`] describes.
///
/// Carried as a plain string tag (`"type"`); the kind-specific payload
/// lives in [`Event::data`] rather than in per-variant fields, so adding
/// a new event kind never changes the wire shape of existing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum EventType {
    /// A scenario run began (spec §6 `trace_start`).
    TraceStart,
    /// A scenario run finished (pass, fail, or error; spec §6 `trace_end`).
    TraceEnd,
    /// A turn began.
    TurnStarted,
    /// A turn finished.
    TurnCompleted,
    /// An LLM call began — brackets one span (spec §6 `span_start`).
    SpanStart,
    /// An LLM call finished — the matching half of `SpanStart` (spec §6
    /// `span_end`).
    SpanEnd,
    /// One chunk of a streaming response was observed.
    StreamChunk,
    /// A stream's time-to-first-token was measured (spec §6 `ttft`).
    Ttft,
    /// A stream was terminated early by a `STREAM_CUT` fault (spec §6
    /// `stream_cut`).
    StreamCut,
    /// A stream hung indefinitely because of a `STREAM_HANG` fault.
    StreamHang,
    /// A stream's aggregate stats at completion (spec §6 `stream_stats`).
    StreamStats,
    /// Token usage observed for a completed call (spec §6 `token_usage`).
    TokenUsage,
    /// A chaos rule fired and a fault was injected.
    FaultInjected,
    /// A tool use was observed in the model's response (spec §6
    /// `tool_use`).
    ToolUse,
    /// A tool invocation began (spec §6 `tool_start`).
    ToolStart,
    /// A tool invocation resolved with a result (spec §6 `tool_end`).
    ToolEnd,
    /// An assertion was evaluated.
    AssertionChecked,
}

/// One entry in the run's event timeline (spec §6).
///
/// `span_id` and `provider` are `None` for run- and turn-scoped events
/// that don't belong to any single call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// When the event was recorded.
    pub timestamp: DateTime<Utc>,
    /// The run this event belongs to.
    pub trace_id: TraceId,
    /// The call this event belongs to, if any.
    pub span_id: Option<SpanId>,
    /// The provider in play, if any.
    pub provider: Option<String>,
    /// What kind of event this is.
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Kind-specific payload.
    pub data: serde_json::Value,
}

impl Event {
    /// Build a new event with the current time.
    pub fn new(
        trace_id: TraceId,
        span_id: Option<SpanId>,
        provider: Option<String>,
        event_type: EventType,
        data: serde_json::Value,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            trace_id,
            span_id,
            provider,
            event_type,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_type_as_plain_string_tag() {
        let event = Event::new(
            TraceId::new("trace-1"),
            None,
            None,
            EventType::TraceStart,
            json!({"scenario": "s1"}),
        );
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "trace_start");
        assert_eq!(value["data"]["scenario"], "s1");
        assert!(value["span_id"].is_null());
    }

    #[test]
    fn round_trips_through_json() {
        let event = Event::new(
            TraceId::new("trace-1"),
            Some(SpanId::new("span-1")),
            Some("anthropic".to_string()),
            EventType::FaultInjected,
            json!({"kind": "rate_limit"}),
        );
        let text = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&text).unwrap();
        assert_eq!(back.event_type, EventType::FaultInjected);
        assert_eq!(back.provider.as_deref(), Some("anthropic"));
    }
}
