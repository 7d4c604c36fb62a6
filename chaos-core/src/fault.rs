//! Fault vocabulary (spec §3) — what a chaos rule can actually do once
//! its trigger fires.
//!
//! [`FaultKind`] is deliberately one closed enum rather than five
//! per-point enums: a rule always names a single [`crate::point::ChaosPoint`]
//! alongside it, so the pairing is validated once in [`crate::rule::ChaosRule`]
//! rather than encoded in the type system five times over.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::duration::DurationMs;
use crate::metrics::ConversationEntry;

/// A pure `str -> str` transform, used by the `*_MUTATE` faults.
///
/// Wrapped in `Arc` so [`FaultKind`] stays cheaply `Clone`; faults are
/// handed out by a [`crate::rule::FaultFactory`] on every trigger match; and
/// so are not consumed once constructed.
#[derive(Clone)]
pub struct Mutator {
    name: String,
    f: Arc<dyn Fn(&str) -> String + Send + Sync>,
}

impl Mutator {
    /// Wrap a closure as a named mutator. The name shows up in event logs
    /// and debug output in place of the closure itself.
    pub fn new(name: impl Into<String>, f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self {
            name: name.into(),
            f: Arc::new(f),
        }
    }

    /// The mutator's name, for logging.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Apply the mutator.
    pub fn apply(&self, input: &str) -> String {
        (self.f)(input)
    }
}

impl fmt::Debug for Mutator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Mutator").field(&self.name).finish()
    }
}

/// Serializes as its name alone — the wrapped closure has no wire
/// representation. Good enough for event logs and fingerprints, which
/// only ever want to show *which* mutator fired.
impl Serialize for Mutator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

/// Reconstructs a named identity mutator (`|s| s.to_string()`). A
/// deserialized [`FaultKind::UserInputMutate`] or similar is for
/// inspecting event logs, not for replaying the original behavior — the
/// original closure cannot be recovered from JSON.
impl<'de> Deserialize<'de> for Mutator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Mutator::new(name, |s: &str| s.to_string()))
    }
}

/// A pure predicate over a conversation entry, used by `FaultKind::Remove`.
#[derive(Clone)]
pub struct RemovePredicate {
    name: String,
    f: Arc<dyn Fn(&ConversationEntry) -> bool + Send + Sync>,
}

impl RemovePredicate {
    /// Wrap a closure as a named predicate.
    pub fn new(
        name: impl Into<String>,
        f: impl Fn(&ConversationEntry) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            f: Arc::new(f),
        }
    }

    /// The predicate's name, for logging.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluate the predicate.
    pub fn matches(&self, entry: &ConversationEntry) -> bool {
        (self.f)(entry)
    }
}

impl fmt::Debug for RemovePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RemovePredicate").field(&self.name).finish()
    }
}

/// Serializes as its name alone, for the same reason as [`Mutator`].
impl Serialize for RemovePredicate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

/// Reconstructs a named predicate that matches nothing. As with
/// [`Mutator`], a deserialized `FaultKind::Remove` is for event-log
/// inspection, not for replaying the original removal behavior.
impl<'de> Deserialize<'de> for RemovePredicate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(RemovePredicate::new(name, |_entry: &ConversationEntry| false))
    }
}

/// What kind of event a `CORRUPT` fault should emit in place of (or
/// alongside) the genuine one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptEventKind {
    /// Emit a `content_block_delta` with invalid JSON in its payload.
    InvalidJson,
    /// Emit an event type the provider never actually sends.
    UnknownEventType,
    /// Truncate a multi-byte UTF-8 sequence across a chunk boundary.
    TruncatedUtf8,
    /// Emit a `content_block_delta` missing a field real responses
    /// always carry (e.g. `index`).
    MissingField,
}

/// Something a chaos rule injects once its trigger matches.
///
/// Every variant names the point it is legal at in its doc comment, but
/// validity is enforced by [`crate::rule::ChaosRule::new`], not by the type
/// system — this keeps the enum flat and the mismatch error (spec §7
/// `ScenarioError::PointMismatch`) a single, reportable place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[non_exhaustive]
pub enum FaultKind {
    // --- LLM point ---
    /// The provider call fails as if rate-limited (HTTP 429).
    RateLimit,
    /// The provider call never returns within the harness's deadline.
    Timeout,
    /// The provider call fails with a 5xx-shaped error.
    ServerError,
    /// The provider call fails as if credentials were rejected (401/403).
    AuthError,
    /// The provider call "succeeds" but returns a response the provider
    /// adapter cannot parse.
    MalformedResponse,

    // --- STREAM point ---
    /// Delay the first chunk of a streaming response by a fixed amount.
    TtftDelay {
        /// How long to hold back the first chunk.
        delay: DurationMs,
    },
    /// Stop emitting chunks after `after_chunks`, without ever closing
    /// the stream (the caller hangs until its own timeout fires).
    StreamHang {
        /// Number of chunks to emit normally before hanging.
        after_chunks: u32,
    },
    /// Close the stream abruptly after `after_chunks`, before the
    /// terminal event (`message_stop`) is reached.
    StreamCut {
        /// Number of chunks to emit normally before cutting.
        after_chunks: u32,
    },
    /// Insert a fixed delay before every chunk.
    SlowChunks {
        /// Delay applied before each chunk.
        per_chunk_delay: DurationMs,
    },
    /// Emit a structurally invalid event into the stream.
    Corrupt {
        /// What kind of corruption to apply.
        event_kind: CorruptEventKind,
        /// Kind-specific parameters (e.g. which chunk index to corrupt).
        parameters: serde_json::Value,
    },

    // --- TOOL point ---
    /// Replace a tool's result with an error.
    ToolError {
        /// The tool name this fault targets (empty matches any tool).
        tool: String,
        /// The error message to report in place of the real result.
        message: String,
    },
    /// The tool never returns within the harness's deadline.
    ToolTimeout {
        /// The tool name this fault targets (empty matches any tool).
        tool: String,
    },
    /// Replace a tool's result with an empty one.
    ToolEmpty {
        /// The tool name this fault targets (empty matches any tool).
        tool: String,
    },
    /// Rewrite a tool's result through a pure mutator.
    ToolMutate {
        /// The tool name this fault targets (empty matches any tool).
        tool: String,
        /// The transform applied to the tool's serialized result.
        mutator: Mutator,
    },

    // --- USER_INPUT point ---
    /// Rewrite the turn's resolved input through a pure mutator.
    UserInputMutate {
        /// The transform applied to the input text.
        mutator: Mutator,
    },

    // --- CONTEXT point ---
    /// Keep only the last `keep_last` conversation entries.
    Truncate {
        /// How many trailing entries to keep.
        keep_last: usize,
    },
    /// Append synthetic entries to the conversation.
    Inject {
        /// The entries to append.
        messages: Vec<ConversationEntry>,
    },
    /// Remove conversation entries matching a predicate.
    Remove {
        /// The predicate deciding which entries to drop.
        predicate: RemovePredicate,
    },
    /// Rewrite every conversation entry's content through a pure mutator.
    ContextMutate {
        /// The transform applied to each entry's content.
        mutator: Mutator,
    },
}

impl FaultKind {
    /// A short, stable tag identifying this fault's kind, independent of
    /// its parameters. Used for event logs and fingerprints.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FaultKind::RateLimit => "rate_limit",
            FaultKind::Timeout => "timeout",
            FaultKind::ServerError => "server_error",
            FaultKind::AuthError => "auth_error",
            FaultKind::MalformedResponse => "malformed_response",
            FaultKind::TtftDelay { .. } => "ttft_delay",
            FaultKind::StreamHang { .. } => "stream_hang",
            FaultKind::StreamCut { .. } => "stream_cut",
            FaultKind::SlowChunks { .. } => "slow_chunks",
            FaultKind::Corrupt { .. } => "corrupt",
            FaultKind::ToolError { .. } => "tool_error",
            FaultKind::ToolTimeout { .. } => "tool_timeout",
            FaultKind::ToolEmpty { .. } => "tool_empty",
            FaultKind::ToolMutate { .. } => "tool_mutate",
            FaultKind::UserInputMutate { .. } => "user_input_mutate",
            FaultKind::Truncate { .. } => "truncate",
            FaultKind::Inject { .. } => "inject",
            FaultKind::Remove { .. } => "remove",
            FaultKind::ContextMutate { .. } => "context_mutate",
        }
    }

    /// The single interception point this fault is valid at.
    pub fn point(&self) -> crate::point::ChaosPoint {
        use crate::point::ChaosPoint;
        match self {
            FaultKind::RateLimit
            | FaultKind::Timeout
            | FaultKind::ServerError
            | FaultKind::AuthError
            | FaultKind::MalformedResponse => ChaosPoint::Llm,

            FaultKind::TtftDelay { .. }
            | FaultKind::StreamHang { .. }
            | FaultKind::StreamCut { .. }
            | FaultKind::SlowChunks { .. }
            | FaultKind::Corrupt { .. } => ChaosPoint::Stream,

            FaultKind::ToolError { .. }
            | FaultKind::ToolTimeout { .. }
            | FaultKind::ToolEmpty { .. }
            | FaultKind::ToolMutate { .. } => ChaosPoint::Tool,

            FaultKind::UserInputMutate { .. } => ChaosPoint::UserInput,

            FaultKind::Truncate { .. }
            | FaultKind::Inject { .. }
            | FaultKind::Remove { .. }
            | FaultKind::ContextMutate { .. } => ChaosPoint::Context,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::ChaosPoint;

    #[test]
    fn kind_name_is_stable_and_parameter_independent() {
        let a = FaultKind::StreamCut { after_chunks: 3 };
        let b = FaultKind::StreamCut { after_chunks: 300 };
        assert_eq!(a.kind_name(), b.kind_name());
        assert_eq!(a.kind_name(), "stream_cut");
    }

    #[test]
    fn point_mapping_matches_spec_groupings() {
        assert_eq!(FaultKind::RateLimit.point(), ChaosPoint::Llm);
        assert_eq!(
            FaultKind::TtftDelay { delay: DurationMs::ZERO }.point(),
            ChaosPoint::Stream
        );
        assert_eq!(
            FaultKind::ToolError { tool: String::new(), message: String::new() }.point(),
            ChaosPoint::Tool
        );
        assert_eq!(
            FaultKind::UserInputMutate { mutator: Mutator::new("noop", |s| s.to_string()) }.point(),
            ChaosPoint::UserInput
        );
        assert_eq!(FaultKind::Truncate { keep_last: 1 }.point(), ChaosPoint::Context);
    }

    #[test]
    fn mutator_applies_wrapped_closure() {
        let m = Mutator::new("uppercase", |s: &str| s.to_uppercase());
        assert_eq!(m.apply("hi"), "HI");
        assert_eq!(m.name(), "uppercase");
    }

    #[test]
    fn remove_predicate_matches_on_role() {
        use crate::metrics::Role;
        let p = RemovePredicate::new("drop-tool-entries", |e: &ConversationEntry| e.role == Role::Tool);
        let tool_entry = ConversationEntry::new(Role::Tool, "result", 0);
        let user_entry = ConversationEntry::new(Role::User, "hi", 0);
        assert!(p.matches(&tool_entry));
        assert!(!p.matches(&user_entry));
    }
}
