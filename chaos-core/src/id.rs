//! Typed ID wrappers for the traces, spans, calls, and tool uses the
//! harness observes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Typed ID wrappers prevent mixing up a span id for a call id, a call id
/// for a tool-use id, and so on. These are plain strings underneath — no
/// format is enforced, since the harness doesn't care whether a caller's
/// ids are UUIDs, sequential integers, or provider-native identifiers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            /// Create a new typed id from anything that converts to `String`.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generate a fresh random id (v4 UUID).
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Borrow the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

typed_id!(TraceId, "Unique identifier for one scenario run.");
typed_id!(SpanId, "Unique identifier for one intercepted LLM call.");
typed_id!(CallId, "Unique identifier for one LLM call (equal to its span id).");
typed_id!(ToolUseId, "Unique identifier for one tool invocation.");
typed_id!(SessionId, "Unique identifier for a conversation session.");
