//! Request/response shapes the provider layer intercepts.
//!
//! Deliberately smaller than any one real provider's wire format (spec
//! §1: concrete provider SDKs are external collaborators) — just enough
//! structure for fault injection to have something to act on: message
//! history in, content blocks plus token usage out.

use chaos_core::prelude::{ConversationEntry, ToolUseId};
use serde::{Deserialize, Serialize};

/// A tool the model may choose to call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    /// The tool's name, as the model will reference it.
    pub name: String,
    /// A natural-language description shown to the model.
    pub description: String,
    /// The tool's input schema.
    pub schema: serde_json::Value,
}

/// A request to complete, or stream a completion for, one LLM call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// The conversation so far, oldest first.
    pub messages: Vec<ConversationEntry>,
    /// Tools available to the model for this call.
    pub tools: Vec<ToolSpec>,
}

impl CompletionRequest {
    /// Build a request from the conversation and available tools.
    pub fn new(messages: Vec<ConversationEntry>, tools: Vec<ToolSpec>) -> Self {
        Self { messages, tools }
    }
}

/// One piece of a model's response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text output.
    Text {
        /// The text itself.
        text: String,
    },
    /// A request to invoke a tool.
    ToolUse {
        /// The tool use's unique id.
        id: ToolUseId,
        /// The tool's name.
        name: String,
        /// The tool's input arguments.
        input: serde_json::Value,
    },
}

/// A completed (non-streaming) model response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The response's content, in order.
    pub content: Vec<ContentBlock>,
    /// Input tokens billed for this call.
    pub input_tokens: u64,
    /// Output tokens billed for this call.
    pub output_tokens: u64,
}

impl CompletionResponse {
    /// Concatenate every text block's content, ignoring tool uses.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::ToolUse { .. } => None,
            })
            .collect()
    }

    /// Every tool use requested by this response, in order.
    pub fn tool_uses(&self) -> Vec<(&ToolUseId, &str, &serde_json::Value)> {
        self.content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::ToolUse { id, name, input } => Some((id, name.as_str(), input)),
                ContentBlock::Text { .. } => None,
            })
            .collect()
    }
}

/// Which call, within which turn, within which run, a provider call
/// belongs to — enough for the injector to decide whether a chaos rule
/// fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallContext {
    /// The 0-based turn index.
    pub turn_index: usize,
    /// The 0-based call index within the turn.
    pub call_index_in_turn: usize,
    /// The 0-based call index across the whole run.
    pub call_index_in_run: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_ignores_tool_use_blocks() {
        let response = CompletionResponse {
            content: vec![
                ContentBlock::Text { text: "hello ".to_string() },
                ContentBlock::ToolUse {
                    id: ToolUseId::new("tu1"),
                    name: "search".to_string(),
                    input: serde_json::json!({}),
                },
                ContentBlock::Text { text: "world".to_string() },
            ],
            input_tokens: 1,
            output_tokens: 1,
        };
        assert_eq!(response.text(), "hello world");
        assert_eq!(response.tool_uses().len(), 1);
    }
}
