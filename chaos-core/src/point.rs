//! Interception points — the five places a chaos rule can bind to.

use serde::{Deserialize, Serialize};

/// Where in the agent/provider pipeline a chaos rule may intercept.
///
/// Ordered the way a single turn encounters them: the user's input is
/// resolved first, then the (possibly repeated) LLM/stream/tool cycle,
/// then the conversation history is available for the next turn's
/// context-stage rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChaosPoint {
    /// Before the turn's input reaches the agent.
    UserInput,
    /// Around an LLM request, before the provider is contacted.
    Llm,
    /// Chunk-by-chunk, inside a streaming LLM response.
    Stream,
    /// Around a tool invocation's result.
    Tool,
    /// Against the conversation history between turns.
    Context,
}
