//! A simulated [`Backend`] for scenarios and tests — no network calls,
//! shaped loosely on the Anthropic Messages API's content-block and SSE
//! event vocabulary (`content_block_start`/`_delta`/`_stop`,
//! `message_stop`) since that's the shape the rest of the workspace's
//! stream-fault handling was grounded on.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream;

use crate::backend::{Backend, ChunkStream};
use crate::error::ProviderError;
use crate::types::{CallContext, CompletionRequest, CompletionResponse, ContentBlock};

/// Queues canned responses and hands them out in order; once the queue
/// is empty, echoes the last user message back as plain text.
pub struct MockBackend {
    name: String,
    responses: Mutex<VecDeque<CompletionResponse>>,
}

impl MockBackend {
    /// Create a mock backend with no canned responses queued.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), responses: Mutex::new(VecDeque::new()) }
    }

    /// Queue a response to be returned on the next call.
    pub fn with_response(self, response: CompletionResponse) -> Self {
        self.responses.lock().expect("MockBackend mutex poisoned").push_back(response);
        self
    }

    /// Queue a plain-text response.
    pub fn with_text_response(self, text: impl Into<String>) -> Self {
        self.with_response(CompletionResponse {
            content: vec![ContentBlock::Text { text: text.into() }],
            input_tokens: 10,
            output_tokens: 10,
        })
    }

    fn next_response(&self, request: &CompletionRequest) -> CompletionResponse {
        let mut queue = self.responses.lock().expect("MockBackend mutex poisoned");
        if let Some(response) = queue.pop_front() {
            return response;
        }
        let echo = request
            .messages
            .last()
            .map(|m| format!("echo: {}", m.content))
            .unwrap_or_else(|| "echo: (empty conversation)".to_string());
        CompletionResponse {
            content: vec![ContentBlock::Text { text: echo }],
            input_tokens: 5,
            output_tokens: 5,
        }
    }
}

/// Render a response's text as a sequence of Anthropic-shaped SSE chunk
/// bytes: one `content_block_start`, one `content_block_delta` per word,
/// a `content_block_stop`, then `message_stop`.
fn render_sse_chunks(response: &CompletionResponse) -> Vec<Vec<u8>> {
    let mut chunks = Vec::new();
    chunks.push(
        b"event: content_block_start\ndata: {\"type\":\"content_block_start\",\"index\":0,\"content_block\":{\"type\":\"text\",\"text\":\"\"}}\n\n"
            .to_vec(),
    );
    for word in response.text().split_inclusive(' ') {
        let data = serde_json::json!({
            "type": "content_block_delta",
            "index": 0,
            "delta": {"type": "text_delta", "text": word},
        });
        chunks.push(format!("event: content_block_delta\ndata: {data}\n\n").into_bytes());
    }
    chunks.push(b"event: content_block_stop\ndata: {\"type\":\"content_block_stop\",\"index\":0}\n\n".to_vec());
    let usage = serde_json::json!({
        "type": "message_delta",
        "usage": {"input_tokens": response.input_tokens, "output_tokens": response.output_tokens},
    });
    chunks.push(format!("event: message_delta\ndata: {usage}\n\n").into_bytes());
    chunks.push(b"event: message_stop\ndata: {\"type\":\"message_stop\"}\n\n".to_vec());
    chunks
}

#[async_trait]
impl Backend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: &CompletionRequest,
        _ctx: &CallContext,
    ) -> Result<CompletionResponse, ProviderError> {
        Ok(self.next_response(request))
    }

    async fn complete_stream(
        &self,
        request: &CompletionRequest,
        _ctx: &CallContext,
    ) -> Result<ChunkStream, ProviderError> {
        let response = self.next_response(request);
        let chunks = render_sse_chunks(&response);
        Ok(Box::pin(stream::iter(chunks)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaos_core::prelude::{ConversationEntry, Role};
    use futures::StreamExt;

    fn request(text: &str) -> CompletionRequest {
        CompletionRequest::new(vec![ConversationEntry::new(Role::User, text, 0)], vec![])
    }

    #[tokio::test]
    async fn returns_queued_responses_in_order() {
        let backend = MockBackend::new("mock").with_text_response("first").with_text_response("second");
        let ctx = CallContext::default();
        let r1 = backend.complete(&request("hi"), &ctx).await.unwrap();
        let r2 = backend.complete(&request("hi"), &ctx).await.unwrap();
        assert_eq!(r1.text(), "first");
        assert_eq!(r2.text(), "second");
    }

    #[tokio::test]
    async fn echoes_last_message_when_queue_is_empty() {
        let backend = MockBackend::new("mock");
        let ctx = CallContext::default();
        let response = backend.complete(&request("ping"), &ctx).await.unwrap();
        assert_eq!(response.text(), "echo: ping");
    }

    #[tokio::test]
    async fn stream_yields_sse_shaped_chunks_ending_in_message_stop() {
        let backend = MockBackend::new("mock").with_text_response("hi there");
        let ctx = CallContext::default();
        let chunks: Vec<Vec<u8>> = backend.complete_stream(&request("hi"), &ctx).await.unwrap().collect().await;
        let last = String::from_utf8(chunks.last().unwrap().clone()).unwrap();
        assert!(last.contains("message_stop"));
        let joined: String = chunks.iter().map(|c| String::from_utf8_lossy(c)).collect();
        assert!(joined.contains("content_block_delta"));
    }
}
