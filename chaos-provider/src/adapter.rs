//! The provider adapter (spec §4.5 `ProviderAdapter`) — a transparent
//! wrapper around a [`Backend`] that applies the injector's verdicts
//! without the agent under test ever knowing interception is happening.
//!
//! Real providers monkey-patch a client's request/response/streaming
//! methods at runtime (spec §9 design note). Rust has no equivalent, so
//! the seam here is a [`ProviderHandle`]: a swappable reference the
//! agent always calls through. `install` swaps in a [`ProviderAdapter`]
//! wrapping the real backend; `uninstall` swaps the original reference
//! back, restoring identity (spec §8 "after uninstall, the provider
//! module's intercepted references are equal... to their pre-install
//! values").

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chaos_core::prelude::{
    CallId, CallRecord, ChaosPoint, DurationMs, FaultKind, FaultRecord, SpanId, ToolTrackingEntry,
    ToolUseId,
};
use chaos_core::trigger::TriggerContext;
use chaos_engine::{Injection, Injector, Recorder};
use chrono::Utc;
use futures::StreamExt;
use tokio::sync::RwLock;

use crate::backend::{Backend, ChunkStream};
use crate::error::{AdapterError, ProviderError};
use crate::types::{CallContext, CompletionRequest, CompletionResponse};

/// Map an injector verdict to the error an agent should observe, or
/// escalate to [`AdapterError::FactoryFailure`] if `fault` isn't a
/// LLM-stage fault at all — a chaos rule misconfigured to fire at the
/// wrong chaos point, not anything a real provider could produce.
fn mapped_llm_error(fault: &FaultKind) -> ProviderError {
    match ProviderError::from_injected_fault(fault) {
        Some(mapped) => mapped,
        None => {
            let err = AdapterError::FactoryFailure(format!(
                "fault factory produced a non-LLM fault {fault:?} at the LLM chaos point"
            ));
            tracing::error!(error = %err, "malformed chaos rule reached the LLM point");
            ProviderError::from(err)
        }
    }
}

fn fault_parameters(fault: &FaultKind) -> serde_json::Value {
    serde_json::to_value(fault).unwrap_or(serde_json::json!({}))
}

/// A swappable reference to "the current backend" an agent calls
/// through.
///
/// The agent is constructed once against a handle, never against a
/// concrete backend — so installing or removing interception never
/// requires the agent to be rebuilt, mirroring the teacher's pattern of
/// handing operators an `Arc<dyn Operator>` seam rather than a concrete
/// type.
enum HandleState {
    Uninstalled,
    Installed(Arc<ProviderAdapter>),
}

pub struct ProviderHandle {
    original: Arc<dyn Backend>,
    state: RwLock<HandleState>,
}

impl ProviderHandle {
    /// Wrap a real (or mock) backend. Initially uninstalled: callers see
    /// `original` directly.
    pub fn new(original: Arc<dyn Backend>) -> Self {
        Self { original, state: RwLock::new(HandleState::Uninstalled) }
    }

    /// Install interception: subsequent [`ProviderHandle::current`] and
    /// [`ProviderHandle::call_tool`] calls route through a
    /// [`ProviderAdapter`] wrapping the original backend. Idempotent —
    /// calling twice just re-wraps the same original, discarding the
    /// first adapter's fire-count bookkeeping.
    pub async fn install(&self, injector: Arc<Injector>, recorder: Arc<Recorder>) {
        let adapter = Arc::new(ProviderAdapter::new(self.original.clone(), injector, recorder));
        *self.state.write().await = HandleState::Installed(adapter);
        tracing::info!(provider = self.original.name(), "provider interception installed");
    }

    /// Remove interception, restoring the original backend reference.
    /// Idempotent and safe to call without a prior `install`.
    pub async fn uninstall(&self) {
        *self.state.write().await = HandleState::Uninstalled;
        tracing::info!(provider = self.original.name(), "provider interception removed");
    }

    /// The backend callers should use right now — the real thing, or the
    /// adapter, depending on install state.
    pub async fn current(&self) -> Arc<dyn Backend> {
        match &*self.state.read().await {
            HandleState::Uninstalled => self.original.clone(),
            HandleState::Installed(adapter) => adapter.clone() as Arc<dyn Backend>,
        }
    }

    /// Whether interception is currently removed (spec §8 round-trip
    /// property: `install(); uninstall(); install(); uninstall()` leaves
    /// the handle equivalent to its initial state).
    pub async fn is_original(&self) -> bool {
        matches!(&*self.state.read().await, HandleState::Uninstalled)
    }

    /// Run one tool invocation through whichever adapter is currently
    /// installed, or straight through if interception isn't installed.
    /// The TOOL interception point is only reachable through the handle,
    /// not through [`Backend`], since tool calls aren't part of that
    /// trait's surface.
    pub async fn call_tool<F, Fut>(
        &self,
        ctx: &CallContext,
        tool_use_id: ToolUseId,
        name: &str,
        requested_in_call_id: CallId,
        arg_bytes: usize,
        run: F,
    ) -> ToolOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = String>,
    {
        match &*self.state.read().await {
            HandleState::Installed(adapter) => {
                adapter.call_tool(ctx, tool_use_id, name, requested_in_call_id, arg_bytes, run).await
            }
            HandleState::Uninstalled => ToolOutcome { result: run().await, success: true, injected: false },
        }
    }
}

/// The outcome of one intercepted tool invocation (spec §4.5 tool
/// tracking).
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    /// The tool's result text, genuine or fault-substituted.
    pub result: String,
    /// Whether the tool call is considered to have succeeded.
    pub success: bool,
    /// Whether a chaos rule altered this outcome.
    pub injected: bool,
}

/// Wraps one [`Backend`], applying the injector's verdicts at the LLM and
/// STREAM points, and exposing [`ProviderAdapter::call_tool`] for the
/// TOOL point.
///
/// Never constructed directly by agent code — always reached through a
/// [`ProviderHandle`].
pub struct ProviderAdapter {
    inner: Arc<dyn Backend>,
    injector: Arc<Injector>,
    recorder: Arc<Recorder>,
}

impl ProviderAdapter {
    /// Wrap `inner`, consulting `injector` and funneling everything
    /// observed through `recorder`.
    pub fn new(inner: Arc<dyn Backend>, injector: Arc<Injector>, recorder: Arc<Recorder>) -> Self {
        Self { inner, injector, recorder }
    }

    fn trigger_ctx(ctx: &CallContext, tool_name: Option<&str>) -> TriggerContext<'_> {
        TriggerContext {
            turn_index: ctx.turn_index,
            call_index_in_turn: ctx.call_index_in_turn,
            call_index_in_run: ctx.call_index_in_run,
            tool_name,
        }
    }

    async fn record_fault(&self, span_id: SpanId, call_id: &CallId, point: ChaosPoint, ctx: &CallContext, injection: &Injection) {
        let record = FaultRecord {
            fault_type: injection.fault.kind_name().to_string(),
            point,
            parameters: fault_parameters(&injection.fault),
            origin_rule_fingerprint: injection.rule_fingerprint.clone(),
            call_id: Some(call_id.clone()),
            turn_index: ctx.turn_index,
            timestamp: Utc::now(),
        };
        self.recorder.fault_injected(Some(span_id), record).await;
    }

    async fn record_injected_llm_failure(
        &self,
        span_id: SpanId,
        call_id: CallId,
        ctx: &CallContext,
        error: &ProviderError,
    ) {
        let call_record = CallRecord {
            call_id,
            turn_index: ctx.turn_index,
            call_index_in_turn: ctx.call_index_in_turn,
            call_index_in_run: ctx.call_index_in_run,
            provider: Some(self.inner.name().to_string()),
            success: false,
            injected: true,
            error: Some(error.to_string()),
            input_tokens: 0,
            output_tokens: 0,
            latency: DurationMs::ZERO,
            started_at: Utc::now(),
            ended_at: Utc::now(),
        };
        self.recorder.call_completed(span_id, call_record).await;
    }

    /// Wrap one tool invocation, the TOOL interception point (spec §4.5,
    /// §3 `ToolTracking`). `run` performs the genuine tool call; this
    /// method decides whether to call it at all, and whether to rewrite
    /// its result, based on the injector's verdict for `name`.
    ///
    /// `TOOL_TIMEOUT` is reported immediately rather than actually
    /// hanging, consistent with how the LLM-point `Timeout` fault is
    /// raised rather than simulated by a real multi-second sleep — the
    /// harness's deadline enforcement (spec §4.7) is what actually makes
    /// time pass, not the fault itself.
    pub async fn call_tool<F, Fut>(
        &self,
        ctx: &CallContext,
        tool_use_id: ToolUseId,
        name: &str,
        requested_in_call_id: CallId,
        arg_bytes: usize,
        run: F,
    ) -> ToolOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = String>,
    {
        let span_id = SpanId::new(requested_in_call_id.as_str().to_string());
        let entry = ToolTrackingEntry::requested(tool_use_id.clone(), name, requested_in_call_id.clone(), arg_bytes);
        self.recorder.tool_start(span_id.clone(), entry).await;

        let started = Instant::now();
        let tctx = Self::trigger_ctx(ctx, Some(name));
        let injection = self.injector.consult(ChaosPoint::Tool, &tctx);

        let outcome = match &injection {
            Some(inj) => match &inj.fault {
                FaultKind::ToolError { message, .. } => ToolOutcome {
                    result: message.clone(),
                    success: false,
                    injected: true,
                },
                FaultKind::ToolTimeout { .. } => ToolOutcome {
                    result: "tool call timed out".to_string(),
                    success: false,
                    injected: true,
                },
                FaultKind::ToolEmpty { .. } => ToolOutcome {
                    result: String::new(),
                    success: true,
                    injected: true,
                },
                FaultKind::ToolMutate { mutator, .. } => {
                    let real = run().await;
                    ToolOutcome {
                        result: mutator.apply(&real),
                        success: true,
                        injected: true,
                    }
                }
                _ => ToolOutcome { result: run().await, success: true, injected: false },
            },
            None => ToolOutcome { result: run().await, success: true, injected: false },
        };

        if let Some(inj) = &injection {
            self.record_fault(span_id.clone(), &requested_in_call_id, ChaosPoint::Tool, ctx, inj).await;
            if outcome.injected {
                self.recorder.tool_faulted(tool_use_id.as_str());
            }
        }

        self.recorder
            .tool_end(
                span_id,
                tool_use_id.as_str(),
                requested_in_call_id,
                outcome.result.len(),
                started.elapsed().into(),
                outcome.success,
            )
            .await;

        outcome
    }
}

#[async_trait]
impl Backend for ProviderAdapter {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(
        &self,
        request: &CompletionRequest,
        ctx: &CallContext,
    ) -> Result<CompletionResponse, ProviderError> {
        let call_id = CallId::generate();
        let span_id = SpanId::new(call_id.as_str().to_string());
        self.recorder.call_started(span_id.clone(), self.inner.name()).await;

        let tctx = Self::trigger_ctx(ctx, None);
        if let Some(injection) = self.injector.consult(ChaosPoint::Llm, &tctx) {
            let mapped = mapped_llm_error(&injection.fault);
            self.record_fault(span_id.clone(), &call_id, ChaosPoint::Llm, ctx, &injection).await;
            self.record_injected_llm_failure(span_id, call_id, ctx, &mapped).await;
            return Err(mapped);
        }

        let started_at = Utc::now();
        let start = Instant::now();
        let result = self.inner.complete(request, ctx).await;
        let ended_at = Utc::now();
        let latency: DurationMs = start.elapsed().into();

        match result {
            Ok(response) => {
                let call_record = CallRecord {
                    call_id: call_id.clone(),
                    turn_index: ctx.turn_index,
                    call_index_in_turn: ctx.call_index_in_turn,
                    call_index_in_run: ctx.call_index_in_run,
                    provider: Some(self.inner.name().to_string()),
                    success: true,
                    injected: false,
                    error: None,
                    input_tokens: response.input_tokens,
                    output_tokens: response.output_tokens,
                    latency,
                    started_at,
                    ended_at,
                };
                self.recorder.call_completed(span_id.clone(), call_record).await;
                for (tool_use_id, name, input) in response.tool_uses() {
                    let entry = ToolTrackingEntry::requested(
                        tool_use_id.clone(),
                        name,
                        call_id.clone(),
                        input.to_string().len(),
                    );
                    self.recorder.tool_use(span_id.clone(), entry).await;
                }
                Ok(response)
            }
            Err(err) => {
                let call_record = CallRecord {
                    call_id,
                    turn_index: ctx.turn_index,
                    call_index_in_turn: ctx.call_index_in_turn,
                    call_index_in_run: ctx.call_index_in_run,
                    provider: Some(self.inner.name().to_string()),
                    success: false,
                    injected: false,
                    error: Some(err.to_string()),
                    input_tokens: 0,
                    output_tokens: 0,
                    latency,
                    started_at,
                    ended_at,
                };
                tracing::warn!(error = %err, "provider call failed (not injected)");
                self.recorder.call_completed(span_id, call_record).await;
                Err(err)
            }
        }
    }

    async fn complete_stream(
        &self,
        request: &CompletionRequest,
        ctx: &CallContext,
    ) -> Result<ChunkStream, ProviderError> {
        let call_id = CallId::generate();
        let span_id = SpanId::new(call_id.as_str().to_string());
        self.recorder.call_started(span_id.clone(), self.inner.name()).await;

        let tctx = Self::trigger_ctx(ctx, None);
        if let Some(injection) = self.injector.consult(ChaosPoint::Llm, &tctx) {
            let mapped = mapped_llm_error(&injection.fault);
            self.record_fault(span_id.clone(), &call_id, ChaosPoint::Llm, ctx, &injection).await;
            self.record_injected_llm_failure(span_id, call_id, ctx, &mapped).await;
            return Err(mapped);
        }

        let inner_stream = self.inner.complete_stream(request, ctx).await?;
        let stream_fault = self.injector.consult(ChaosPoint::Stream, &tctx);

        let mut was_cut = false;
        if let Some(injection) = &stream_fault {
            self.record_fault(span_id.clone(), &call_id, ChaosPoint::Stream, ctx, injection).await;
            was_cut = matches!(injection.fault, FaultKind::StreamCut { .. });
            if let FaultKind::StreamHang { after_chunks } = &injection.fault {
                self.recorder.record_stream_hang(span_id.clone(), self.inner.name(), *after_chunks).await;
            }
        }

        let fault_for_wrapper = stream_fault.as_ref().map(|i| i.fault.clone());
        let inner = chaos_engine::wrap_stream(inner_stream, fault_for_wrapper, |_, _, _| {});

        let recorder = self.recorder.clone();
        let provider = self.inner.name().to_string();
        let started_at = Utc::now();
        let turn_index = ctx.turn_index;
        let call_index_in_turn = ctx.call_index_in_turn;
        let call_index_in_run = ctx.call_index_in_run;
        let call_id_for_end = call_id.clone();
        let span_id_for_end = span_id.clone();

        let output = async_stream::stream! {
            futures::pin_mut!(inner);
            let started = Instant::now();
            let mut count: u32 = 0;
            let mut total_bytes: usize = 0;
            let mut first = true;
            while let Some(chunk) = inner.next().await {
                if first {
                    recorder.record_ttft(span_id_for_end.clone(), &provider, started.elapsed().into()).await;
                    first = false;
                }
                count += 1;
                total_bytes += chunk.len();
                yield chunk;
            }
            let elapsed: DurationMs = started.elapsed().into();
            if was_cut {
                recorder.record_stream_cut(span_id_for_end.clone(), &provider, count).await;
            }
            recorder.record_stream_stats(span_id_for_end.clone(), &provider, count, total_bytes, elapsed).await;
            let call_record = CallRecord {
                call_id: call_id_for_end,
                turn_index,
                call_index_in_turn,
                call_index_in_run,
                provider: Some(provider.clone()),
                success: !was_cut,
                injected: was_cut,
                error: if was_cut { Some("stream cut by injected fault".to_string()) } else { None },
                input_tokens: 0,
                output_tokens: 0,
                latency: elapsed,
                started_at,
                ended_at: Utc::now(),
            };
            recorder.call_completed(span_id_for_end, call_record).await;
            tracing::debug!(chunks = count, bytes = total_bytes, provider = %provider, "stream completed");
        };

        Ok(Box::pin(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBackend;
    use chaos_core::prelude::{ChaosRule, ConversationEntry, Role, StaticFault, Trigger};
    use chaos_core::test_utils::RecordingSink;
    use chaos_engine::MetricsStore;
    use std::sync::Arc as StdArc;

    fn recorder() -> (Arc<Recorder>, Arc<MetricsStore>, Arc<RecordingSink>) {
        let store = Arc::new(MetricsStore::new());
        let sink = Arc::new(RecordingSink::new());
        let recorder = Arc::new(Recorder::new(
            chaos_core::id::TraceId::new("trace-1"),
            store.clone(),
            sink.clone(),
        ));
        (recorder, store, sink)
    }

    fn request() -> CompletionRequest {
        CompletionRequest::new(vec![ConversationEntry::new(Role::User, "hi", 0)], vec![])
    }

    #[tokio::test]
    async fn install_and_uninstall_restore_original_identity() {
        let backend: Arc<dyn Backend> = Arc::new(MockBackend::new("mock"));
        let handle = ProviderHandle::new(backend);
        assert!(handle.is_original().await);

        let (recorder, _store, _sink) = recorder();
        let injector = Arc::new(Injector::new(vec![], Some(1)));
        handle.install(injector, recorder).await;
        assert!(!handle.is_original().await);

        handle.uninstall().await;
        assert!(handle.is_original().await);
    }

    #[tokio::test]
    async fn double_install_then_uninstall_still_restores_original() {
        let backend: Arc<dyn Backend> = Arc::new(MockBackend::new("mock"));
        let handle = ProviderHandle::new(backend);
        let (recorder, _store, _sink) = recorder();

        handle.install(Arc::new(Injector::new(vec![], Some(1))), recorder.clone()).await;
        handle.install(Arc::new(Injector::new(vec![], Some(1))), recorder).await;
        handle.uninstall().await;
        assert!(handle.is_original().await);
    }

    #[tokio::test]
    async fn llm_fault_short_circuits_without_calling_the_real_backend() {
        let backend: Arc<dyn Backend> = Arc::new(MockBackend::new("mock").with_text_response("should never be seen"));
        let (recorder, store, _sink) = recorder();
        let rule = ChaosRule::new(
            "always-rate-limit",
            ChaosPoint::Llm,
            Trigger::Always,
            StdArc::new(StaticFault::new(FaultKind::RateLimit)),
        )
        .unwrap();
        let injector = Arc::new(Injector::new(vec![rule], Some(1)));
        let adapter = ProviderAdapter::new(backend, injector, recorder);

        let err = adapter.complete(&request(), &CallContext::default()).await.unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited));
        assert_eq!(store.history().len(), 1);
        assert!(!store.history()[0].success);
        assert!(store.history()[0].injected);
        assert_eq!(store.fault_log().len(), 1);
    }

    #[tokio::test]
    async fn a_non_llm_fault_at_the_llm_point_is_a_factory_failure_not_a_server_error() {
        let backend: Arc<dyn Backend> = Arc::new(MockBackend::new("mock").with_text_response("should never be seen"));
        let (recorder, _store, _sink) = recorder();
        let rule = ChaosRule::new(
            "misconfigured-rule",
            ChaosPoint::Llm,
            Trigger::Always,
            StdArc::new(StaticFault::new(FaultKind::ToolError {
                tool: "get_weather".to_string(),
                message: "this belongs at the TOOL point, not LLM".to_string(),
            })),
        )
        .unwrap();
        let injector = Arc::new(Injector::new(vec![rule], Some(1)));
        let adapter = ProviderAdapter::new(backend, injector, recorder);

        let err = adapter.complete(&request(), &CallContext::default()).await.unwrap_err();
        assert!(
            matches!(err, ProviderError::FactoryFailure(_)),
            "expected a FactoryFailure, got {err:?}"
        );
    }

    #[tokio::test]
    async fn successful_call_tracks_tool_use_from_the_response() {
        use crate::types::ContentBlock;

        let response = CompletionResponse {
            content: vec![ContentBlock::ToolUse {
                id: ToolUseId::new("tu-1"),
                name: "get_weather".to_string(),
                input: serde_json::json!({"city": "nyc"}),
            }],
            input_tokens: 5,
            output_tokens: 5,
        };
        let backend: Arc<dyn Backend> = Arc::new(MockBackend::new("mock").with_response(response));
        let (recorder, store, _sink) = recorder();
        let injector = Arc::new(Injector::new(vec![], Some(1)));
        let adapter = ProviderAdapter::new(backend, injector, recorder);

        adapter.complete(&request(), &CallContext::default()).await.unwrap();
        assert_eq!(store.tool_state("tu-1"), Some(chaos_core::metrics::ToolCallState::Requested));
    }

    #[tokio::test]
    async fn call_tool_applies_tool_error_fault_without_running_the_real_tool() {
        let backend: Arc<dyn Backend> = Arc::new(MockBackend::new("mock"));
        let (recorder, store, _sink) = recorder();
        let rule = ChaosRule::new(
            "weather-tool-error",
            ChaosPoint::Tool,
            Trigger::TargetingTool { tool: "get_weather".to_string() },
            StdArc::new(StaticFault::new(FaultKind::ToolError {
                tool: "get_weather".to_string(),
                message: "503 from weather service".to_string(),
            })),
        )
        .unwrap();
        let injector = Arc::new(Injector::new(vec![rule], Some(1)));
        let adapter = ProviderAdapter::new(backend, injector, recorder);

        let mut real_tool_called = false;
        let outcome = adapter
            .call_tool(
                &CallContext::default(),
                ToolUseId::new("tu-1"),
                "get_weather",
                CallId::new("call-1"),
                16,
                || async {
                    real_tool_called = true;
                    "72F and sunny".to_string()
                },
            )
            .await;

        assert!(!outcome.success);
        assert!(outcome.injected);
        assert_eq!(outcome.result, "503 from weather service");
        assert!(!real_tool_called);
        assert_eq!(store.tool_state("tu-1"), Some(chaos_core::metrics::ToolCallState::Resolved));
        assert_eq!(store.fault_log().len(), 1);
    }

    #[tokio::test]
    async fn call_tool_leaves_other_tool_names_untouched() {
        let backend: Arc<dyn Backend> = Arc::new(MockBackend::new("mock"));
        let (recorder, store, _sink) = recorder();
        let rule = ChaosRule::new(
            "weather-tool-error",
            ChaosPoint::Tool,
            Trigger::TargetingTool { tool: "get_weather".to_string() },
            StdArc::new(StaticFault::new(FaultKind::ToolError {
                tool: "get_weather".to_string(),
                message: "boom".to_string(),
            })),
        )
        .unwrap();
        let injector = Arc::new(Injector::new(vec![rule], Some(1)));
        let adapter = ProviderAdapter::new(backend, injector, recorder);

        let outcome = adapter
            .call_tool(
                &CallContext::default(),
                ToolUseId::new("tu-2"),
                "search",
                CallId::new("call-1"),
                16,
                || async { "results".to_string() },
            )
            .await;

        assert!(outcome.success);
        assert!(!outcome.injected);
        assert_eq!(outcome.result, "results");
        assert!(store.fault_log().is_empty());
    }

    #[tokio::test]
    async fn stream_cut_marks_the_call_failed_and_injected() {
        let backend: Arc<dyn Backend> = Arc::new(MockBackend::new("mock").with_text_response("hello there friend"));
        let (recorder, store, sink) = recorder();
        let rule = ChaosRule::new(
            "cut-after-one",
            ChaosPoint::Stream,
            Trigger::Always,
            StdArc::new(StaticFault::new(FaultKind::StreamCut { after_chunks: 1 })),
        )
        .unwrap();
        let injector = Arc::new(Injector::new(vec![rule], Some(1)));
        let adapter = ProviderAdapter::new(backend, injector, recorder);

        let stream = adapter.complete_stream(&request(), &CallContext::default()).await.unwrap();
        let chunks: Vec<Vec<u8>> = stream.collect().await;
        assert_eq!(chunks.len(), 1);
        assert_eq!(store.history().len(), 1);
        assert!(!store.history()[0].success);
        assert!(store.history()[0].injected);
        assert_eq!(store.stream_stats().cut_events, 1);

        let cut_event = sink
            .events()
            .into_iter()
            .find(|e| e.event_type == chaos_core::event::EventType::StreamCut)
            .expect("a StreamCut event must be emitted, not just counted in stream_stats");
        assert_eq!(cut_event.data["chunk_count"], 1);
    }

    #[tokio::test]
    async fn no_stream_fault_completes_the_call_successfully() {
        let backend: Arc<dyn Backend> = Arc::new(MockBackend::new("mock").with_text_response("hi there"));
        let (recorder, store, _sink) = recorder();
        let injector = Arc::new(Injector::new(vec![], Some(1)));
        let adapter = ProviderAdapter::new(backend, injector, recorder);

        let stream = adapter.complete_stream(&request(), &CallContext::default()).await.unwrap();
        let chunks: Vec<Vec<u8>> = stream.collect().await;
        assert!(!chunks.is_empty());
        assert_eq!(store.history().len(), 1);
        assert!(store.history()[0].success);
        assert!(!store.history()[0].injected);
    }
}
