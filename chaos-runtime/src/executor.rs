//! The turn executor (spec §4.7) — drives one user-to-assistant cycle
//! per turn, applying USER_INPUT- and CONTEXT-stage chaos rules around
//! the agent call, and enforcing the scenario's per-turn deadline.
//!
//! Grounded on the teacher's `TimeoutMiddleware`
//! (`neuron-tool::builtin::TimeoutMiddleware`): wrap the inner future in
//! `tokio::time::timeout` and turn an elapsed deadline into a typed
//! error rather than letting the future run forever.

use std::sync::Arc;
use std::time::Instant;

use chaos_assert::evaluate_all;
use chaos_core::assertion::{Assertion, AssertionContext};
use chaos_core::prelude::{
    ChaosPoint, ConversationEntry, DurationMs, FaultKind, FaultRecord, Role, Turn,
};
use chaos_core::report::TurnSummary;
use chaos_core::trigger::TriggerContext;
use chrono::Utc;

use crate::context::{Agent, ScenarioContext};
use crate::error::TurnError;

/// Drives a scenario's turns against an [`Agent`], applying the
/// USER_INPUT and CONTEXT chaos points around each one, and checking the
/// scenario's turn-scoped assertions against the partial report as each
/// turn completes (spec §4.7 step 6).
pub struct TurnExecutor {
    turn_timeout: Option<DurationMs>,
    assertions: Vec<Arc<dyn Assertion>>,
}

impl TurnExecutor {
    /// Build an executor bounding every turn by `turn_timeout`, if set,
    /// and checking `assertions` against the run's partial state after
    /// every turn.
    pub fn new(turn_timeout: Option<DurationMs>, assertions: Vec<Arc<dyn Assertion>>) -> Self {
        Self { turn_timeout, assertions }
    }

    fn trigger_ctx(turn_index: usize) -> TriggerContext<'static> {
        TriggerContext { turn_index, call_index_in_turn: 0, call_index_in_run: 0, tool_name: None }
    }

    /// Apply a USER_INPUT-stage fault to the turn's resolved input, if
    /// one fires. Returns the (possibly rewritten) input.
    async fn apply_user_input_fault(&self, ctx: &ScenarioContext, turn_index: usize, input: String) -> String {
        let tctx = Self::trigger_ctx(turn_index);
        let Some(injection) = ctx.injector.consult(ChaosPoint::UserInput, &tctx) else {
            return input;
        };
        let FaultKind::UserInputMutate { mutator } = &injection.fault else {
            let fault = &injection.fault;
            tracing::warn!(?fault, "injector returned a non-USER_INPUT fault at the USER_INPUT point");
            return input;
        };
        let mutated = mutator.apply(&input);
        let record = FaultRecord {
            fault_type: injection.fault.kind_name().to_string(),
            point: ChaosPoint::UserInput,
            parameters: serde_json::json!({"mutator": mutator.name()}),
            origin_rule_fingerprint: injection.rule_fingerprint.clone(),
            call_id: None,
            turn_index,
            timestamp: Utc::now(),
        };
        ctx.recorder.fault_injected(None, record).await;
        mutated
    }

    /// Apply a CONTEXT-stage fault to the conversation ahead of this
    /// turn's call, if one fires and actually changes observed state
    /// (spec §3 invariant: a fault is recorded only if it altered
    /// behavior — an empty `Inject`, a no-op `Truncate`, or a `Remove`
    /// that matched nothing are silent).
    async fn apply_context_fault(&self, ctx: &ScenarioContext, turn_index: usize) {
        let tctx = Self::trigger_ctx(turn_index);
        let Some(injection) = ctx.injector.consult(ChaosPoint::Context, &tctx) else {
            return;
        };

        let parameters = match &injection.fault {
            FaultKind::Truncate { keep_last } => {
                let removed = ctx.recorder.truncate_conversation(*keep_last);
                if removed == 0 {
                    return;
                }
                serde_json::json!({"keep_last": keep_last, "removed_count": removed})
            }
            FaultKind::Inject { messages } => {
                if messages.is_empty() {
                    return;
                }
                let added = messages.len();
                ctx.recorder.inject_conversation(messages.clone());
                serde_json::json!({"added_count": added})
            }
            FaultKind::Remove { predicate } => {
                let removed = ctx.recorder.remove_conversation_where(|e| predicate.matches(e));
                if removed == 0 {
                    return;
                }
                serde_json::json!({"predicate": predicate.name(), "removed_count": removed})
            }
            FaultKind::ContextMutate { mutator } => {
                let before = ctx.conversation();
                ctx.recorder.mutate_conversation(|s| mutator.apply(s));
                let after = ctx.conversation();
                let changed = before
                    .entries()
                    .iter()
                    .zip(after.entries())
                    .any(|(a, b)| a.content != b.content);
                if !changed {
                    return;
                }
                serde_json::json!({"mutator": mutator.name(), "entries_mutated": after.len()})
            }
            other => {
                tracing::warn!(fault = ?other, "injector returned a non-CONTEXT fault at the CONTEXT point");
                return;
            }
        };

        let record = FaultRecord {
            fault_type: injection.fault.kind_name().to_string(),
            point: ChaosPoint::Context,
            parameters,
            origin_rule_fingerprint: injection.rule_fingerprint.clone(),
            call_id: None,
            turn_index,
            timestamp: Utc::now(),
        };
        ctx.recorder.fault_injected(None, record).await;
    }

    /// Run one turn to completion: resolve its input, apply USER_INPUT
    /// and CONTEXT faults, call the agent under the turn's deadline (if
    /// any), and record the outcome.
    pub async fn run_turn(&self, ctx: &Arc<ScenarioContext>, turn_index: usize, turn: &Turn, agent: &dyn Agent) -> TurnSummary {
        ctx.begin_turn(turn_index);
        ctx.recorder.turn_started(turn_index, turn.label.as_deref()).await;
        tracing::info!(turn_index, label = turn.label.as_deref(), "turn started");

        let conversation = ctx.conversation();
        let resolved = turn.input.resolve(&conversation);
        let input = self.apply_user_input_fault(ctx, turn_index, resolved).await;

        self.apply_context_fault(ctx, turn_index).await;

        ctx.recorder.push_conversation(ConversationEntry::new(Role::User, input.clone(), turn_index));

        let started = Instant::now();
        let run_future = agent.respond(&input, ctx);
        let outcome = match self.turn_timeout {
            Some(timeout) => match tokio::time::timeout(timeout.to_std(), run_future).await {
                Ok(result) => result.map_err(TurnError::from),
                Err(_elapsed) => {
                    let elapsed_ms = started.elapsed().as_millis() as u64;
                    tracing::warn!(turn_index, elapsed_ms, "turn exceeded its deadline");
                    Err(TurnError::Timeout { turn_index, elapsed_ms })
                }
            },
            None => run_future.await.map_err(TurnError::from),
        };
        let duration: DurationMs = started.elapsed().into();

        let (success, output, error) = match outcome {
            Ok(output) => (true, output, None),
            Err(err) => (false, String::new(), Some(err.to_string())),
        };

        if success {
            ctx.recorder.push_conversation(ConversationEntry::new(Role::Assistant, output.clone(), turn_index));
        }

        let mut summary = TurnSummary {
            turn_index,
            label: turn.label.clone(),
            success,
            call_count: ctx.calls_in_current_turn(),
            duration,
            error,
            assertions_failed: false,
        };

        if success {
            tracing::info!(turn_index, duration_ms = duration.as_millis(), "turn completed");
        } else {
            tracing::warn!(turn_index, error = summary.error.as_deref(), "turn failed");
        }

        ctx.recorder.turn_completed(summary.clone(), output).await;
        summary.assertions_failed = self.run_turn_scoped_assertions(ctx).await;
        summary
    }

    /// Check every assertion against the run's partial state and record
    /// each outcome, same as the end-of-run check but run here so
    /// turn-scoped assertions (`turn_completes`, `turn_completes_within`,
    /// `turn_response_contains`) can react before the run finishes, and
    /// `fail_fast` can stop a run a turn-scoped check has already failed.
    async fn run_turn_scoped_assertions(&self, ctx: &Arc<ScenarioContext>) -> bool {
        if self.assertions.is_empty() {
            return false;
        }
        let assertion_ctx: &dyn AssertionContext = ctx.recorder.store().as_ref();
        let results = evaluate_all(&self.assertions, assertion_ctx).await;
        let any_failed = results.iter().any(|r| !r.passed);
        for result in &results {
            ctx.recorder.assertion_checked(result).await;
        }
        any_failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chaos_core::assertion::AssertionContext;
    use chaos_core::prelude::{ChaosRule, Mutator, StaticFault, Trigger};
    use chaos_core::test_utils::RecordingSink;
    use chaos_engine::{Injector, MetricsStore, Recorder};
    use chaos_provider::{MockBackend, ProviderHandle};

    use crate::error::AgentError;

    struct EchoAgent;

    #[async_trait]
    impl Agent for EchoAgent {
        async fn respond(&self, input: &str, _ctx: &ScenarioContext) -> Result<String, AgentError> {
            Ok(format!("you said: {input}"))
        }
    }

    struct FailingAgent;

    #[async_trait]
    impl Agent for FailingAgent {
        async fn respond(&self, _input: &str, _ctx: &ScenarioContext) -> Result<String, AgentError> {
            Err(AgentError::Failed("agent blew up".to_string()))
        }
    }

    struct HangingAgent;

    #[async_trait]
    impl Agent for HangingAgent {
        async fn respond(&self, _input: &str, _ctx: &ScenarioContext) -> Result<String, AgentError> {
            futures::future::pending().await
        }
    }

    async fn scenario_context(rules: Vec<ChaosRule>) -> Arc<ScenarioContext> {
        let store = Arc::new(MetricsStore::new());
        let sink = Arc::new(RecordingSink::new());
        let recorder = Arc::new(Recorder::new(chaos_core::prelude::TraceId::new("t1"), store, sink));
        let injector = Arc::new(Injector::new(rules, Some(1)));
        let provider = Arc::new(ProviderHandle::new(Arc::new(MockBackend::new("mock"))));
        Arc::new(ScenarioContext::new("s1", chaos_core::prelude::TraceId::new("t1"), injector, recorder, provider))
    }

    #[tokio::test]
    async fn runs_a_turn_with_no_faults() {
        let ctx = scenario_context(vec![]).await;
        let executor = TurnExecutor::new(None, vec![]);
        let turn = Turn::new("hello");
        let summary = executor.run_turn(&ctx, 0, &turn, &EchoAgent).await;
        assert!(summary.success);
        assert_eq!(ctx.recorder.store().turn_output(0).as_deref(), Some("you said: hello"));
    }

    #[tokio::test]
    async fn user_input_mutate_rewrites_the_turn_input_before_the_agent_sees_it() {
        let mutator = Mutator::new("uppercase", |s: &str| s.to_uppercase());
        let rule = ChaosRule::new(
            "uppercase-input",
            ChaosPoint::UserInput,
            Trigger::Always,
            Arc::new(StaticFault::new(FaultKind::UserInputMutate { mutator })),
        )
        .unwrap();
        let ctx = scenario_context(vec![rule]).await;
        let executor = TurnExecutor::new(None, vec![]);
        let turn = Turn::new("hello");
        let summary = executor.run_turn(&ctx, 0, &turn, &EchoAgent).await;
        assert!(summary.success);
        assert_eq!(ctx.recorder.store().turn_output(0).as_deref(), Some("you said: HELLO"));
        assert_eq!(ctx.recorder.store().fault_log().len(), 1);
    }

    #[tokio::test]
    async fn truncate_context_fault_removes_earlier_entries() {
        ctx_with_history_then_truncate().await;
    }

    async fn ctx_with_history_then_truncate() {
        let ctx = scenario_context(vec![]).await;
        ctx.recorder.push_conversation(ConversationEntry::new(Role::User, "first", 0));
        ctx.recorder.push_conversation(ConversationEntry::new(Role::Assistant, "first reply", 0));

        let rule = ChaosRule::new(
            "truncate-on-turn-1",
            ChaosPoint::Context,
            Trigger::OnTurn { turn: 1 },
            Arc::new(StaticFault::new(FaultKind::Truncate { keep_last: 0 })),
        )
        .unwrap();
        let ctx = Arc::new(ScenarioContext::new(
            ctx.name.clone(),
            ctx.trace_id.clone(),
            Arc::new(Injector::new(vec![rule], Some(1))),
            ctx.recorder.clone(),
            ctx.provider.clone(),
        ));

        let executor = TurnExecutor::new(None, vec![]);
        let turn = Turn::new("second");
        let summary = executor.run_turn(&ctx, 1, &turn, &EchoAgent).await;
        assert!(summary.success);
        // conversation had 2 entries, truncated to 0, then the new user
        // turn (and its reply) get pushed back on.
        assert_eq!(ctx.conversation().len(), 2);
        assert_eq!(ctx.recorder.store().fault_log().len(), 1);
    }

    #[tokio::test]
    async fn agent_failure_marks_the_turn_unsuccessful() {
        let ctx = scenario_context(vec![]).await;
        let executor = TurnExecutor::new(None, vec![]);
        let turn = Turn::new("hello");
        let summary = executor.run_turn(&ctx, 0, &turn, &FailingAgent).await;
        assert!(!summary.success);
        assert!(summary.error.unwrap().contains("agent blew up"));
    }

    #[tokio::test]
    async fn turn_timeout_cancels_a_hanging_agent() {
        let ctx = scenario_context(vec![]).await;
        let executor = TurnExecutor::new(Some(DurationMs::from_millis(20)), vec![]);
        let turn = Turn::new("hello");
        let summary = executor.run_turn(&ctx, 0, &turn, &HangingAgent).await;
        assert!(!summary.success);
        assert!(summary.error.unwrap().contains("timed out"));
    }
}
