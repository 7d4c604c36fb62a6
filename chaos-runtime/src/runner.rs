//! The scenario runner (spec §4.9) — the top-level orchestrator that
//! turns a declarative [`Scenario`] into a [`RunReport`], writing its
//! artifacts to disk along the way.
//!
//! Two modes: [`ScenarioRunner::run_single`] executes the scenario as declared;
//! [`ScenarioRunner::run_baseline_pair`] runs it twice — once with every
//! chaos rule stripped, once as declared — sharing the seed so the only
//! variance between the two is the chaos itself (spec §8 S6).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chaos_assert::evaluate_all;
use chaos_core::assertion::AssertionContext;
use chaos_core::prelude::{DurationMs, Role, Scenario, TraceId};
use chaos_core::report::RunReport;
use chaos_engine::{Injector, MetricsStore, Recorder};
use chaos_provider::{Backend, ProviderHandle};
use chaos_sinks::{FanOutSink, JsonlFileSink, MemorySink, NullSink};
use chrono::Utc;

use crate::config::HarnessConfig;
use crate::context::{Agent, ScenarioContext};
use crate::error::{RunnerError, ScenarioError};
use crate::executor::TurnExecutor;

/// Orchestrates a single scenario from declaration to artifact.
///
/// Stateless beyond its configuration — every run builds its own
/// injector, recorder, metrics store and provider handle, so a runner is
/// safely reused (or shared across a worker pool, per spec §5) across
/// many scenarios.
pub struct ScenarioRunner {
    config: HarnessConfig,
}

impl ScenarioRunner {
    /// Build a runner against the given configuration.
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    /// Run `scenario` once, as declared, and return its report.
    pub async fn run_single(
        &self,
        scenario: Scenario,
        agent: Arc<dyn Agent>,
        backend: Arc<dyn Backend>,
    ) -> Result<RunReport, RunnerError> {
        let report = self.execute(scenario, agent, backend).await?;
        Ok(report)
    }

    /// Run `scenario` as a baseline-vs-chaos pair (spec §4.9, §8 S6):
    /// first with every chaos rule removed, then as declared. Both
    /// halves share the scenario's seed and assertions so the only
    /// thing that can differ between them is the injected chaos.
    pub async fn run_baseline_pair(
        &self,
        scenario: Scenario,
        baseline_agent: Arc<dyn Agent>,
        baseline_backend: Arc<dyn Backend>,
        chaos_agent: Arc<dyn Agent>,
        chaos_backend: Arc<dyn Backend>,
    ) -> Result<(RunReport, RunReport), RunnerError> {
        let mut baseline_scenario = scenario.without_chaos();
        baseline_scenario.assertions = scenario.assertions.clone();

        let baseline = self.execute(baseline_scenario, baseline_agent, baseline_backend).await?;
        let chaos = self.execute(scenario, chaos_agent, chaos_backend).await?;
        Ok((baseline, chaos))
    }

    fn session_dir(&self, scenario_name: &str, session_id: &str) -> PathBuf {
        Path::new(&self.config.runs_dir).join(scenario_name).join(session_id)
    }

    async fn execute(
        &self,
        scenario: Scenario,
        agent: Arc<dyn Agent>,
        backend: Arc<dyn Backend>,
    ) -> Result<RunReport, RunnerError> {
        if scenario.turns.is_empty() {
            return Err(ScenarioError::NoTurns(scenario.name.clone()).into());
        }

        let trace_id = TraceId::generate();
        let store = Arc::new(MetricsStore::new());
        let memory_sink = Arc::new(MemorySink::new());
        let dir = self.session_dir(&scenario.name, trace_id.as_str());

        let sink: Arc<dyn chaos_core::sink::EventSink> = if self.config.dry_run {
            Arc::new(NullSink::new())
        } else {
            Arc::new(FanOutSink::new(vec![
                memory_sink.clone(),
                Arc::new(JsonlFileSink::new(dir.join("events.jsonl"))),
            ]))
        };

        let recorder = Arc::new(Recorder::new(trace_id.clone(), store.clone(), sink));
        let injector = Arc::new(Injector::new(scenario.chaos_rules.clone(), scenario.seed));
        let provider = Arc::new(ProviderHandle::new(backend));
        let ctx = Arc::new(ScenarioContext::new(
            scenario.name.clone(),
            trace_id.clone(),
            injector.clone(),
            recorder.clone(),
            provider.clone(),
        ));

        provider.install(injector.clone(), recorder.clone()).await;
        recorder.run_started(&scenario.name).await;
        tracing::info!(scenario = %scenario.name, trace_id = %trace_id, "scenario run started");

        let started_at = Utc::now();
        let started = Instant::now();
        let executor = TurnExecutor::new(scenario.turn_timeout, scenario.assertions.clone());

        let mut turns = Vec::with_capacity(scenario.turns.len());
        let mut run_error = None;
        for (index, turn) in scenario.turns.iter().enumerate() {
            let summary = executor.run_turn(&ctx, index, turn, agent.as_ref()).await;
            if !summary.success && run_error.is_none() {
                run_error = summary.error.clone();
            }
            let should_stop = (!summary.success || summary.assertions_failed) && self.config.fail_fast;
            turns.push(summary);
            if should_stop {
                break;
            }
        }

        // Teardown runs on every exit path, success or failure (spec
        // §4.5, §7 "teardown runs on every exit path").
        provider.uninstall().await;

        let assertion_ctx: &dyn AssertionContext = store.as_ref();
        let assertions = evaluate_all(&scenario.assertions, assertion_ctx).await;
        for result in &assertions {
            recorder.assertion_checked(result).await;
        }

        let passed = run_error.is_none() && assertions.iter().all(|a| a.passed);
        recorder.run_completed(passed).await;
        recorder.close().await;

        let duration: DurationMs = started.elapsed().into();
        let conversation = store.conversation();
        let final_input = conversation.entries().iter().rev().find(|e| e.role == Role::User).map(|e| e.content.clone());
        let final_output =
            conversation.entries().iter().rev().find(|e| e.role == Role::Assistant).map(|e| e.content.clone());

        let report = RunReport {
            trace_id: trace_id.clone(),
            scenario_name: scenario.name.clone(),
            started_at,
            ended_at: Utc::now(),
            duration,
            turns,
            call_stats: store.call_stats(),
            token_stats: store.token_stats(),
            stream_stats: store.stream_stats(),
            fault_log: store.fault_log(),
            assertions,
            final_input,
            final_output,
            error: run_error,
            passed,
        };

        tracing::info!(scenario = %scenario.name, trace_id = %trace_id, passed, "scenario run finished");

        if !self.config.dry_run {
            self.write_artifacts(&dir, &report).await?;
        }

        Ok(report)
    }

    async fn write_artifacts(&self, dir: &Path, report: &RunReport) -> Result<(), RunnerError> {
        tokio::fs::create_dir_all(dir).await.map_err(|source| RunnerError::ArtifactWrite {
            path: dir.display().to_string(),
            source,
        })?;

        let scorecard_path = dir.join("scorecard.json");
        let scorecard = serde_json::to_vec_pretty(&report.scorecard())?;
        tokio::fs::write(&scorecard_path, scorecard).await.map_err(|source| RunnerError::ArtifactWrite {
            path: scorecard_path.display().to_string(),
            source,
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chaos_assert::{AllTurnsComplete, MaxLLMCalls};
    use chaos_core::prelude::Turn;
    use chaos_provider::MockBackend;

    use crate::error::AgentError;

    struct EchoAgent;

    #[async_trait]
    impl Agent for EchoAgent {
        async fn respond(&self, input: &str, _ctx: &ScenarioContext) -> Result<String, AgentError> {
            Ok(format!("echo: {input}"))
        }
    }

    fn config(dir: &Path) -> HarnessConfig {
        HarnessConfig::new().with_runs_dir(dir.to_string_lossy().to_string())
    }

    #[tokio::test]
    async fn a_passing_scenario_writes_a_scorecard_and_reports_pass() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = ScenarioRunner::new(config(tmp.path()));
        let scenario = Scenario::new("s1")
            .with_turn(Turn::new("hello"))
            .with_assertion(Arc::new(MaxLLMCalls(10)))
            .with_assertion(Arc::new(AllTurnsComplete));

        let report = runner
            .run_single(scenario, Arc::new(EchoAgent), Arc::new(MockBackend::new("mock")))
            .await
            .unwrap();

        assert!(report.passed);
        assert_eq!(report.turns.len(), 1);
        assert_eq!(report.final_output.as_deref(), Some("echo: hello"));

        let entries: Vec<_> = std::fs::read_dir(tmp.path().join("s1")).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn a_scenario_with_no_turns_is_a_scenario_error() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = ScenarioRunner::new(config(tmp.path()));
        let scenario = Scenario::new("empty");
        let err = runner.run_single(scenario, Arc::new(EchoAgent), Arc::new(MockBackend::new("mock"))).await.unwrap_err();
        assert!(matches!(err, RunnerError::Scenario(ScenarioError::NoTurns(_))));
    }

    #[tokio::test]
    async fn dry_run_skips_artifact_writes() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = ScenarioRunner::new(config(tmp.path()).with_dry_run(true));
        let scenario = Scenario::new("s1").with_turn(Turn::new("hello"));
        runner.run_single(scenario, Arc::new(EchoAgent), Arc::new(MockBackend::new("mock"))).await.unwrap();
        assert!(!tmp.path().join("s1").exists());
    }

    #[tokio::test]
    async fn baseline_pair_shares_assertions_and_the_baseline_has_no_faults() {
        use chaos_core::prelude::{ChaosPoint, ChaosRule, FaultKind, Mutator, StaticFault, Trigger};

        let tmp = tempfile::tempdir().unwrap();
        let runner = ScenarioRunner::new(config(tmp.path()));
        let rule = ChaosRule::new(
            "uppercase-input",
            ChaosPoint::UserInput,
            Trigger::Always,
            Arc::new(StaticFault::new(FaultKind::UserInputMutate {
                mutator: Mutator::new("uppercase", |s: &str| s.to_uppercase()),
            })),
        )
        .unwrap();
        let scenario = Scenario::new("pair")
            .with_turn(Turn::new("hello"))
            .with_rule(rule)
            .with_assertion(Arc::new(AllTurnsComplete))
            .with_seed(7);

        let (baseline, chaos) = runner
            .run_baseline_pair(
                scenario,
                Arc::new(EchoAgent),
                Arc::new(MockBackend::new("mock")),
                Arc::new(EchoAgent),
                Arc::new(MockBackend::new("mock")),
            )
            .await
            .unwrap();

        assert!(baseline.fault_log.is_empty());
        assert_eq!(chaos.fault_log.len(), 1);
        assert_eq!(baseline.assertions.len(), chaos.assertions.len());
        assert_eq!(baseline.final_output.as_deref(), Some("echo: hello"));
    }
}
