#![deny(missing_docs)]
//! # agent-chaos — umbrella crate
//!
//! A single import surface over the harness's six crates: declare a
//! [`prelude::Scenario`] of turns, chaos rules, and assertions; hand it
//! to a [`prelude::ScenarioRunner`] along with your agent and a provider
//! backend; get back a [`prelude::RunReport`].
//!
//! ```no_run
//! use agent_chaos::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example(agent: Arc<dyn Agent>, backend: Arc<dyn Backend>) -> Result<(), RunnerError> {
//! let scenario = Scenario::new("weather-rate-limit")
//!     .with_turn(Turn::new("What's the weather in Boston?"))
//!     .with_rule(
//!         ChaosRule::new(
//!             "rate-limit-first-call",
//!             ChaosPoint::Llm,
//!             Trigger::OnCall { call: 0 },
//!             Arc::new(StaticFault::new(FaultKind::RateLimit)),
//!         )
//!         .unwrap(),
//!     )
//!     .with_assertion(Arc::new(MaxLLMCalls(3)));
//!
//! let runner = ScenarioRunner::new(HarnessConfig::default());
//! let report = runner.run_single(scenario, agent, backend).await?;
//! assert!(report.passed);
//! # Ok(())
//! # }
//! ```
//!
//! Each re-exported crate can also be depended on directly if you only
//! need one layer (e.g. a dashboard bridge that only needs
//! [`chaos_core`]'s event and report types).

pub use chaos_assert;
pub use chaos_core;
pub use chaos_engine;
pub use chaos_provider;
pub use chaos_runtime;
pub use chaos_sinks;

/// Everything most callers need to declare and run a scenario.
pub mod prelude {
    pub use chaos_core::prelude::*;

    pub use chaos_assert::{
        evaluate_all, AllTurnsComplete, CompletesWithin, MaxLLMCalls, MaxTokens, MinLLMCalls,
        TurnCompletes, TurnCompletesWithin, TurnResponseContains,
    };

    pub use chaos_engine::{Injection, Injector, MetricsStore, Recorder};

    pub use chaos_provider::{
        AdapterError, Backend, CallContext, ChunkStream, CompletionRequest, CompletionResponse,
        ContentBlock, MockBackend, ProviderAdapter, ProviderError, ProviderHandle, ToolOutcome,
        ToolSpec,
    };

    pub use chaos_sinks::{FanOutSink, JsonlFileSink, MemorySink, NullSink};

    pub use chaos_runtime::{
        Agent, AgentError, HarnessConfig, ScenarioContext, ScenarioError, ScenarioRunner,
        TurnError, TurnExecutor,
    };
}
