#![deny(missing_docs)]
//! Scenario execution runtime for the agent-chaos harness (spec §4.7,
//! §4.9).
//!
//! This is the crate that actually runs a [`chaos_core::scenario::Scenario`]
//! against an [`Agent`] under test: it owns the per-run
//! [`ScenarioContext`], drives turns through the [`TurnExecutor`], and
//! hands the result to the [`ScenarioRunner`] for assertion evaluation
//! and artifact serialization.
//!
//! | Module | Responsibility |
//! |---|---|
//! | [`context`] | Per-run shared state (`ScenarioContext`, `Agent` trait) |
//! | [`executor`] | Per-turn drive loop (spec §4.7) |
//! | [`runner`] | Top-level orchestration, baseline pairing, artifacts (spec §4.9) |
//! | [`config`] | Harness-wide configuration (spec §6 environment) |
//! | [`error`] | Agent/turn/scenario/runner error taxonomy (spec §7) |

pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod runner;

pub use config::HarnessConfig;
pub use context::{Agent, CallSequencer, ScenarioContext};
pub use error::{AgentError, RunnerError, ScenarioError, TurnError};
pub use executor::TurnExecutor;
pub use runner::ScenarioRunner;
