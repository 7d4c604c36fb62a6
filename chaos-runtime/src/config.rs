//! Harness-wide configuration (spec §6 environment, §4.9 runner knobs).
//!
//! Mirrors the teacher's fluent provider-client builders
//! (`OpenAi::new(..).base_url(..)`): sensible defaults, overridable one
//! field at a time, plus a single `from_env` constructor for the knobs
//! spec §6 names as external (the runs directory path; everything else —
//! `--workers`, `--seed`, `--fail-fast`, `--dry-run` — is the CLI's own
//! argument parsing, out of scope per spec §1).

use std::env;

const DEFAULT_RUNS_DIR: &str = ".agent_chaos_runs";
const RUNS_DIR_ENV_VAR: &str = "AGENT_CHAOS_RUNS_DIR";
const DEFAULT_WORKERS: usize = 4;

/// Harness-wide execution configuration.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Directory artifacts (`scorecard.json`, `events.jsonl`) are written
    /// under, one subdirectory per run.
    pub runs_dir: String,
    /// Maximum number of scenarios the runner executes concurrently.
    pub workers: usize,
    /// Stop launching further scenarios once one fails.
    pub fail_fast: bool,
    /// Build the scenario context and validate the scenario without
    /// actually invoking the agent or writing artifacts.
    pub dry_run: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            runs_dir: DEFAULT_RUNS_DIR.to_string(),
            workers: DEFAULT_WORKERS,
            fail_fast: false,
            dry_run: false,
        }
    }
}

impl HarnessConfig {
    /// Build the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from the environment, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(dir) = env::var(RUNS_DIR_ENV_VAR) {
            config.runs_dir = dir;
        }
        config
    }

    /// Override the runs directory.
    pub fn with_runs_dir(mut self, runs_dir: impl Into<String>) -> Self {
        self.runs_dir = runs_dir.into();
        self
    }

    /// Override the worker pool size.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Enable or disable fail-fast.
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Enable or disable dry-run.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_runs_dir() {
        let config = HarnessConfig::default();
        assert_eq!(config.runs_dir, ".agent_chaos_runs");
        assert!(!config.fail_fast);
        assert!(!config.dry_run);
    }

    #[test]
    fn builder_overrides_apply() {
        let config = HarnessConfig::new().with_runs_dir("/tmp/runs").with_workers(8).with_fail_fast(true);
        assert_eq!(config.runs_dir, "/tmp/runs");
        assert_eq!(config.workers, 8);
        assert!(config.fail_fast);
    }

    #[test]
    fn from_env_reads_the_runs_dir_override() {
        env::set_var("AGENT_CHAOS_RUNS_DIR", "/tmp/custom-runs");
        let config = HarnessConfig::from_env();
        assert_eq!(config.runs_dir, "/tmp/custom-runs");
        env::remove_var("AGENT_CHAOS_RUNS_DIR");
    }
}
