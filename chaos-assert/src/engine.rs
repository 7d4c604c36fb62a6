//! The assertion engine (spec §4.8) — evaluates a scenario's assertions
//! against a run's accumulated state and produces the reportable outcomes.
//!
//! Deliberately a free function rather than a struct: there is no state
//! to own beyond the assertion list and context, both of which the
//! caller already has, so a struct wrapper would just be ceremony.

use std::sync::Arc;

use chaos_core::assertion::{Assertion, AssertionContext};
use chaos_core::report::AssertionResult;

/// Check every assertion against `ctx`, in order, and collect their
/// outcomes.
///
/// Assertions are independent of one another; a failure in one never
/// short-circuits the rest, so a run's report always reflects every
/// assertion's outcome, not just the first failure.
pub async fn evaluate_all(
    assertions: &[Arc<dyn Assertion>],
    ctx: &dyn AssertionContext,
) -> Vec<AssertionResult> {
    let mut results = Vec::with_capacity(assertions.len());
    for assertion in assertions {
        let outcome = assertion.check(ctx).await;
        if !outcome.passed {
            tracing::warn!(assertion = assertion.name(), message = ?outcome.message, "assertion failed");
        }
        results.push(AssertionResult::new(assertion.name(), outcome));
    }
    results
}
