//! Chaos rules (spec §3 `ChaosRule`) — a trigger paired with a factory
//! that produces the fault to inject once the trigger fires.

use std::fmt;
use std::sync::Arc;

use crate::fault::FaultKind;
use crate::point::ChaosPoint;
use crate::trigger::{Trigger, TriggerContext};

/// Produces a [`FaultKind`] on demand.
///
/// Kept separate from [`Trigger`] so the same rule can vary what it
/// injects across firings (e.g. picking a random corruption kind) while
/// the trigger stays a pure yes/no decision. Implementations must always
/// report the same [`ChaosPoint`] from [`FaultFactory::point`] — a rule
/// binds to exactly one point for its lifetime.
pub trait FaultFactory: Send + Sync + fmt::Debug {
    /// The interception point every fault this factory produces belongs to.
    fn point(&self) -> ChaosPoint;

    /// Produce the next fault to inject.
    fn produce(&self) -> FaultKind;
}

/// A factory that always produces the same fault.
#[derive(Debug, Clone)]
pub struct StaticFault(FaultKind);

impl StaticFault {
    /// Wrap a fixed fault as a factory.
    pub fn new(fault: FaultKind) -> Self {
        Self(fault)
    }
}

impl FaultFactory for StaticFault {
    fn point(&self) -> ChaosPoint {
        self.0.point()
    }

    fn produce(&self) -> FaultKind {
        self.0.clone()
    }
}

/// Error produced constructing or validating a [`ChaosRule`].
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum RuleError {
    /// The rule's factory produces faults for a different point than the
    /// rule is declared at (spec §7 `ScenarioError::PointMismatch`).
    #[error("rule {name:?} declared at point {declared:?} but its factory produces faults for {actual:?}")]
    PointMismatch {
        /// The rule's name.
        name: String,
        /// The point the rule was declared at.
        declared: ChaosPoint,
        /// The point the factory actually produces faults for.
        actual: ChaosPoint,
    },
}

/// A named binding of trigger to fault factory at one interception point.
///
/// Rules are evaluated in declaration order by the injector; the first
/// whose trigger fires wins (spec §4.3, first-declared-wins tie-break).
#[derive(Clone)]
pub struct ChaosRule {
    /// A human-readable name, used in event logs and fingerprints.
    pub name: String,
    /// The interception point this rule binds to.
    pub point: ChaosPoint,
    /// The condition deciding whether this rule fires.
    pub trigger: Trigger,
    /// The fault factory consulted once the trigger fires.
    pub factory: Arc<dyn FaultFactory>,
    /// Maximum number of times this rule may fire across a run, if bounded.
    pub max_fires: Option<usize>,
}

impl fmt::Debug for ChaosRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChaosRule")
            .field("name", &self.name)
            .field("point", &self.point)
            .field("trigger", &self.trigger)
            .field("max_fires", &self.max_fires)
            .finish()
    }
}

impl ChaosRule {
    /// Construct a rule, validating that its factory agrees on the point.
    pub fn new(
        name: impl Into<String>,
        point: ChaosPoint,
        trigger: Trigger,
        factory: Arc<dyn FaultFactory>,
    ) -> Result<Self, RuleError> {
        let name = name.into();
        let actual = factory.point();
        if actual != point {
            return Err(RuleError::PointMismatch { name, declared: point, actual });
        }
        Ok(Self { name, point, trigger, factory, max_fires: None })
    }

    /// Bound how many times this rule may fire across a run.
    pub fn with_max_fires(mut self, max_fires: usize) -> Self {
        self.max_fires = Some(max_fires);
        self
    }

    /// Whether this rule's trigger fires for the given context.
    pub fn matches(&self, ctx: &TriggerContext<'_>, draw: &mut impl FnMut() -> f64) -> bool {
        self.trigger.evaluate(ctx, draw)
    }

    /// A stable fingerprint identifying this rule, for correlating its
    /// firings in the event log and run report.
    pub fn fingerprint(&self) -> String {
        format!("{}@{:?}", self.name, self.point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_point_mismatch() {
        let factory = Arc::new(StaticFault::new(FaultKind::RateLimit));
        let err = ChaosRule::new("bad", ChaosPoint::Tool, Trigger::Always, factory).unwrap_err();
        assert_eq!(
            err,
            RuleError::PointMismatch {
                name: "bad".to_string(),
                declared: ChaosPoint::Tool,
                actual: ChaosPoint::Llm,
            }
        );
    }

    #[test]
    fn new_accepts_matching_point() {
        let factory = Arc::new(StaticFault::new(FaultKind::RateLimit));
        let rule = ChaosRule::new("rate-limit-turn-0", ChaosPoint::Llm, Trigger::Always, factory).unwrap();
        assert_eq!(rule.point, ChaosPoint::Llm);
    }

    #[test]
    fn fingerprint_is_stable_for_the_same_rule() {
        let factory = Arc::new(StaticFault::new(FaultKind::RateLimit));
        let rule = ChaosRule::new("r1", ChaosPoint::Llm, Trigger::Always, factory).unwrap();
        assert_eq!(rule.fingerprint(), rule.fingerprint());
        assert_eq!(rule.fingerprint(), "r1@Llm");
    }
}
