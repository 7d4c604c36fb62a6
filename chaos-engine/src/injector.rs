//! The injector (spec §4.3) — consults a scenario's chaos rules at each
//! interception point and decides what, if anything, to inject.

use std::collections::HashMap;
use std::sync::Mutex;

use chaos_core::prelude::{ChaosPoint, ChaosRule, FaultKind, Trigger, TriggerContext};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// One fault the injector decided to inject, alongside the rule that
/// produced it.
#[derive(Debug, Clone)]
pub struct Injection {
    /// The fault to apply.
    pub fault: FaultKind,
    /// The firing rule's fingerprint, for the fault record.
    pub rule_fingerprint: String,
}

/// Evaluates a scenario's chaos rules against each interception point it
/// is consulted at.
///
/// Rules are consulted in declaration order; the first whose trigger
/// fires and whose fire budget isn't exhausted wins (spec §4.3,
/// first-declared-wins tie-break). Only one rule may fire per
/// consultation — once a rule wins, the rest are skipped for that call.
pub struct Injector {
    rules: Vec<ChaosRule>,
    fire_counts: Mutex<HashMap<String, usize>>,
    rng: Mutex<StdRng>,
}

impl Injector {
    /// Build an injector from a scenario's rules and an optional seed.
    /// Without a seed, probability-triggered rules are still evaluated
    /// deterministically *within* a process (seeded from entropy once),
    /// but won't reproduce across runs.
    pub fn new(rules: Vec<ChaosRule>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rules,
            fire_counts: Mutex::new(HashMap::new()),
            rng: Mutex::new(rng),
        }
    }

    /// Consult every rule bound to `point`, in declaration order, and
    /// return the first injection that fires.
    pub fn consult(&self, point: ChaosPoint, ctx: &TriggerContext<'_>) -> Option<Injection> {
        let mut rng = self.rng.lock().expect("Injector RNG mutex poisoned");
        let mut draw = || rng.gen::<f64>();

        for rule in self.rules.iter().filter(|r| r.point == point) {
            if let Some(max) = rule.max_fires {
                let fired = *self
                    .fire_counts
                    .lock()
                    .expect("Injector fire-count mutex poisoned")
                    .get(&rule.fingerprint())
                    .unwrap_or(&0);
                if fired >= max {
                    continue;
                }
            }

            if rule.matches(ctx, &mut draw) {
                let fingerprint = rule.fingerprint();
                *self
                    .fire_counts
                    .lock()
                    .expect("Injector fire-count mutex poisoned")
                    .entry(fingerprint.clone())
                    .or_insert(0) += 1;
                return Some(Injection {
                    fault: rule.factory.produce(),
                    rule_fingerprint: fingerprint,
                });
            }
        }
        None
    }

    /// Whether any rule is bound to the given point (a cheap way to skip
    /// consultation entirely when a scenario carries no rules there).
    pub fn has_rules_at(&self, point: ChaosPoint) -> bool {
        self.rules.iter().any(|r| r.point == point)
    }
}
