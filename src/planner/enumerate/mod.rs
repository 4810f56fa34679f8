//! Feasible-plate search.
//!
//! Two interchangeable strategies implement [`PlateEnumerator`]: exhaustive
//! brute force and an iterative 0/1 ILP. [`AdaptiveEnumerator`] picks one by
//! candidate count. The solver only gets a share of the budget; brute force
//! takes the rest when the solver errors, overruns, or finds nothing.

mod brute_force;
#[cfg(feature = "ilp")]
mod ilp;

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{Dish, FeasibleSet, Targets};
use crate::planner::constants::{DEFAULT_ILP_THRESHOLD, ILP_BUDGET_SHARE};

pub use brute_force::BruteForceEnumerator;
#[cfg(feature = "ilp")]
pub use ilp::IlpEnumerator;

/// Bounds shared by every strategy for one request.
#[derive(Debug, Clone, Copy)]
pub struct SearchLimits {
    pub deadline: Instant,
    pub cap: usize,
    pub workers: usize,
}

impl SearchLimits {
    /// Limits starting now. An overflowing budget means "effectively unbounded".
    pub fn new(budget: Duration, cap: usize, workers: usize) -> Self {
        let now = Instant::now();
        let deadline = now
            .checked_add(budget)
            .unwrap_or_else(|| now + Duration::from_secs(60 * 60 * 24 * 365));
        Self {
            deadline,
            cap,
            workers: workers.max(1),
        }
    }

    #[inline]
    pub fn expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Time left before the deadline, zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Same bounds with the deadline pulled in to `fraction` of the time left.
    pub fn share(&self, fraction: f64) -> Self {
        Self {
            deadline: Instant::now() + self.remaining().mul_f64(fraction.clamp(0.0, 1.0)),
            ..*self
        }
    }
}

/// Result of one enumeration run.
#[derive(Debug, Clone)]
pub struct Enumeration {
    pub plates: FeasibleSet,
    /// False when the deadline cut the search short.
    pub completed: bool,
    pub strategy: &'static str,
}

impl Enumeration {
    /// Budget ran out before a single feasible plate was found.
    pub fn timed_out_empty(&self) -> bool {
        !self.completed && self.plates.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum EnumerationError {
    #[error("solver error: {0}")]
    Solver(String),
}

/// A plate search strategy.
pub trait PlateEnumerator: Send + Sync {
    fn name(&self) -> &'static str;

    fn enumerate(
        &self,
        dishes: &[Dish],
        targets: &Targets,
        limits: &SearchLimits,
    ) -> Result<Enumeration, EnumerationError>;
}

/// Chooses ILP above `ilp_threshold` candidates, brute force otherwise.
pub struct AdaptiveEnumerator {
    ilp_threshold: usize,
    brute_force: BruteForceEnumerator,
    #[cfg(feature = "ilp")]
    ilp: IlpEnumerator,
}

impl AdaptiveEnumerator {
    pub fn new(ilp_threshold: usize) -> Self {
        Self {
            ilp_threshold,
            brute_force: BruteForceEnumerator,
            #[cfg(feature = "ilp")]
            ilp: IlpEnumerator,
        }
    }

    /// Strategy that will be tried first for `candidates` dishes.
    #[cfg(feature = "ilp")]
    pub fn select(&self, candidates: usize) -> &dyn PlateEnumerator {
        if candidates > self.ilp_threshold {
            &self.ilp
        } else {
            &self.brute_force
        }
    }

    /// Strategy that will be tried first for `candidates` dishes.
    #[cfg(not(feature = "ilp"))]
    pub fn select(&self, candidates: usize) -> &dyn PlateEnumerator {
        let _ = (candidates, self.ilp_threshold);
        &self.brute_force
    }
}

impl PlateEnumerator for AdaptiveEnumerator {
    fn name(&self) -> &'static str {
        "adaptive"
    }

    fn enumerate(
        &self,
        dishes: &[Dish],
        targets: &Targets,
        limits: &SearchLimits,
    ) -> Result<Enumeration, EnumerationError> {
        // With no active target every plate scores 0 and brute force stops as
        // soon as the set is full.
        let primary = if targets.is_unconstrained() {
            &self.brute_force as &dyn PlateEnumerator
        } else {
            self.select(dishes.len())
        };
        debug!(strategy = primary.name(), candidates = dishes.len(), "enumerating plates");

        if primary.name() == self.brute_force.name() {
            return self.brute_force.enumerate(dishes, targets, limits);
        }

        match primary.enumerate(dishes, targets, &limits.share(ILP_BUDGET_SHARE)) {
            Ok(found) if !found.plates.is_empty() => Ok(found),
            Ok(found) => {
                debug!(
                    strategy = primary.name(),
                    completed = found.completed,
                    "no plate from solver, falling back to brute force"
                );
                self.brute_force.enumerate(dishes, targets, limits)
            }
            Err(e) => {
                warn!(strategy = primary.name(), error = %e, "solver failed, falling back to brute force");
                self.brute_force.enumerate(dishes, targets, limits)
            }
        }
    }
}

impl Default for AdaptiveEnumerator {
    fn default() -> Self {
        Self::new(DEFAULT_ILP_THRESHOLD)
    }
}

/// Worker count bounded by the machine.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
