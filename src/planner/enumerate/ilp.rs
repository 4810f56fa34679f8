use std::collections::BTreeMap;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use microlp::{ComparisonOp, OptimizationDirection, Problem, Variable};
use tracing::{debug, trace, warn};

use super::{Enumeration, EnumerationError, PlateEnumerator, SearchLimits};
use crate::models::{
    Dish, FeasibleSet, Macro, PlateCandidate, PlateItem, ScoredPlate, ServingOption, Targets,
};
use crate::planner::constants::{ILP_EXTRA_ROUNDS, MAX_PLATE_SIZE, MIN_PLATE_SIZE, TOLERANCE};
use crate::planner::scoring::{score, within_tolerance};

/// 0/1 integer program over (dish, serving) pairs.
///
/// Each solve yields the single plate minimizing the weighted absolute
/// deviation from the targets. Alternatives are produced by iterative
/// re-optimization: the previous assignment is cut off with an exact
/// exclusion constraint and the model is solved again until the feasible set
/// is full or the model turns infeasible. Every solve runs on a helper thread
/// and is awaited only until the deadline; on overrun the plates found so far
/// are returned as an incomplete result.
#[derive(Debug, Clone, Copy, Default)]
pub struct IlpEnumerator;

impl PlateEnumerator for IlpEnumerator {
    fn name(&self) -> &'static str {
        "ilp"
    }

    fn enumerate(
        &self,
        dishes: &[Dish],
        targets: &Targets,
        limits: &SearchLimits,
    ) -> Result<Enumeration, EnumerationError> {
        let mut plates = FeasibleSet::new(limits.cap);
        let mut excluded: Vec<Vec<usize>> = Vec::new();
        let mut completed = true;
        let max_rounds = limits.cap + ILP_EXTRA_ROUNDS;

        if dishes.len() < MIN_PLATE_SIZE || limits.cap == 0 {
            return Ok(Enumeration {
                plates,
                completed,
                strategy: self.name(),
            });
        }

        for round in 0..max_rounds {
            if plates.is_full() {
                break;
            }
            if limits.expired() {
                completed = false;
                break;
            }

            let PlateModel { problem, picks } = PlateModel::build(dishes, targets, &excluded);
            let vars = picks.iter().map(|p| p.var).collect();
            let selected = match solve_within(problem, vars, limits.remaining()) {
                Solve::Picked(selected) => selected,
                Solve::Infeasible => {
                    trace!(round, "ilp model exhausted");
                    break;
                }
                Solve::TimedOut => {
                    debug!(round, "ilp solve overran the deadline, abandoned");
                    completed = false;
                    break;
                }
                Solve::Failed(e) if plates.is_empty() => return Err(EnumerationError::Solver(e)),
                Solve::Failed(e) => {
                    debug!(round, error = %e, "ilp stopped early, keeping plates found so far");
                    break;
                }
            };
            if selected.is_empty() {
                break;
            }

            let plate = PlateCandidate::new(
                selected
                    .iter()
                    .map(|&i| PlateItem::new(picks[i].dish, picks[i].serving))
                    .collect(),
            );
            excluded.push(selected);

            // The solver works in floating point; re-check in exact terms.
            let totals = plate.totals(dishes);
            if plate.is_well_formed(dishes) && within_tolerance(&totals, targets) {
                let s = score(&totals, targets);
                plates.insert(ScoredPlate {
                    plate,
                    totals,
                    score: s,
                });
            } else {
                trace!(round, "ilp solution failed re-check, excluded");
            }
        }

        debug!(
            rounds = excluded.len(),
            feasible = plates.len(),
            completed,
            "ilp enumeration finished"
        );

        Ok(Enumeration {
            plates,
            completed,
            strategy: self.name(),
        })
    }
}

enum Solve {
    /// Indices of the picks set to 1.
    Picked(Vec<usize>),
    Infeasible,
    TimedOut,
    Failed(String),
}

/// Solves `problem` on a helper thread, waiting at most `remaining`.
///
/// A solve that overruns cannot be interrupted; its thread runs to completion
/// and the result is dropped.
fn solve_within(problem: Problem, vars: Vec<Variable>, remaining: Duration) -> Solve {
    let (tx, rx) = mpsc::channel();
    let spawned = thread::Builder::new()
        .name("ilp-solve".to_string())
        .spawn(move || {
            let outcome = match problem.solve() {
                Ok(solution) => Solve::Picked(
                    vars.iter()
                        .enumerate()
                        .filter(|(_, var)| solution.var_value_rounded(**var) > 0.5)
                        .map(|(i, _)| i)
                        .collect(),
                ),
                Err(microlp::Error::Infeasible) => Solve::Infeasible,
                Err(e) => Solve::Failed(e.to_string()),
            };
            // The receiver is gone once the deadline passed.
            let _ = tx.send(outcome);
        });
    if let Err(e) = spawned {
        warn!(error = %e, "could not start ilp solver thread");
        return Solve::Failed(e.to_string());
    }

    match rx.recv_timeout(remaining) {
        Ok(outcome) => outcome,
        Err(RecvTimeoutError::Timeout) => Solve::TimedOut,
        Err(RecvTimeoutError::Disconnected) => Solve::Failed("solver thread panicked".to_string()),
    }
}

struct Pick {
    dish: usize,
    serving: ServingOption,
    var: Variable,
}

struct PlateModel {
    problem: Problem,
    picks: Vec<Pick>,
}

impl PlateModel {
    fn build(dishes: &[Dish], targets: &Targets, excluded: &[Vec<usize>]) -> Self {
        let mut problem = Problem::new(OptimizationDirection::Minimize);

        let mut picks = Vec::with_capacity(dishes.len() * ServingOption::ALL.len());
        for (dish, _) in dishes.iter().enumerate() {
            for serving in ServingOption::ALL {
                let var = problem.add_binary_var(0.0);
                picks.push(Pick { dish, serving, var });
            }
        }

        // At most one serving per dish name (covers "at most one per dish").
        let mut by_name: BTreeMap<String, Vec<Variable>> = BTreeMap::new();
        for pick in &picks {
            by_name
                .entry(dishes[pick.dish].key())
                .or_default()
                .push(pick.var);
        }
        for vars in by_name.values() {
            problem.add_constraint(
                vars.iter().map(|&v| (v, 1.0)).collect::<Vec<_>>(),
                ComparisonOp::Le,
                1.0,
            );
        }

        let all: Vec<(Variable, f64)> = picks.iter().map(|p| (p.var, 1.0)).collect();
        problem.add_constraint(all.clone(), ComparisonOp::Ge, MIN_PLATE_SIZE as f64);
        problem.add_constraint(all, ComparisonOp::Le, MAX_PLATE_SIZE as f64);

        for (m, target) in targets.active_macros() {
            add_macro_terms(&mut problem, dishes, &picks, m, target);
        }

        for selection in excluded {
            // Σ chosen − Σ others ≤ |chosen| − 1 removes exactly this assignment.
            let mut expr = Vec::with_capacity(picks.len());
            for (i, pick) in picks.iter().enumerate() {
                let coeff = if selection.contains(&i) { 1.0 } else { -1.0 };
                expr.push((pick.var, coeff));
            }
            problem.add_constraint(expr, ComparisonOp::Le, selection.len() as f64 - 1.0);
        }

        Self { problem, picks }
    }
}

/// Total, deviation and tolerance rows for one active macro.
fn add_macro_terms(problem: &mut Problem, dishes: &[Dish], picks: &[Pick], m: Macro, target: f64) {
    let total = problem.add_var(0.0, (f64::NEG_INFINITY, f64::INFINITY));
    let error = problem.add_var(1.0, (0.0, f64::INFINITY));

    // total − Σ amount·x = 0
    let mut tie = vec![(total, 1.0)];
    for pick in picks {
        let amount = dishes[pick.dish].macros.get(m) as f64 * pick.serving.multiplier();
        if amount != 0.0 {
            tie.push((pick.var, -amount));
        }
    }
    problem.add_constraint(tie, ComparisonOp::Eq, 0.0);

    // error ≥ total − target, error ≥ target − total
    problem.add_constraint(&[(error, 1.0), (total, -1.0)], ComparisonOp::Ge, -target);
    problem.add_constraint(&[(error, 1.0), (total, 1.0)], ComparisonOp::Ge, target);

    let band = target * TOLERANCE;
    problem.add_constraint(&[(total, 1.0)], ComparisonOp::Ge, target - band);
    problem.add_constraint(&[(total, 1.0)], ComparisonOp::Le, target + band);
}
