use std::iter;
use std::thread;

use itertools::Itertools;
use tracing::debug;

use super::{Enumeration, EnumerationError, PlateEnumerator, SearchLimits};
use crate::models::{
    Dish, FeasibleSet, PlateCandidate, PlateItem, PlateTotals, ScoredPlate, ServingOption, Targets,
};
use crate::planner::constants::{MAX_PLATE_SIZE, MIN_PLATE_SIZE};
use crate::planner::scoring::{score, within_tolerance};

/// Exhaustive search over every combination of 2–4 dishes crossed with every
/// serving tuple.
///
/// The combination space is split by lowest dish index, round-robin across
/// `limits.workers` scoped threads. Each worker walks its share in canonical
/// plate order and keeps a local capped set; the partial sets are merged by
/// (score, plate key), so the outcome does not depend on thread timing.
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForceEnumerator;

impl PlateEnumerator for BruteForceEnumerator {
    fn name(&self) -> &'static str {
        "brute-force"
    }

    fn enumerate(
        &self,
        dishes: &[Dish],
        targets: &Targets,
        limits: &SearchLimits,
    ) -> Result<Enumeration, EnumerationError> {
        Ok(self.run(dishes, targets, limits))
    }
}

impl BruteForceEnumerator {
    /// Infallible form of [`PlateEnumerator::enumerate`].
    pub fn run(&self, dishes: &[Dish], targets: &Targets, limits: &SearchLimits) -> Enumeration {
        let workers = limits.workers.clamp(1, dishes.len().max(1));
        let keys: Vec<String> = dishes.iter().map(Dish::key).collect();

        let partials: Vec<Partial> = if workers == 1 {
            vec![search_partition(dishes, &keys, targets, limits, 0, 1)]
        } else {
            let keys = &keys;
            thread::scope(|scope| {
                let handles: Vec<_> = (0..workers)
                    .map(|worker| {
                        scope.spawn(move || {
                            search_partition(dishes, keys, targets, limits, worker, workers)
                        })
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                    .collect()
            })
        };

        let mut plates = FeasibleSet::new(limits.cap);
        let mut completed = true;
        let mut evaluated = 0u64;
        for partial in partials {
            completed &= partial.completed;
            evaluated += partial.evaluated;
            plates.merge(partial.plates);
        }

        debug!(
            workers,
            evaluated,
            feasible = plates.len(),
            completed,
            "brute-force enumeration finished"
        );

        Enumeration {
            plates,
            completed,
            strategy: self.name(),
        }
    }
}

struct Partial {
    plates: FeasibleSet,
    completed: bool,
    evaluated: u64,
}

fn search_partition(
    dishes: &[Dish],
    keys: &[String],
    targets: &Targets,
    limits: &SearchLimits,
    worker: usize,
    stride: usize,
) -> Partial {
    let n = dishes.len();
    let mut partial = Partial {
        plates: FeasibleSet::new(limits.cap),
        completed: true,
        evaluated: 0,
    };
    if limits.cap == 0 {
        return partial;
    }

    for size in MIN_PLATE_SIZE..=MAX_PLATE_SIZE.min(n) {
        for first in (worker..n).step_by(stride) {
            if first + size > n {
                break;
            }

            for rest in (first + 1..n).combinations(size - 1) {
                if limits.expired() {
                    partial.completed = false;
                    return partial;
                }

                let picked: Vec<usize> = iter::once(first).chain(rest).collect();
                if names_distinct(&picked, keys) {
                    evaluate_servings(dishes, &picked, targets, &mut partial);
                }

                // Plates are visited in ascending key order, so once the set is
                // full of exact hits nothing later can displace them.
                if partial.plates.is_full() && partial.plates.worst_score() == Some(0.0) {
                    return partial;
                }
            }
        }
    }

    partial
}

fn evaluate_servings(dishes: &[Dish], picked: &[usize], targets: &Targets, partial: &mut Partial) {
    // Lexicographic with the first dish's serving most significant, which is
    // plate-key order.
    for servings in iter::repeat_n(ServingOption::ALL, picked.len()).multi_cartesian_product() {
        let mut totals = PlateTotals::default();
        for (&d, &serving) in picked.iter().zip(&servings) {
            totals.add(&dishes[d], serving);
        }
        partial.evaluated += 1;

        if !within_tolerance(&totals, targets) {
            continue;
        }
        let s = score(&totals, targets);
        if !partial.plates.admits(s) {
            continue;
        }

        let items = picked
            .iter()
            .zip(servings)
            .map(|(&d, serving)| PlateItem::new(d, serving))
            .collect();
        partial.plates.insert(ScoredPlate {
            plate: PlateCandidate::new(items),
            totals,
            score: s,
        });
    }
}

fn names_distinct(picked: &[usize], keys: &[String]) -> bool {
    picked
        .iter()
        .enumerate()
        .all(|(i, &a)| picked[i + 1..].iter().all(|&b| keys[a] != keys[b]))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::models::Macros;

    fn scenario_dishes() -> Vec<Dish> {
        vec![
            Dish::new("A", "1 cup", Macros::new(200, 20, 0, 0)),
            Dish::new("B", "1 cup", Macros::new(300, 10, 0, 0)),
            Dish::new("C", "1 cup", Macros::new(100, 5, 0, 0)),
            Dish::new("D", "1 cup", Macros::new(250, 25, 0, 0)),
        ]
    }

    fn limits(workers: usize) -> SearchLimits {
        SearchLimits::new(Duration::from_secs(30), 30, workers)
    }

    #[test]
    fn test_plates_are_found_in_key_order() {
        let dishes = scenario_dishes();
        let limits = SearchLimits::new(Duration::from_secs(30), 3, 1);
        let result = BruteForceEnumerator.run(&dishes, &Targets::default(), &limits);

        let first_three: Vec<Vec<(usize, ServingOption)>> = result
            .plates
            .iter()
            .map(|p| p.plate.items().iter().map(|i| (i.dish, i.serving)).collect())
            .collect();
        assert_eq!(
            first_three,
            vec![
                vec![(0, ServingOption::Half), (1, ServingOption::Half)],
                vec![(0, ServingOption::Half), (1, ServingOption::One)],
                vec![(0, ServingOption::Half), (1, ServingOption::OneAndHalf)],
            ]
        );
    }

    #[test]
    fn test_scenario_exact_plate_scores_zero() {
        let dishes = scenario_dishes();
        let targets = Targets::new(500.0, 30.0, 0.0, 0.0);
        let result = BruteForceEnumerator.run(&dishes, &targets, &limits(1));

        assert!(result.completed);
        let exact = PlateCandidate::new(vec![
            PlateItem::new(0, ServingOption::One),
            PlateItem::new(1, ServingOption::One),
        ]);
        let hit = result
            .plates
            .iter()
            .find(|p| p.plate == exact)
            .expect("A×1 + B×1 should be feasible");
        assert_eq!(hit.score, 0.0);
        assert_eq!(hit.totals.calories, 500.0);
        assert_eq!(hit.totals.protein, 30.0);
        assert_eq!(result.plates.best().map(|p| p.score), Some(0.0));
    }

    #[test]
    fn test_zero_budget_times_out_empty() {
        let dishes = scenario_dishes();
        let targets = Targets::new(500.0, 30.0, 0.0, 0.0);
        let limits = SearchLimits::new(Duration::ZERO, 30, 2);
        let result = BruteForceEnumerator.run(&dishes, &targets, &limits);
        assert!(result.timed_out_empty());
    }

    #[test]
    fn test_worker_count_does_not_change_result() {
        let dishes: Vec<Dish> = (0..9)
            .map(|i| {
                Dish::new(
                    &format!("Dish {i}"),
                    "1 each",
                    Macros::new(90 + i * 37, 3 + i * 2, 10 + i, 2 + i % 3),
                )
            })
            .collect();
        let targets = Targets::new(600.0, 25.0, 0.0, 0.0);

        let single = BruteForceEnumerator.run(&dishes, &targets, &limits(1));
        let many = BruteForceEnumerator.run(&dishes, &targets, &limits(4));
        assert!(!single.plates.is_empty());
        assert_eq!(single.plates.as_slice(), many.plates.as_slice());
    }

    #[test]
    fn test_unconstrained_targets_stop_when_full() {
        let dishes: Vec<Dish> = (0..200)
            .map(|i| Dish::new(&format!("Item {i}"), "1", Macros::new(100, 5, 10, 2)))
            .collect();
        let result = BruteForceEnumerator.run(&dishes, &Targets::default(), &limits(4));

        assert!(result.completed);
        assert_eq!(result.plates.len(), 30);
        assert!(result.plates.iter().all(|p| p.score == 0.0));
        assert!(result.plates.iter().all(|p| p.plate.items()[0].dish == 0));
    }

    #[test]
    fn test_duplicate_names_never_share_a_plate() {
        let dishes = vec![
            Dish::new("Rice", "1 cup", Macros::new(250, 5, 0, 0)),
            Dish::new("rice", "2 cups", Macros::new(250, 5, 0, 0)),
            Dish::new("Beans", "1 cup", Macros::new(250, 15, 0, 0)),
        ];
        let targets = Targets::new(500.0, 0.0, 0.0, 0.0);
        let result = BruteForceEnumerator.run(&dishes, &targets, &limits(1));
        assert!(!result.plates.is_empty());
        assert!(result.plates.iter().all(|p| p.plate.is_well_formed(&dishes)));
    }

    #[test]
    fn test_fewer_than_two_dishes_is_empty_and_complete() {
        let dishes = vec![Dish::new("Solo", "1", Macros::new(500, 30, 0, 0))];
        let targets = Targets::new(500.0, 30.0, 0.0, 0.0);
        let result = BruteForceEnumerator.run(&dishes, &targets, &limits(2));
        assert!(result.completed);
        assert!(result.plates.is_empty());
    }
}
