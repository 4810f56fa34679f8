use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use plate_planner_rs::models::{Dish, Macros, ScoredPlate, Targets};
use plate_planner_rs::planner::{
    score, within_tolerance, AdaptiveEnumerator, BruteForceEnumerator, PlateEnumerator,
    SearchLimits, MAX_PLATE_SIZE, MIN_PLATE_SIZE,
};

fn random_menu(rng: &mut StdRng, n: usize) -> Vec<Dish> {
    (0..n)
        .map(|i| {
            Dish::new(
                &format!("Dish {i}"),
                "1 serving",
                Macros::new(
                    rng.gen_range(20..600),
                    rng.gen_range(0..45),
                    rng.gen_range(0..80),
                    rng.gen_range(0..30),
                ),
            )
        })
        .collect()
}

fn random_targets(rng: &mut StdRng) -> Targets {
    let protein = if rng.gen_bool(0.5) { rng.gen_range(15.0..60.0) } else { 0.0 };
    let carbs = if rng.gen_bool(0.3) { rng.gen_range(30.0..120.0) } else { 0.0 };
    Targets::new(rng.gen_range(300.0..1100.0), protein, carbs, 0.0)
}

fn limits(cap: usize, workers: usize) -> SearchLimits {
    SearchLimits::new(Duration::from_secs(30), cap, workers)
}

fn assert_invariants(plates: &[ScoredPlate], dishes: &[Dish], targets: &Targets, cap: usize) {
    assert!(plates.len() <= cap);
    for p in plates {
        let items = p.plate.items();
        assert!((MIN_PLATE_SIZE..=MAX_PLATE_SIZE).contains(&items.len()));
        assert!(p.plate.is_well_formed(dishes));
        assert!(within_tolerance(&p.totals, targets));
        assert_eq!(p.totals, p.plate.totals(dishes));
        assert_eq!(p.score, score(&p.totals, targets));
        for item in items {
            let m = item.serving.multiplier();
            assert!([0.5, 1.0, 1.5, 2.0].contains(&m));
        }
    }
    for pair in plates.windows(2) {
        assert!(pair[0].rank_cmp(&pair[1]).is_lt());
    }
}

#[test]
fn test_random_menus_satisfy_plate_invariants() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..25 {
        let n = rng.gen_range(2..11);
        let dishes = random_menu(&mut rng, n);
        let targets = random_targets(&mut rng);

        let result = BruteForceEnumerator
            .enumerate(&dishes, &targets, &limits(30, 3))
            .unwrap();
        assert!(result.completed);
        assert_invariants(result.plates.as_slice(), &dishes, &targets, 30);
    }
}

#[test]
fn test_results_are_deterministic_across_runs_and_workers() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..10 {
        let dishes = random_menu(&mut rng, 12);
        let targets = random_targets(&mut rng);

        let a = BruteForceEnumerator.enumerate(&dishes, &targets, &limits(30, 1)).unwrap();
        let b = BruteForceEnumerator.enumerate(&dishes, &targets, &limits(30, 1)).unwrap();
        let c = BruteForceEnumerator.enumerate(&dishes, &targets, &limits(30, 5)).unwrap();
        assert_eq!(a.plates.as_slice(), b.plates.as_slice());
        assert_eq!(a.plates.as_slice(), c.plates.as_slice());
    }
}

#[test]
fn test_adaptive_finds_a_plate_whenever_brute_force_does() {
    let mut rng = StdRng::seed_from_u64(7);
    // Threshold 0 sends every request to the solver first.
    let adaptive = AdaptiveEnumerator::new(0);
    for _ in 0..10 {
        let n = rng.gen_range(3..8);
        let dishes = random_menu(&mut rng, n);
        let targets = random_targets(&mut rng);

        let exhaustive = BruteForceEnumerator.enumerate(&dishes, &targets, &limits(5, 2)).unwrap();
        let adaptive_result = adaptive.enumerate(&dishes, &targets, &limits(5, 2)).unwrap();

        assert_eq!(exhaustive.plates.is_empty(), adaptive_result.plates.is_empty());
        assert_invariants(adaptive_result.plates.as_slice(), &dishes, &targets, 5);
    }
}

#[cfg(feature = "ilp")]
#[test]
fn test_ilp_plates_are_feasible() {
    use plate_planner_rs::planner::IlpEnumerator;

    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..8 {
        let n = rng.gen_range(3..9);
        let dishes = random_menu(&mut rng, n);
        let targets = random_targets(&mut rng);
        if let Ok(result) = IlpEnumerator.enumerate(&dishes, &targets, &limits(5, 1)) {
            assert_invariants(result.plates.as_slice(), &dishes, &targets, 5);
        }
    }
}

#[test]
fn test_unconstrained_targets_respect_cap() {
    let mut rng = StdRng::seed_from_u64(3);
    let dishes = random_menu(&mut rng, 60);
    let start = Instant::now();
    let result = BruteForceEnumerator
        .enumerate(&dishes, &Targets::default(), &limits(30, 4))
        .unwrap();

    assert!(result.completed);
    assert_eq!(result.plates.len(), 30);
    assert!(result.plates.iter().all(|p| p.score == 0.0));
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[test]
fn test_budget_bounds_large_searches() {
    let mut rng = StdRng::seed_from_u64(11);
    let dishes = random_menu(&mut rng, 300);
    let targets = Targets::new(733.0, 41.0, 0.0, 0.0);
    let limits = SearchLimits::new(Duration::from_millis(50), 30, 2);

    let start = Instant::now();
    let result = BruteForceEnumerator.enumerate(&dishes, &targets, &limits).unwrap();
    assert!(!result.completed);
    assert!(start.elapsed() < Duration::from_secs(3));
    assert_invariants(result.plates.as_slice(), &dishes, &targets, 30);
}

/// Above the ILP threshold with every macro active, the solver alone can run
/// for seconds; the request must still end near its budget.
#[test]
fn test_adaptive_large_menu_respects_budget() {
    let mut rng = StdRng::seed_from_u64(60);
    let dishes = random_menu(&mut rng, 60);
    let targets = Targets::new(733.0, 41.0, 77.0, 23.0);
    let limits = SearchLimits::new(Duration::from_millis(200), 30, 2);

    let start = Instant::now();
    let result = AdaptiveEnumerator::default().enumerate(&dishes, &targets, &limits).unwrap();
    let elapsed = start.elapsed();

    assert!(elapsed < Duration::from_secs(2), "took {elapsed:?}");
    assert!(!result.completed);
    assert_invariants(result.plates.as_slice(), &dishes, &targets, 30);
}

#[test]
fn test_adaptive_large_menu_without_targets_fills_cap() {
    let mut rng = StdRng::seed_from_u64(61);
    let dishes = random_menu(&mut rng, 75);
    let limits = SearchLimits::new(Duration::from_secs(5), 30, 2);

    let start = Instant::now();
    let result = AdaptiveEnumerator::default()
        .enumerate(&dishes, &Targets::default(), &limits)
        .unwrap();

    assert!(start.elapsed() < Duration::from_secs(2));
    assert!(result.completed);
    assert_eq!(result.plates.len(), 30);
    assert!(result.plates.iter().all(|p| p.score == 0.0));
}

#[cfg(feature = "ilp")]
#[test]
fn test_ilp_solve_stops_at_deadline() {
    use plate_planner_rs::planner::IlpEnumerator;

    let mut rng = StdRng::seed_from_u64(150);
    let dishes = random_menu(&mut rng, 150);
    let targets = Targets::new(733.0, 41.0, 77.0, 23.0);
    let limits = SearchLimits::new(Duration::from_millis(150), 30, 1);

    let start = Instant::now();
    let result = IlpEnumerator.enumerate(&dishes, &targets, &limits);
    let elapsed = start.elapsed();

    assert!(elapsed < Duration::from_secs(2), "took {elapsed:?}");
    if let Ok(result) = result {
        assert_invariants(result.plates.as_slice(), &dishes, &targets, 30);
    }
}
