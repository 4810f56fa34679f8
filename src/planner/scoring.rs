use crate::models::{PlateTotals, Targets};
use crate::planner::constants::TOLERANCE;

/// Squared deviation from every active target. Lower is better.
pub fn score(totals: &PlateTotals, targets: &Targets) -> f64 {
    targets
        .active_macros()
        .map(|(m, target)| {
            let diff = totals.get(m) - target;
            diff * diff
        })
        .sum()
}

/// Whether every active macro is within ±10% of its target.
///
/// Compared as `|total - target| <= target * TOLERANCE` using the scaled form
/// `|total - target| * 10 <= target` so half-serving totals stay exact.
pub fn within_tolerance(totals: &PlateTotals, targets: &Targets) -> bool {
    let scale = 1.0 / TOLERANCE;
    targets
        .active_macros()
        .all(|(m, target)| (totals.get(m) - target).abs() * scale <= target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(calories: f64, protein: f64, carbs: f64, fat: f64) -> PlateTotals {
        PlateTotals {
            calories,
            protein,
            carbs,
            fat,
        }
    }

    #[test]
    fn test_exact_hit_scores_zero() {
        let targets = Targets::new(500.0, 30.0, 0.0, 0.0);
        assert_eq!(score(&totals(500.0, 30.0, 99.0, 7.0), &targets), 0.0);
    }

    #[test]
    fn test_inactive_macros_ignored() {
        let targets = Targets::new(500.0, 0.0, 0.0, 0.0);
        assert_eq!(score(&totals(510.0, 300.0, 300.0, 300.0), &targets), 100.0);
    }

    #[test]
    fn test_score_sums_squares() {
        let targets = Targets::new(500.0, 30.0, 60.0, 20.0);
        let s = score(&totals(490.0, 33.0, 58.0, 21.0), &targets);
        assert!((s - (100.0 + 9.0 + 4.0 + 1.0)).abs() < 1e-9);
    }

    #[test]
    fn test_tolerance_boundaries_inclusive() {
        let targets = Targets::new(500.0, 30.0, 0.0, 0.0);
        assert!(within_tolerance(&totals(550.0, 33.0, 0.0, 0.0), &targets));
        assert!(within_tolerance(&totals(450.0, 27.0, 0.0, 0.0), &targets));
        assert!(!within_tolerance(&totals(550.5, 30.0, 0.0, 0.0), &targets));
        assert!(!within_tolerance(&totals(500.0, 26.5, 0.0, 0.0), &targets));
    }

    #[test]
    fn test_no_targets_always_within() {
        let targets = Targets::default();
        assert!(within_tolerance(&totals(9999.0, 0.0, 0.0, 0.0), &targets));
        assert_eq!(score(&totals(9999.0, 0.0, 0.0, 0.0), &targets), 0.0);
    }
}
