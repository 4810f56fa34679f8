/// Smallest legal plate.
pub const MIN_PLATE_SIZE: usize = 2;

/// Largest legal plate.
pub const MAX_PLATE_SIZE: usize = 4;

/// Allowed relative deviation from each active target (±10%).
pub const TOLERANCE: f64 = 0.10;

/// Maximum plates kept in the feasible set.
pub const DEFAULT_FEASIBLE_CAP: usize = 30;

/// Maximum plates offered to the tastiness ranker.
pub const DEFAULT_RANKER_CAP: usize = 30;

// ─────────────────────────────────────────────────────────────────────────────
// Time budgets
// ─────────────────────────────────────────────────────────────────────────────

/// Wall-clock budget for plate enumeration.
pub const DEFAULT_TIME_BUDGET_MS: u64 = 8_000;

/// Timeout for the ranker call. Must stay below the enumeration budget.
pub const DEFAULT_RANKER_TIMEOUT_MS: u64 = 5_000;

/// How often a process-backed ranker is polled for exit or cancellation.
pub const RANKER_POLL_INTERVAL_MS: u64 = 20;

// ─────────────────────────────────────────────────────────────────────────────
// Strategy selection
// ─────────────────────────────────────────────────────────────────────────────

/// Candidate count above which the ILP strategy is tried first.
pub const DEFAULT_ILP_THRESHOLD: usize = 40;

/// Extra ILP rounds allowed beyond the cap, for solutions rejected on re-check.
pub const ILP_EXTRA_ROUNDS: usize = 8;

/// Fraction of the remaining budget the solver may use before brute force
/// takes over.
pub const ILP_BUDGET_SHARE: f64 = 0.5;

/// Snapshot freshness window for the menu cache.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Minimum Jaro-Winkler similarity for "did you mean" suggestions.
pub const SUGGESTION_THRESHOLD: f64 = 0.7;
