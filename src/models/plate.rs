use std::cmp::Ordering;

use serde::{Serialize, Serializer};

use crate::models::dish::{Dish, Macro};
use crate::planner::constants::{MAX_PLATE_SIZE, MIN_PLATE_SIZE};

/// Allowed serving multipliers. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ServingOption {
    Half,
    One,
    OneAndHalf,
    Two,
}

impl ServingOption {
    pub const ALL: [ServingOption; 4] = [
        ServingOption::Half,
        ServingOption::One,
        ServingOption::OneAndHalf,
        ServingOption::Two,
    ];

    #[inline]
    pub fn multiplier(self) -> f64 {
        match self {
            ServingOption::Half => 0.5,
            ServingOption::One => 1.0,
            ServingOption::OneAndHalf => 1.5,
            ServingOption::Two => 2.0,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        match self {
            ServingOption::Half => 0,
            ServingOption::One => 1,
            ServingOption::OneAndHalf => 2,
            ServingOption::Two => 3,
        }
    }

    /// Exact lookup; anything outside the closed set is rejected.
    pub fn from_multiplier(value: f64) -> Option<Self> {
        Self::ALL.into_iter().find(|o| o.multiplier() == value)
    }
}

impl Serialize for ServingOption {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.multiplier())
    }
}

/// One (dish, serving) pair of a plate. `dish` indexes the candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlateItem {
    pub dish: usize,
    pub serving: ServingOption,
}

impl PlateItem {
    pub fn new(dish: usize, serving: ServingOption) -> Self {
        Self { dish, serving }
    }
}

/// Combined macros of a plate. Always derived from dish data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PlateTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl PlateTotals {
    #[inline]
    pub fn get(&self, m: Macro) -> f64 {
        match m {
            Macro::Calories => self.calories,
            Macro::Protein => self.protein,
            Macro::Carbs => self.carbs,
            Macro::Fat => self.fat,
        }
    }

    #[inline]
    pub fn add(&mut self, dish: &Dish, serving: ServingOption) {
        let mult = serving.multiplier();
        self.calories += dish.macros.calories as f64 * mult;
        self.protein += dish.macros.protein as f64 * mult;
        self.carbs += dish.macros.carbs as f64 * mult;
        self.fat += dish.macros.fat as f64 * mult;
    }
}

/// A plate: 2–4 (dish, serving) pairs stored in ascending dish order.
///
/// Plates are totally ordered by a canonical key (size, then dish indices,
/// then serving indices) which breaks score ties deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlateCandidate {
    items: Vec<PlateItem>,
}

impl PlateCandidate {
    pub fn new(mut items: Vec<PlateItem>) -> Self {
        items.sort_by_key(|i| i.dish);
        Self { items }
    }

    pub fn items(&self) -> &[PlateItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Recompute totals from the candidate dishes.
    pub fn totals(&self, dishes: &[Dish]) -> PlateTotals {
        let mut totals = PlateTotals::default();
        for item in &self.items {
            totals.add(&dishes[item.dish], item.serving);
        }
        totals
    }

    /// Structural invariants: size in range, indices valid, names distinct.
    pub fn is_well_formed(&self, dishes: &[Dish]) -> bool {
        if !(MIN_PLATE_SIZE..=MAX_PLATE_SIZE).contains(&self.items.len()) {
            return false;
        }
        if self.items.iter().any(|i| i.dish >= dishes.len()) {
            return false;
        }
        let mut keys: Vec<String> = self.items.iter().map(|i| dishes[i.dish].key()).collect();
        keys.sort();
        keys.dedup();
        keys.len() == self.items.len()
    }
}

impl Ord for PlateCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.items
            .len()
            .cmp(&other.items.len())
            .then_with(|| {
                let a = self.items.iter().map(|i| i.dish);
                a.cmp(other.items.iter().map(|i| i.dish))
            })
            .then_with(|| {
                let a = self.items.iter().map(|i| i.serving.index());
                a.cmp(other.items.iter().map(|i| i.serving.index()))
            })
    }
}

impl PartialOrd for PlateCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A feasible plate with its totals and score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPlate {
    pub plate: PlateCandidate,
    pub totals: PlateTotals,
    pub score: f64,
}

impl ScoredPlate {
    /// Ordering used by the feasible set: score ascending, then canonical key.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| self.plate.cmp(&other.plate))
    }
}

/// Capped collection of feasible plates kept sorted by [`ScoredPlate::rank_cmp`].
#[derive(Debug, Clone)]
pub struct FeasibleSet {
    cap: usize,
    plates: Vec<ScoredPlate>,
}

impl FeasibleSet {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            plates: Vec::with_capacity(cap.min(64)),
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.plates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plates.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.plates.len() >= self.cap
    }

    /// Score of the last retained plate.
    pub fn worst_score(&self) -> Option<f64> {
        self.plates.last().map(|p| p.score)
    }

    /// Cheap pre-check before building a plate: could this score be kept?
    #[inline]
    pub fn admits(&self, score: f64) -> bool {
        if self.cap == 0 {
            return false;
        }
        match self.worst_score() {
            Some(worst) if self.is_full() => score <= worst,
            _ => true,
        }
    }

    /// Insert keeping order and cap. Returns whether the plate was retained.
    pub fn insert(&mut self, scored: ScoredPlate) -> bool {
        let pos = match self.plates.binary_search_by(|p| p.rank_cmp(&scored)) {
            Ok(_) => return false,
            Err(pos) => pos,
        };
        if pos >= self.cap {
            return false;
        }
        self.plates.insert(pos, scored);
        self.plates.truncate(self.cap);
        true
    }

    /// Merge another partial set. The result is independent of merge order.
    pub fn merge(&mut self, other: FeasibleSet) {
        for scored in other.plates {
            self.insert(scored);
        }
    }

    pub fn best(&self) -> Option<&ScoredPlate> {
        self.plates.first()
    }

    pub fn get(&self, index: usize) -> Option<&ScoredPlate> {
        self.plates.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoredPlate> {
        self.plates.iter()
    }

    pub fn as_slice(&self) -> &[ScoredPlate] {
        &self.plates
    }
}
