use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::planner::macros::parse_macro;

/// One of the four tracked macros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Macro {
    Calories,
    Protein,
    Carbs,
    Fat,
}

impl Macro {
    pub const ALL: [Macro; 4] = [Macro::Calories, Macro::Protein, Macro::Carbs, Macro::Fat];

    /// Position of the macro in fixed-size per-macro arrays.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Macro::Calories => 0,
            Macro::Protein => 1,
            Macro::Carbs => 2,
            Macro::Fat => 3,
        }
    }

    /// Unit suffix used when talking to humans and rankers.
    pub fn unit(self) -> &'static str {
        match self {
            Macro::Calories => "kcal",
            _ => "g",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Macro::Calories => "Calories",
            Macro::Protein => "Protein",
            Macro::Carbs => "Carbohydrates",
            Macro::Fat => "Fat",
        }
    }
}

/// Per-serving macro amounts, already normalized to integers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Macros {
    pub calories: u32,
    pub protein: u32,
    pub carbs: u32,
    pub fat: u32,
}

impl Macros {
    pub fn new(calories: u32, protein: u32, carbs: u32, fat: u32) -> Self {
        Self {
            calories,
            protein,
            carbs,
            fat,
        }
    }

    #[inline]
    pub fn get(&self, m: Macro) -> u32 {
        match m {
            Macro::Calories => self.calories,
            Macro::Protein => self.protein,
            Macro::Carbs => self.carbs,
            Macro::Fat => self.fat,
        }
    }
}

/// A dish-shaped record as delivered by a candidate source.
///
/// Macro fields are kept as raw JSON so numbers and unit-suffixed strings
/// (`"12g"`, `"150 kcal"`) are both accepted; they are normalized once, when
/// the record becomes a [`Dish`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DishRecord {
    #[serde(default)]
    pub name: String,

    #[serde(default, alias = "serving_size")]
    pub serving_size: String,

    #[serde(default)]
    pub calories: Value,

    #[serde(default)]
    pub protein: Value,

    #[serde(default, alias = "total_carbs")]
    pub carbs: Value,

    #[serde(default, alias = "total_fat")]
    pub fat: Value,

    #[serde(default)]
    pub section: String,

    #[serde(default)]
    pub allergens: Vec<String>,
}

/// A dish eligible for a plate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dish {
    pub name: String,
    pub serving_size: String,
    pub macros: Macros,
    pub section: String,
    /// Lowercase, trimmed allergen names.
    pub allergens: BTreeSet<String>,
}

impl Dish {
    pub fn new(name: &str, serving_size: &str, macros: Macros) -> Self {
        Self {
            name: name.to_string(),
            serving_size: serving_size.to_string(),
            macros,
            section: String::new(),
            allergens: BTreeSet::new(),
        }
    }

    /// Build a dish from a raw record, normalizing macros and allergens.
    pub fn from_record(record: &DishRecord) -> Self {
        Self {
            name: record.name.trim().to_string(),
            serving_size: record.serving_size.trim().to_string(),
            macros: Macros {
                calories: parse_macro(&record.calories),
                protein: parse_macro(&record.protein),
                carbs: parse_macro(&record.carbs),
                fat: parse_macro(&record.fat),
            },
            section: record.section.trim().to_string(),
            allergens: record
                .allergens
                .iter()
                .map(|a| a.trim().to_lowercase())
                .filter(|a| !a.is_empty())
                .collect(),
        }
    }

    /// Canonical key for uniqueness checks (lowercase name).
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }

    pub fn has_allergen(&self, allergen: &str) -> bool {
        self.allergens.contains(allergen)
    }
}
