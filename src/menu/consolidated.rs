use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use strsim::jaro_winkler;
use tracing::trace;

use super::sections::SectionClassifier;
use crate::error::{PlanError, SourceError};
use crate::models::DishRecord;
use crate::planner::constants::SUGGESTION_THRESHOLD;

/// The published menu document: halls → meals → categories → items.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsolidatedMenu {
    #[serde(default)]
    pub last_updated: Option<String>,

    #[serde(default)]
    pub date: Option<String>,

    #[serde(default)]
    pub dining_halls: BTreeMap<String, BTreeMap<String, MealMenu>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MealMenu {
    #[serde(default)]
    pub available: bool,

    /// Raw item lists; malformed entries are skipped when read.
    #[serde(default)]
    pub categories: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MenuItem {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub serving_size: String,

    #[serde(default)]
    pub nutrition: Nutrition,

    #[serde(default)]
    pub allergens: Allergens,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Nutrition {
    #[serde(default)]
    pub calories: Value,
    #[serde(default)]
    pub protein: Value,
    #[serde(default)]
    pub total_carbs: Value,
    #[serde(default)]
    pub total_fat: Value,
}

/// Allergens arrive either as one comma-separated string or as a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Allergens {
    List(Vec<String>),
    Text(String),
}

impl Default for Allergens {
    fn default() -> Self {
        Allergens::List(Vec::new())
    }
}

impl Allergens {
    pub fn to_vec(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            Allergens::List(list) => list.iter().map(String::as_str).collect(),
            Allergens::Text(text) => text.split(',').collect(),
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|a| !a.is_empty() && !a.eq_ignore_ascii_case("not specified"))
            .map(str::to_string)
            .collect()
    }
}

impl MenuItem {
    pub fn to_record(&self, section: &str) -> DishRecord {
        DishRecord {
            name: self.name.clone(),
            serving_size: self.serving_size.clone(),
            calories: self.nutrition.calories.clone(),
            protein: self.nutrition.protein.clone(),
            carbs: self.nutrition.total_carbs.clone(),
            fat: self.nutrition.total_fat.clone(),
            section: section.to_string(),
            allergens: self.allergens.to_vec(),
        }
    }
}

impl MealMenu {
    /// Items of one category; entries that are not item objects are dropped.
    pub fn items(&self, category: &str) -> Vec<MenuItem> {
        match self.categories.get(category) {
            Some(Value::Array(entries)) => entries
                .iter()
                .filter_map(|entry| match serde_json::from_value(entry.clone()) {
                    Ok(item) => Some(item),
                    Err(e) => {
                        trace!(category, error = %e, "skipping malformed menu item");
                        None
                    }
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }
}

impl ConsolidatedMenu {
    pub fn from_json(json: &str) -> Result<Self, SourceError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn hall_names(&self) -> impl Iterator<Item = &str> {
        self.dining_halls.keys().map(String::as_str)
    }

    /// Look up a hall/meal pair, case-insensitively. Unknown names are a bad
    /// request with a "did you mean" hint when something is close.
    pub fn meal(&self, hall: &str, meal: &str) -> Result<&MealMenu, PlanError> {
        let meals = lookup(&self.dining_halls, hall)
            .ok_or_else(|| unknown("hall", hall, self.dining_halls.keys()))?;
        lookup(meals, meal).ok_or_else(|| unknown("meal", meal, meals.keys()))
    }

    /// Dish records for a hall/meal. A meal marked unavailable has none.
    pub fn dish_records(
        &self,
        hall: &str,
        meal: &str,
        classifier: &SectionClassifier,
    ) -> Result<Vec<DishRecord>, PlanError> {
        let menu = self.meal(hall, meal)?;
        if !menu.available {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for category in menu.category_names() {
            let section = classifier.classify(category);
            records.extend(menu.items(category).iter().map(|item| item.to_record(&section)));
        }
        Ok(records)
    }
}

fn lookup<'a, V>(map: &'a BTreeMap<String, V>, key: &str) -> Option<&'a V> {
    let key = key.trim();
    map.get(key).or_else(|| {
        map.iter()
            .find(|(k, _)| k.to_lowercase() == key.to_lowercase())
            .map(|(_, v)| v)
    })
}

fn unknown<'a>(kind: &str, name: &str, known: impl Iterator<Item = &'a String>) -> PlanError {
    match suggest(name, known) {
        Some(s) => PlanError::BadRequest(format!("unknown {kind} '{name}'; did you mean '{s}'?")),
        None => PlanError::BadRequest(format!("unknown {kind} '{name}'")),
    }
}

/// Closest known name by Jaro-Winkler similarity, if close enough.
pub fn suggest<'a>(input: &str, known: impl Iterator<Item = &'a String>) -> Option<&'a str> {
    let input = input.to_lowercase();
    known
        .map(|k| (k, jaro_winkler(&k.to_lowercase(), &input)))
        .filter(|(_, score)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(k, _)| k.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MENU: &str = r#"{
        "last_updated": "2025-03-01T10:00:00",
        "dining_halls": {
            "North Dining Hall": {
                "Lunch": {
                    "available": true,
                    "categories": {
                        "Grill": [
                            {"name": "Cheeseburger", "serving_size": "1 each",
                             "nutrition": {"calories": "540", "protein": "31g", "total_carbs": "40g", "total_fat": "28g"},
                             "allergens": "Milk, Wheat, Soy"},
                            "not an item"
                        ],
                        "Salad Bar": [
                            {"name": "Garden Salad", "serving_size": "1 cup",
                             "nutrition": {"calories": 25, "protein": 1},
                             "allergens": "Not Specified"}
                        ]
                    }
                },
                "Breakfast": {"available": false, "categories": {}}
            }
        }
    }"#;

    #[test]
    fn test_records_carry_section_and_allergens() {
        let menu = ConsolidatedMenu::from_json(MENU).unwrap();
        let records = menu
            .dish_records("North Dining Hall", "Lunch", &SectionClassifier::default())
            .unwrap();

        assert_eq!(records.len(), 2);
        let burger = &records[0];
        assert_eq!(burger.name, "Cheeseburger");
        assert_eq!(burger.section, "Grill");
        assert_eq!(burger.allergens, vec!["Milk", "Wheat", "Soy"]);
        assert_eq!(burger.carbs, Value::from("40g"));
        assert!(records[1].allergens.is_empty());
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let menu = ConsolidatedMenu::from_json(MENU).unwrap();
        assert!(menu.meal("north dining hall", "LUNCH").is_ok());
    }

    #[test]
    fn test_unknown_hall_suggests_closest() {
        let menu = ConsolidatedMenu::from_json(MENU).unwrap();
        let err = menu.meal("Nort Dining Hal", "Lunch").unwrap_err();
        assert_eq!(err.status(), 400);
        assert!(err.to_string().contains("did you mean 'North Dining Hall'"));
    }

    #[test]
    fn test_unknown_meal_is_bad_request() {
        let menu = ConsolidatedMenu::from_json(MENU).unwrap();
        let err = menu.meal("North Dining Hall", "Midnight Snack").unwrap_err();
        assert_eq!(err.status(), 400);
        assert!(err.to_string().contains("unknown meal"));
    }

    #[test]
    fn test_unavailable_meal_has_no_records() {
        let menu = ConsolidatedMenu::from_json(MENU).unwrap();
        let records = menu
            .dish_records("North Dining Hall", "Breakfast", &SectionClassifier::default())
            .unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_allergen_list_form() {
        let allergens: Allergens = serde_json::from_str(r#"[" Peanuts ", ""]"#).unwrap();
        assert_eq!(allergens.to_vec(), vec!["Peanuts"]);
    }
}
