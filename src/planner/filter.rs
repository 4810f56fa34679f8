use std::collections::HashSet;

use crate::models::{Dish, DishRecord};

/// Section whitelist and allergen blacklist, normalized for
/// case-insensitive matching.
#[derive(Debug, Clone, Default)]
pub struct CandidateFilters {
    sections: Vec<String>,
    avoid_allergies: Vec<String>,
}

impl CandidateFilters {
    pub fn new(sections: &[String], avoid_allergies: &[String]) -> Self {
        Self {
            sections: normalize(sections),
            avoid_allergies: normalize(avoid_allergies),
        }
    }

    /// True when the dish passes both filters.
    pub fn accepts(&self, dish: &Dish) -> bool {
        if !self.sections.is_empty() && !self.sections.contains(&dish.section.to_lowercase()) {
            return false;
        }
        !self.avoid_allergies.iter().any(|a| dish.has_allergen(a))
    }
}

fn normalize(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Turn raw records into the candidate set.
///
/// Drops unnamed records and anything rejected by `filters`. Names are the
/// uniqueness key, so a repeated name (case-insensitive) keeps its first
/// occurrence.
pub fn filter_candidates(records: &[DishRecord], filters: &CandidateFilters) -> Vec<Dish> {
    let mut seen = HashSet::new();
    records
        .iter()
        .map(Dish::from_record)
        .filter(|dish| !dish.name.is_empty())
        .filter(|dish| filters.accepts(dish))
        .filter(|dish| seen.insert(dish.key()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(name: &str, section: &str, allergens: &[&str]) -> DishRecord {
        DishRecord {
            name: name.to_string(),
            serving_size: "1 each".to_string(),
            calories: json!("100 kcal"),
            protein: json!(5),
            section: section.to_string(),
            allergens: allergens.iter().map(|a| a.to_string()).collect(),
            ..Default::default()
        }
    }

    fn names(dishes: &[Dish]) -> Vec<&str> {
        dishes.iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn test_no_filters_keeps_everything() {
        let records = vec![record("Soup", "Soups", &[]), record("Salad", "Salad Bar", &["egg"])];
        let dishes = filter_candidates(&records, &CandidateFilters::default());
        assert_eq!(names(&dishes), vec!["Soup", "Salad"]);
        assert_eq!(dishes[0].macros.calories, 100);
    }

    #[test]
    fn test_section_whitelist_case_insensitive() {
        let records = vec![
            record("Soup", "Soups", &[]),
            record("Burger", "Grill", &[]),
            record("Fries", "GRILL", &[]),
        ];
        let filters = CandidateFilters::new(&["grill".to_string()], &[]);
        let dishes = filter_candidates(&records, &filters);
        assert_eq!(names(&dishes), vec!["Burger", "Fries"]);
    }

    #[test]
    fn test_allergen_blacklist_case_insensitive() {
        let records = vec![
            record("PB&J", "Deli", &["Peanuts", "Wheat"]),
            record("Apple", "Fruit", &[]),
            record("Cheese Pizza", "Pizza", &["milk", "wheat"]),
        ];
        let filters = CandidateFilters::new(&[], &[" PEANUTS ".to_string(), "Milk".to_string()]);
        let dishes = filter_candidates(&records, &filters);
        assert_eq!(names(&dishes), vec!["Apple"]);
    }

    #[test]
    fn test_duplicate_names_keep_first() {
        let mut second = record("Rice", "Sides", &[]);
        second.serving_size = "2 cups".to_string();
        let records = vec![record("Rice", "Sides", &[]), second, record("rice", "Sides", &[])];
        let dishes = filter_candidates(&records, &CandidateFilters::default());
        assert_eq!(dishes.len(), 1);
        assert_eq!(dishes[0].serving_size, "1 each");
    }

    #[test]
    fn test_unnamed_records_dropped() {
        let records = vec![record("  ", "Sides", &[]), record("Corn", "Sides", &[])];
        let dishes = filter_candidates(&records, &CandidateFilters::default());
        assert_eq!(names(&dishes), vec!["Corn"]);
    }
}
