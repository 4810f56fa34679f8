use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::models::dish::Macro;
use crate::models::plate::PlateTotals;

/// Incoming plan request, as received on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    #[serde(default)]
    pub hall: Option<String>,

    #[serde(default)]
    pub meal: Option<String>,

    #[serde(default)]
    pub calorie_target: Option<f64>,

    #[serde(default)]
    pub protein_target: Option<f64>,

    #[serde(default)]
    pub carb_target: Option<f64>,

    #[serde(default)]
    pub fat_target: Option<f64>,

    /// `null` and absent both mean "no filter".
    #[serde(default)]
    pub sections: Option<Vec<String>>,

    #[serde(default)]
    pub avoid_allergies: Option<Vec<String>>,
}

impl PlanRequest {
    /// Parse a request body. Shape errors are a 400.
    pub fn from_json(body: &str) -> Result<Self, PlanError> {
        serde_json::from_str(body).map_err(|e| PlanError::BadRequest(format!("malformed request: {e}")))
    }

    /// Check required fields and target ranges.
    pub fn validate(&self) -> Result<PlanQuery, PlanError> {
        let hall = required(&self.hall, "hall")?;
        let meal = required(&self.meal, "meal")?;

        let targets = Targets::from_options(
            self.calorie_target,
            self.protein_target,
            self.carb_target,
            self.fat_target,
        )?;

        Ok(PlanQuery {
            hall,
            meal,
            targets,
            sections: self.sections.clone().unwrap_or_default(),
            avoid_allergies: self.avoid_allergies.clone().unwrap_or_default(),
        })
    }
}

fn required(value: &Option<String>, field: &str) -> Result<String, PlanError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(PlanError::BadRequest(format!("missing required field '{field}'"))),
    }
}

/// A validated request.
#[derive(Debug, Clone)]
pub struct PlanQuery {
    pub hall: String,
    pub meal: String,
    pub targets: Targets,
    pub sections: Vec<String>,
    pub avoid_allergies: Vec<String>,
}

/// Macro targets. A target of zero (or absent) is inactive.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Targets {
    values: [f64; 4],
}

impl Targets {
    pub fn new(calories: f64, protein: f64, carbs: f64, fat: f64) -> Self {
        Self {
            values: [calories, protein, carbs, fat].map(|v| if v > 0.0 { v } else { 0.0 }),
        }
    }

    /// Build from optional wire values. Negative or non-finite values are rejected.
    pub fn from_options(
        calories: Option<f64>,
        protein: Option<f64>,
        carbs: Option<f64>,
        fat: Option<f64>,
    ) -> Result<Self, PlanError> {
        let mut values = [0.0; 4];
        for (m, value) in Macro::ALL.into_iter().zip([calories, protein, carbs, fat]) {
            let v = value.unwrap_or(0.0);
            if !v.is_finite() || v < 0.0 {
                return Err(PlanError::BadRequest(format!(
                    "{} target must be a non-negative number",
                    m.label().to_lowercase()
                )));
            }
            values[m.index()] = v;
        }
        Ok(Self { values })
    }

    /// The target for `m`, if active.
    #[inline]
    pub fn active(&self, m: Macro) -> Option<f64> {
        let v = self.values[m.index()];
        (v > 0.0).then_some(v)
    }

    pub fn active_macros(&self) -> impl Iterator<Item = (Macro, f64)> + '_ {
        Macro::ALL
            .into_iter()
            .filter_map(|m| self.active(m).map(|t| (m, t)))
    }

    /// True when no target is active: every plate is feasible.
    pub fn is_unconstrained(&self) -> bool {
        self.active_macros().next().is_none()
    }
}

/// One line of the final plate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlateLine {
    pub name: String,
    pub servings: f64,
    pub serving_size: String,
}

/// Success body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanResponse {
    pub items: Vec<PlateLine>,
    pub totals: PlateTotals,
}

/// Error body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
