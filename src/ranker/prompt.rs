use serde_json::json;

use crate::models::{PlanResponse, Targets};

pub const SYSTEM_PROMPT: &str = "You are a nutrition-planning assistant.";

/// Request details echoed back to the ranker.
#[derive(Debug, Clone, Default)]
pub struct PromptContext<'a> {
    pub hall: &'a str,
    pub meal: &'a str,
    pub targets: Targets,
    pub sections: &'a [String],
    pub avoid_allergies: &'a [String],
}

const INSTRUCTIONS: &[&str] = &[
    "You are choosing one plate for a dining hall guest.",
    "Every option below already meets the guest's macro targets within 10%.",
    "Pick the single option that is the most enjoyable to eat: balanced, varied in color, \
     texture and flavor, and made of items that go well together.",
    "Do NOT modify any 'name' or 'servingSize'. Copy the chosen option exactly, \
     with the same items and servings and nothing added or removed.",
];

/// Ranking prompt for `options`.
pub fn build_prompt(options: &[PlanResponse], ctx: &PromptContext<'_>) -> String {
    let mut lines: Vec<String> = INSTRUCTIONS.iter().map(|s| s.to_string()).collect();

    lines.push(format!("\nMeal: {} at {}", ctx.meal, ctx.hall));
    if !ctx.avoid_allergies.is_empty() {
        lines.push(format!("Allergens avoided: {}.", ctx.avoid_allergies.join(", ")));
    }
    if !ctx.sections.is_empty() {
        lines.push(format!("Sections: {}.", ctx.sections.join(", ")));
    }

    lines.push("\nTargets:".to_string());
    for (m, target) in ctx.targets.active_macros() {
        lines.push(format!("- {}: {}{}", m.label(), target, m.unit()));
    }
    if ctx.targets.is_unconstrained() {
        lines.push("- none".to_string());
    }

    lines.push("\nOptions:".to_string());
    let numbered: Vec<_> = options
        .iter()
        .enumerate()
        .map(|(i, o)| json!({ "option": i + 1, "items": o.items, "totals": o.totals }))
        .collect();
    lines.push(serde_json::to_string_pretty(&numbered).unwrap_or_default());

    let schema = json!({
        "items": [{ "name": "...", "servings": 1, "servingSize": "..." }],
    });
    lines.push(format!(
        "\nReturn *only* JSON in this exact schema (no prose):\n{}",
        serde_json::to_string_pretty(&schema).unwrap_or_default()
    ));

    lines.join("\n")
}
