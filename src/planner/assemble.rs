use crate::models::{Dish, PlanResponse, PlateCandidate, PlateLine};

/// Build the response for a chosen plate.
///
/// Totals are always recomputed from `dishes`; nothing reported by a ranker
/// reaches the output.
pub fn assemble(plate: &PlateCandidate, dishes: &[Dish]) -> PlanResponse {
    let items = plate
        .items()
        .iter()
        .map(|item| {
            let dish = &dishes[item.dish];
            PlateLine {
                name: dish.name.clone(),
                servings: item.serving.multiplier(),
                serving_size: dish.serving_size.clone(),
            }
        })
        .collect();

    PlanResponse {
        items,
        totals: plate.totals(dishes),
    }
}
