pub mod dish;
pub mod plate;
pub mod request;

pub use dish::{Dish, DishRecord, Macro, Macros};
pub use plate::{FeasibleSet, PlateCandidate, PlateItem, PlateTotals, ScoredPlate, ServingOption};
pub use request::{ErrorResponse, PlanQuery, PlanRequest, PlanResponse, PlateLine, Targets};
