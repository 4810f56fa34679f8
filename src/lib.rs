pub mod cli;
pub mod config;
pub mod error;
pub mod interface;
pub mod menu;
pub mod models;
pub mod planner;
pub mod ranker;
pub mod service;
pub mod telemetry;

pub use config::PlannerConfig;
pub use error::{PlanError, PlannerError, Result};
pub use models::{Dish, PlanRequest, PlanResponse};
pub use service::{PlanOutcome, PlanService};
