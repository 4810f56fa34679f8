pub mod render;

pub use render::{write_error, write_feasible_csv, write_json, SectionsResponse};
