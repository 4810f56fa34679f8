use tracing_subscriber::EnvFilter;

use crate::error::{PlannerError, Result};

/// Install the global subscriber. Logs go to stderr so stdout stays JSON.
///
/// `RUST_LOG` wins over `level`; `verbose` raises the crate to `debug`.
pub fn init(level: &str, verbose: bool) -> Result<()> {
    let directive = if verbose {
        format!("{level},plate_planner_rs=debug")
    } else {
        level.to_string()
    };

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&directive)
            .map_err(|e| PlannerError::Telemetry(format!("invalid log filter '{directive}': {e}")))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| PlannerError::Telemetry(e.to_string()))
}
