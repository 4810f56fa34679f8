use thiserror::Error;

use crate::models::ErrorResponse;

/// Outcome kinds of a single plan request, mapped onto HTTP-style statuses.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("{0}")]
    BadRequest(String),

    #[error("no plate found within tolerance: {0}")]
    Infeasible(String),

    #[error("time budget exhausted before any feasible plate was found")]
    Timeout,

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl PlanError {
    pub fn status(&self) -> u16 {
        match self {
            PlanError::BadRequest(_) => 400,
            PlanError::Infeasible(_) => 422,
            PlanError::UpstreamUnavailable(_) => 503,
            PlanError::Timeout => 504,
            PlanError::Internal(_) => 500,
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
        }
    }
}

/// Failures of the candidate (menu) source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("menu source returned status {0}")]
    Status(u16),
}

/// Failures of the tastiness ranker. All of them are recovered by the
/// numeric fallback.
#[derive(Debug, Error)]
pub enum RankerError {
    #[error("no ranker configured")]
    NotConfigured,

    #[error("ranker timed out after {0} ms")]
    Timeout(u128),

    #[error("ranker call was cancelled")]
    Cancelled,

    #[error("ranker failed: {0}")]
    Failed(String),

    #[error("ranker IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed ranker response: {0}")]
    Malformed(String),

    #[error("ranker chose a plate that was not offered: {0}")]
    UnknownSelection(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level error for the binary and library entry points.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Menu source error: {0}")]
    Source(#[from] SourceError),

    #[error("Invalid section definitions: {0}")]
    Sections(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Logging setup failed: {0}")]
    Telemetry(String),
}

pub type Result<T> = std::result::Result<T, PlannerError>;
