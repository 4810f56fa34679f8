//! Tastiness ranking.
//!
//! A [`TastinessRanker`] is an untrusted collaborator that is shown a short
//! list of feasible plates and asked to pick one. [`RankerGateway`] owns the
//! timeout, validation and numeric fallback around it.

mod command;
mod gateway;
mod prompt;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

use crate::error::RankerError;
use crate::models::PlanResponse;

pub use command::CommandRanker;
pub use gateway::{parse_response, ChoiceSource, RankedChoice, RankedLine, RankedPlate, RankerGateway};
pub use prompt::{build_prompt, PromptContext, SYSTEM_PROMPT};

/// Shared flag a ranker polls to learn it should give up.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What a ranker is handed.
#[derive(Debug, Clone, Serialize)]
pub struct RankRequest {
    pub system: String,
    pub prompt: String,
    pub options: Vec<PlanResponse>,
}

/// External collaborator choosing the most appealing plate.
///
/// Implementations return the raw response text; parsing and validation are
/// done by the gateway. Long-running implementations should poll `cancel`.
pub trait TastinessRanker: Send + Sync {
    fn name(&self) -> &str {
        "ranker"
    }

    fn rank(&self, request: &RankRequest, cancel: &CancelToken) -> Result<String, RankerError>;
}

impl<T: TastinessRanker + ?Sized> TastinessRanker for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn rank(&self, request: &RankRequest, cancel: &CancelToken) -> Result<String, RankerError> {
        (**self).rank(request, cancel)
    }
}
