use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{build_prompt, CancelToken, PromptContext, RankRequest, TastinessRanker, SYSTEM_PROMPT};
use crate::error::RankerError;
use crate::models::{Dish, FeasibleSet, PlanResponse};
use crate::planner::assemble;

/// Who made the final choice.
#[derive(Debug, Clone, PartialEq)]
pub enum ChoiceSource {
    Ranker,
    /// Lowest-score plate, with the reason the ranker was not used.
    Fallback(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedChoice {
    /// Index into the feasible set.
    pub index: usize,
    pub source: ChoiceSource,
}

/// A ranker's answer, as parsed. Totals and unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedPlate {
    pub items: Vec<RankedLine>,
}

/// One line of a ranker's answer. `servingSize` may be absent when parsing,
/// but a line without it never matches an offered plate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedLine {
    pub name: String,
    pub servings: f64,
    #[serde(default, alias = "serving_size")]
    pub serving_size: Option<String>,
}

/// Runs a ranker under a timeout and turns its answer into a feasible-set
/// index, falling back to the best numeric fit on any failure.
pub struct RankerGateway {
    ranker: Option<Arc<dyn TastinessRanker>>,
    timeout: Duration,
    max_options: usize,
}

impl RankerGateway {
    pub fn new(ranker: Option<Arc<dyn TastinessRanker>>, timeout: Duration, max_options: usize) -> Self {
        Self {
            ranker,
            timeout,
            max_options,
        }
    }

    /// Gateway that always takes the numeric best fit.
    pub fn disabled() -> Self {
        Self::new(None, Duration::ZERO, 0)
    }

    pub fn is_enabled(&self) -> bool {
        self.ranker.is_some() && self.max_options > 0
    }

    /// Pick a plate. `None` only when `plates` is empty.
    pub fn choose(&self, plates: &FeasibleSet, dishes: &[Dish], ctx: &PromptContext<'_>) -> Option<RankedChoice> {
        if plates.is_empty() {
            return None;
        }

        let offered: Vec<PlanResponse> = plates
            .iter()
            .take(self.max_options)
            .map(|p| assemble(&p.plate, dishes))
            .collect();

        match self.ask(&offered, ctx) {
            Ok(index) => {
                info!(option = index, offered = offered.len(), "ranker chose a plate");
                Some(RankedChoice {
                    index,
                    source: ChoiceSource::Ranker,
                })
            }
            Err(RankerError::NotConfigured) => Some(RankedChoice {
                index: 0,
                source: ChoiceSource::Fallback(RankerError::NotConfigured.to_string()),
            }),
            Err(e) => {
                warn!(error = %e, "ranker rejected, using best numeric fit");
                Some(RankedChoice {
                    index: 0,
                    source: ChoiceSource::Fallback(e.to_string()),
                })
            }
        }
    }

    fn ask(&self, offered: &[PlanResponse], ctx: &PromptContext<'_>) -> Result<usize, RankerError> {
        let ranker = match &self.ranker {
            Some(r) if !offered.is_empty() => Arc::clone(r),
            _ => return Err(RankerError::NotConfigured),
        };

        let request = RankRequest {
            system: SYSTEM_PROMPT.to_string(),
            prompt: build_prompt(offered, ctx),
            options: offered.to_vec(),
        };
        debug!(ranker = ranker.name(), options = offered.len(), "calling ranker");

        let raw = self.call(ranker, request)?;
        let parsed = parse_response(&raw)?;
        match_offered(&parsed, offered)
    }

    /// Run the ranker on its own thread. On timeout the token is cancelled and
    /// the thread is left to wind down on its own.
    fn call(&self, ranker: Arc<dyn TastinessRanker>, request: RankRequest) -> Result<String, RankerError> {
        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();
        let (tx, rx) = mpsc::channel();

        thread::Builder::new()
            .name("ranker".to_string())
            .spawn(move || {
                let _ = tx.send(ranker.rank(&request, &worker_cancel));
            })?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                cancel.cancel();
                Err(RankerError::Timeout(self.timeout.as_millis()))
            }
            Err(RecvTimeoutError::Disconnected) => {
                Err(RankerError::Failed("ranker thread exited without answering".to_string()))
            }
        }
    }
}

/// Parse a ranker answer, tolerating prose and Markdown fences around the
/// JSON. The first `{` that starts a valid JSON object wins.
pub fn parse_response(raw: &str) -> Result<RankedPlate, RankerError> {
    for (start, _) in raw.match_indices('{') {
        let mut stream = serde_json::Deserializer::from_str(&raw[start..]).into_iter::<Value>();
        if let Some(Ok(value @ Value::Object(_))) = stream.next() {
            return serde_json::from_value(value).map_err(|e| RankerError::Malformed(e.to_string()));
        }
    }
    Err(RankerError::Malformed("no JSON object in response".to_string()))
}

/// Index of the single offered plate the answer reproduces exactly.
fn match_offered(answer: &RankedPlate, offered: &[PlanResponse]) -> Result<usize, RankerError> {
    if answer.items.is_empty() {
        return Err(RankerError::Malformed("empty plate".to_string()));
    }

    offered
        .iter()
        .position(|option| same_plate(answer, option))
        .ok_or_else(|| {
            let names: Vec<&str> = answer.items.iter().map(|i| i.name.as_str()).collect();
            RankerError::UnknownSelection(names.join(", "))
        })
}

fn same_plate(answer: &RankedPlate, option: &PlanResponse) -> bool {
    if answer.items.len() != option.items.len() {
        return false;
    }
    let mut used = vec![false; option.items.len()];
    answer.items.iter().all(|line| {
        let hit = option.items.iter().enumerate().position(|(i, item)| {
            !used[i]
                && item.name == line.name.trim()
                && item.servings == line.servings
                && line
                    .serving_size
                    .as_deref()
                    .is_some_and(|s| s.trim() == item.serving_size)
        });
        match hit {
            Some(i) => {
                used[i] = true;
                true
            }
            None => false,
        }
    })
}
