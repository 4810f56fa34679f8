//! The plan pipeline: menu → candidates → feasible plates → ranker → response.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, info_span, warn};

use crate::config::PlannerConfig;
use crate::error::{PlanError, PlannerError, SourceError};
use crate::menu::{source_for, MenuCache, SectionClassifier, Snapshot};
use crate::models::{Dish, DishRecord, PlanQuery, PlanRequest, PlanResponse};
use crate::planner::{
    assemble, default_workers, filter_candidates, AdaptiveEnumerator, CandidateFilters,
    Enumeration, PlateEnumerator, SearchLimits, MIN_PLATE_SIZE,
};
use crate::ranker::{ChoiceSource, CommandRanker, PromptContext, RankerGateway, TastinessRanker};

/// Search bounds applied to every request.
#[derive(Debug, Clone, Copy)]
pub struct SearchSettings {
    pub budget: Duration,
    pub cap: usize,
    pub workers: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        let config = PlannerConfig::default();
        Self {
            budget: config.time_budget(),
            cap: config.search.feasible_cap,
            workers: default_workers(),
        }
    }
}

/// A successful plan with how it was reached.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub response: PlanResponse,
    pub choice: ChoiceSource,
    pub strategy: &'static str,
    pub feasible: usize,
    pub completed: bool,
}

/// The candidate set and full feasible set for a request.
#[derive(Debug, Clone)]
pub struct Exploration {
    pub candidates: Vec<Dish>,
    pub enumeration: Enumeration,
}

pub struct PlanService {
    menu: Arc<MenuCache>,
    classifier: SectionClassifier,
    enumerator: Box<dyn PlateEnumerator>,
    gateway: RankerGateway,
    settings: SearchSettings,
}

impl PlanService {
    pub fn new(
        menu: Arc<MenuCache>,
        classifier: SectionClassifier,
        enumerator: Box<dyn PlateEnumerator>,
        gateway: RankerGateway,
        settings: SearchSettings,
    ) -> Self {
        Self {
            menu,
            classifier,
            enumerator,
            gateway,
            settings,
        }
    }

    /// Wire a service from configuration.
    pub fn from_config(config: &PlannerConfig) -> Result<Self, PlannerError> {
        config.validate()?;

        let source = source_for(&config.menu.source, config.fetch_timeout())?;
        let menu = Arc::new(MenuCache::new(source, config.cache_ttl()));

        let classifier = match &config.menu.sections {
            Some(path) => SectionClassifier::load(path)?,
            None => SectionClassifier::default(),
        };

        let ranker: Option<Arc<dyn TastinessRanker>> = config
            .ranker
            .command
            .as_deref()
            .and_then(CommandRanker::from_command_line)
            .map(|r| Arc::new(r) as Arc<dyn TastinessRanker>);
        let gateway = RankerGateway::new(ranker, config.ranker_timeout(), config.ranker.max_options);

        let settings = SearchSettings {
            budget: config.time_budget(),
            cap: config.search.feasible_cap,
            workers: config.search.workers.unwrap_or_else(default_workers),
        };

        Ok(Self::new(
            menu,
            classifier,
            Box::new(AdaptiveEnumerator::new(config.search.ilp_threshold)),
            gateway,
            settings,
        ))
    }

    /// Answer one plan request.
    pub fn plan(&self, request: &PlanRequest) -> Result<PlanOutcome, PlanError> {
        let query = request.validate()?;
        let _span = info_span!("plan", hall = %query.hall, meal = %query.meal).entered();

        let snapshot = self.snapshot()?;
        let records = snapshot
            .menu
            .dish_records(&query.hall, &query.meal, &self.classifier)?;
        self.plan_records(&query, &records)
    }

    /// Run the optimizer over already fetched records.
    pub fn plan_records(&self, query: &PlanQuery, records: &[DishRecord]) -> Result<PlanOutcome, PlanError> {
        let candidates = self.candidates(query, records)?;
        let enumeration = self.enumerate(query, &candidates)?;

        if enumeration.timed_out_empty() {
            return Err(PlanError::Timeout);
        }
        if enumeration.plates.is_empty() {
            return Err(PlanError::Infeasible(
                "no combination of 2-4 dishes is within 10% of every target".to_string(),
            ));
        }

        let ctx = PromptContext {
            hall: &query.hall,
            meal: &query.meal,
            targets: query.targets,
            sections: &query.sections,
            avoid_allergies: &query.avoid_allergies,
        };
        let choice = self
            .gateway
            .choose(&enumeration.plates, &candidates, &ctx)
            .ok_or_else(|| PlanError::Internal("no plate to choose from".to_string()))?;
        let chosen = enumeration
            .plates
            .get(choice.index)
            .ok_or_else(|| PlanError::Internal(format!("choice {} out of range", choice.index)))?;

        let response = assemble(&chosen.plate, &candidates);
        info!(
            strategy = enumeration.strategy,
            feasible = enumeration.plates.len(),
            score = chosen.score,
            ranked = matches!(choice.source, ChoiceSource::Ranker),
            "plate chosen"
        );

        Ok(PlanOutcome {
            response,
            choice: choice.source,
            strategy: enumeration.strategy,
            feasible: enumeration.plates.len(),
            completed: enumeration.completed,
        })
    }

    /// The whole feasible set for a request, without ranking.
    pub fn explore(&self, request: &PlanRequest) -> Result<Exploration, PlanError> {
        let query = request.validate()?;
        let _span = info_span!("explore", hall = %query.hall, meal = %query.meal).entered();

        let snapshot = self.snapshot()?;
        let records = snapshot
            .menu
            .dish_records(&query.hall, &query.meal, &self.classifier)?;
        let candidates = self.candidates(&query, &records)?;
        let enumeration = self.enumerate(&query, &candidates)?;
        if enumeration.timed_out_empty() {
            return Err(PlanError::Timeout);
        }
        Ok(Exploration {
            candidates,
            enumeration,
        })
    }

    /// Section titles present for a hall and meal.
    pub fn sections(&self, hall: &str, meal: &str) -> Result<Vec<String>, PlanError> {
        let snapshot = self.snapshot()?;
        let menu = snapshot.menu.meal(hall, meal)?;
        Ok(self.classifier.sections_for(menu.category_names()))
    }

    fn snapshot(&self) -> Result<Arc<Snapshot>, PlanError> {
        self.menu.get().map_err(|e: SourceError| {
            warn!(source = %self.menu.source().describe(), error = %e, "no menu snapshot available");
            PlanError::UpstreamUnavailable(e.to_string())
        })
    }

    fn candidates(&self, query: &PlanQuery, records: &[DishRecord]) -> Result<Vec<Dish>, PlanError> {
        let filters = CandidateFilters::new(&query.sections, &query.avoid_allergies);
        let candidates = filter_candidates(records, &filters);
        debug!(records = records.len(), candidates = candidates.len(), "candidates filtered");

        if candidates.len() < MIN_PLATE_SIZE {
            return Err(PlanError::Infeasible(format!(
                "only {} candidate dish(es) left after filtering",
                candidates.len()
            )));
        }
        Ok(candidates)
    }

    fn enumerate(&self, query: &PlanQuery, candidates: &[Dish]) -> Result<Enumeration, PlanError> {
        let limits = SearchLimits::new(self.settings.budget, self.settings.cap, self.settings.workers);
        self.enumerator
            .enumerate(candidates, &query.targets, &limits)
            .map_err(|e| PlanError::Internal(e.to_string()))
    }
}
