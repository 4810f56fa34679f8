use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::PlannerConfig;

/// plate_planner: pick a dining hall plate that hits your macros.
#[derive(Parser, Debug)]
#[command(name = "plate_planner")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Menu file path or http(s) URL (overrides the config).
    #[arg(short, long, global = true)]
    pub menu: Option<String>,

    /// Section definitions JSON (overrides the config).
    #[arg(long, global = true)]
    pub sections_file: Option<PathBuf>,

    /// Debug logging for this crate.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Plan a plate for a request and print the response JSON.
    Plan(PlanArgs),

    /// List the sections served at a hall and meal.
    Sections {
        #[arg(long)]
        hall: String,

        #[arg(long)]
        meal: String,
    },

    /// Write every feasible plate for a request as CSV.
    Explore {
        #[command(flatten)]
        plan: PlanArgs,

        /// Output file; stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    /// Request JSON file, or `-` for stdin.
    #[arg(short, long, default_value = "-")]
    pub request: String,

    /// Enumeration budget in milliseconds.
    #[arg(long)]
    pub budget_ms: Option<u64>,

    /// Maximum plates kept.
    #[arg(long)]
    pub cap: Option<usize>,

    /// Brute-force worker threads.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Candidate count above which the ILP strategy is tried first.
    #[arg(long)]
    pub ilp_threshold: Option<usize>,

    /// External ranking program, given the request on stdin.
    #[arg(long)]
    pub ranker_command: Option<String>,

    /// Ranker timeout in milliseconds.
    #[arg(long)]
    pub ranker_timeout_ms: Option<u64>,
}

impl Cli {
    /// Fold global flags into `config`.
    pub fn apply_to(&self, config: &mut PlannerConfig) {
        if let Some(menu) = &self.menu {
            config.menu.source = menu.clone();
        }
        if let Some(sections) = &self.sections_file {
            config.menu.sections = Some(sections.clone());
        }
    }
}

impl PlanArgs {
    /// Fold per-request flags into `config`.
    pub fn apply_to(&self, config: &mut PlannerConfig) {
        if let Some(v) = self.budget_ms {
            config.search.time_budget_ms = v;
        }
        if let Some(v) = self.cap {
            config.search.feasible_cap = v;
        }
        if let Some(v) = self.workers {
            config.search.workers = Some(v);
        }
        if let Some(v) = self.ilp_threshold {
            config.search.ilp_threshold = v;
        }
        if let Some(v) = &self.ranker_command {
            config.ranker.command = Some(v.clone());
        }
        if let Some(v) = self.ranker_timeout_ms {
            config.ranker.timeout_ms = v;
        }
    }
}
