use std::path::PathBuf;

use clap::Args;
use concierge_core::config::LoadOptions;
use concierge_core::matching::{
    render_recommendations, MatchEngine, MatchResult, RubricMatchEngine,
};
use serde::Serialize;
use tracing::info;

use crate::commands::{load_catalog_for, load_config, read_requirement, to_json, CommandResult};

const COMMAND: &str = "recommend";

#[derive(Debug, Clone, Args)]
pub struct RecommendArgs {
    #[arg(long, help = "Path to a requirement JSON file")]
    pub requirement: PathBuf,
    #[arg(long, help = "Maximum number of matches (defaults to catalog.default_limit)")]
    pub limit: Option<usize>,
    #[arg(long, help = "Catalog JSON file to use instead of the configured one")]
    pub catalog: Option<PathBuf>,
    #[arg(long, help = "Emit machine-readable JSON output")]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct RecommendReport<'a> {
    command: &'static str,
    limit: usize,
    candidates: usize,
    matches: &'a [MatchResult],
}

pub fn run(args: &RecommendArgs, mut options: LoadOptions) -> CommandResult {
    if let Some(path) = &args.catalog {
        options.overrides.catalog_path = Some(path.clone());
    }

    let config = match load_config(COMMAND, options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let catalog = match load_catalog_for(COMMAND, &config) {
        Ok(catalog) => catalog,
        Err(failure) => return failure,
    };
    let requirement = match read_requirement(COMMAND, &args.requirement) {
        Ok(requirement) => requirement,
        Err(failure) => return failure,
    };

    let limit = args.limit.unwrap_or(config.catalog.default_limit);
    let matches = RubricMatchEngine::new().recommend(&requirement, catalog.factories(), limit);

    info!(
        event_name = "matching.recommend.completed",
        correlation_id = COMMAND,
        candidates = catalog.len(),
        matches = matches.len(),
        limit,
        "catalog ranked for requirement"
    );

    if args.json {
        let report = RecommendReport {
            command: COMMAND,
            limit,
            candidates: catalog.len(),
            matches: &matches,
        };
        return to_json(COMMAND, &report);
    }

    CommandResult::output(render_recommendations(&matches))
}
