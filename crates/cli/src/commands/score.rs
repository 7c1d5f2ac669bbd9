use std::path::PathBuf;

use clap::Args;
use concierge_core::config::LoadOptions;
use concierge_core::domain::factory::FactoryId;
use concierge_core::matching::{MatchEngine, RubricMatchEngine};
use serde::Serialize;

use crate::commands::{
    load_catalog_for, load_config, read_requirement, to_json, CommandResult, EXIT_INPUT,
};

const COMMAND: &str = "score";

#[derive(Debug, Clone, Args)]
pub struct ScoreArgs {
    #[arg(long, help = "Catalog id of the factory to score, e.g. F001")]
    pub factory: String,
    #[arg(long, help = "Path to a requirement JSON file")]
    pub requirement: PathBuf,
    #[arg(long, help = "Catalog JSON file to use instead of the configured one")]
    pub catalog: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ScoreReport<'a> {
    factory_id: &'a FactoryId,
    factory_name: &'a str,
    score: u32,
    reasons: Vec<String>,
}

pub fn run(args: &ScoreArgs, mut options: LoadOptions) -> CommandResult {
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

    let factory_id = FactoryId(args.factory.trim().to_string());
    let Some(factory) = catalog.find(&factory_id) else {
        return CommandResult::failure(
            COMMAND,
            "unknown_factory",
            format!("factory `{factory_id}` is not in the catalog"),
            EXIT_INPUT,
        );
    };

    let result = RubricMatchEngine::new().score(factory, &requirement);
    to_json(
        COMMAND,
        &ScoreReport {
            factory_id: &factory.id,
            factory_name: &factory.name,
            score: result.score,
            reasons: result.reasons,
        },
    )
}
