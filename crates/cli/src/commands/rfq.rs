use std::path::PathBuf;

use clap::Args;
use concierge_agent::conversation::format_rfq_reply;
use concierge_agent::rfq::{RfqDrafter, RfqError};
use concierge_core::config::LoadOptions;
use concierge_core::domain::factory::FactoryId;

use crate::commands::{
    llm_client, load_catalog_for, load_config, read_requirement, runtime, CommandResult,
    EXIT_INPUT, EXIT_LLM,
};

const COMMAND: &str = "rfq";

#[derive(Debug, Clone, Args)]
pub struct RfqArgs {
    #[arg(long, help = "Factory name (loose match) or catalog id")]
    pub factory: String,
    #[arg(long, help = "Path to a requirement JSON file")]
    pub requirement: PathBuf,
    #[arg(long, help = "Catalog JSON file to use instead of the configured one")]
    pub catalog: Option<PathBuf>,
}

pub fn run(args: &RfqArgs, mut options: LoadOptions) -> CommandResult {
    if let Some(path) = &args.catalog {
        options.overrides.catalog_path = Some(path.clone());
    }

    let config = match load_config(COMMAND, options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let client = match llm_client(COMMAND, &config) {
        Ok(client) => client,
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

    let factory = catalog
        .find(&FactoryId(args.factory.trim().to_string()))
        .or_else(|| catalog.find_by_name(&args.factory));
    let Some(factory) = factory else {
        return CommandResult::failure(
            COMMAND,
            "unknown_factory",
            format!("factory `{}` is not in the catalog", args.factory.trim()),
            EXIT_INPUT,
        );
    };

    let drafter = match RfqDrafter::new(client) {
        Ok(drafter) => drafter,
        Err(error) => return CommandResult::failure(COMMAND, "rfq_template", error.to_string(), 1),
    };
    let runtime = match runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    match runtime.block_on(drafter.draft(factory, &requirement)) {
        Ok(draft) => CommandResult::output(format_rfq_reply(&draft)),
        Err(RfqError::Template(message)) => {
            CommandResult::failure(COMMAND, "rfq_template", message, 1)
        }
        Err(RfqError::Llm(error)) => {
            CommandResult::failure(COMMAND, "llm_request", error.to_string(), EXIT_LLM)
        }
    }
}
