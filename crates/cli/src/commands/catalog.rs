use std::path::PathBuf;

use clap::Args;
use concierge_core::config::LoadOptions;

use crate::commands::{load_catalog_for, load_config, to_json, CommandResult};

const COMMAND: &str = "catalog";

#[derive(Debug, Clone, Args)]
pub struct CatalogArgs {
    #[arg(long, help = "Catalog JSON file to validate instead of the configured one")]
    pub catalog: Option<PathBuf>,
    #[arg(long, help = "Emit machine-readable JSON output")]
    pub json: bool,
}

pub fn run(args: &CatalogArgs, mut options: LoadOptions) -> CommandResult {
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

    if args.json {
        return to_json(COMMAND, &catalog.factories());
    }

    let mut lines = vec![format!(
        "catalog: {} factories from {}",
        catalog.len(),
        config.catalog.source().describe()
    )];
    for factory in &catalog {
        lines.push(format!(
            "- {} {} ({}) | makes: {} | moq_min: {} | cost tier: {}",
            factory.id,
            factory.name,
            factory.geography,
            factory.product_types.join(", "),
            factory.moq_min,
            factory.cost_tier
        ));
    }

    CommandResult::output(lines.join("\n"))
}
