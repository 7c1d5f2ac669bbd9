pub mod commands;
pub mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use concierge_core::config::{AppConfig, LoadOptions};

use crate::commands::{catalog, chat, recommend, rfq, score};

#[derive(Debug, Parser)]
#[command(
    name = "concierge",
    about = "Factory concierge operator CLI",
    long_about = "Match buyer requirements against the factory catalog, draft RFQ emails, \
                  chat with the concierge, and inspect configuration readiness.",
    after_help = "Examples:\n  concierge recommend --requirement req.json --limit 5\n  \
                  concierge score --factory F001 --requirement req.json\n  \
                  concierge doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a concierge.toml config file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Rank catalog factories for a requirement JSON file")]
    Recommend(recommend::RecommendArgs),
    #[command(about = "Score one factory against a requirement JSON file")]
    Score(score::ScoreArgs),
    #[command(about = "Validate and list the factory catalog")]
    Catalog(catalog::CatalogArgs),
    #[command(about = "Draft an RFQ email for a factory (requires LLM credentials)")]
    Rfq(rfq::RfqArgs),
    #[command(about = "Start an interactive concierge chat on stdin/stdout")]
    Chat(chat::ChatArgs),
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, catalog, and LLM credential readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = LoadOptions { config_path: cli.config.clone(), ..LoadOptions::default() };

    if let Ok(config) = AppConfig::load(options.clone()) {
        logging::init_logging(&config.logging);
    }

    let result = match cli.command {
        Command::Recommend(args) => recommend::run(&args, options),
        Command::Score(args) => score::run(&args, options),
        Command::Catalog(args) => catalog::run(&args, options),
        Command::Rfq(args) => rfq::run(&args, options),
        Command::Chat(args) => chat::run(&args, options),
        Command::Config => commands::config::run(options),
        Command::Doctor { json } => commands::doctor::run(json, options),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
