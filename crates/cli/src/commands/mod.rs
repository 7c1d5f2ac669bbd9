pub mod catalog;
pub mod chat;
pub mod config;
pub mod doctor;
pub mod recommend;
pub mod rfq;
pub mod score;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use concierge_agent::llm::{HttpLlmClient, LlmClient};
use concierge_core::catalog::{load_catalog, Catalog};
use concierge_core::config::{AppConfig, LoadOptions};
use concierge_core::domain::requirement::Requirement;
use concierge_core::errors::ApplicationError;
use serde::Serialize;
use tracing::info;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_RUNTIME_INIT: u8 = 3;
pub const EXIT_CATALOG: u8 = 4;
pub const EXIT_INPUT: u8 = 5;
pub const EXIT_LLM: u8 = 6;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Successful command whose output is already formatted.
    pub fn output(output: impl Into<String>) -> Self {
        Self { exit_code: 0, output: output.into() }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

fn to_json<T: Serialize>(command: &str, value: &T) -> CommandResult {
    match serde_json::to_string_pretty(value) {
        Ok(output) => CommandResult::output(output),
        Err(error) => CommandResult::failure(command, "serialization", error.to_string(), 1),
    }
}

fn load_config(command: &str, options: LoadOptions) -> Result<AppConfig, CommandResult> {
    AppConfig::load(options).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            EXIT_CONFIG,
        )
    })
}

fn load_catalog_for(command: &str, config: &AppConfig) -> Result<Catalog, CommandResult> {
    let source = config.catalog.source();
    let catalog = load_catalog(&source).map_err(|error| {
        let error = ApplicationError::from(error);
        CommandResult::failure(command, "catalog_load", error.to_string(), EXIT_CATALOG)
    })?;

    info!(
        event_name = "catalog.load.completed",
        correlation_id = %command,
        source = %source.describe(),
        factories = catalog.len(),
        "factory catalog loaded"
    );
    Ok(catalog)
}

fn read_requirement(command: &str, path: &Path) -> Result<Requirement, CommandResult> {
    let raw = fs::read_to_string(path).map_err(|error| {
        CommandResult::failure(
            command,
            "invalid_input",
            format!("could not read requirement file `{}`: {error}", path.display()),
            EXIT_INPUT,
        )
    })?;

    Requirement::from_json(&raw).map_err(|error| {
        CommandResult::failure(command, "invalid_input", error.to_string(), EXIT_INPUT)
    })
}

fn llm_client(command: &str, config: &AppConfig) -> Result<Arc<dyn LlmClient>, CommandResult> {
    config.llm.require_credentials().map_err(|error| {
        CommandResult::failure(command, "llm_credentials", error.to_string(), EXIT_CONFIG)
    })?;

    let client = HttpLlmClient::from_config(&config.llm).map_err(|error| {
        CommandResult::failure(command, "llm_client", error.to_string(), EXIT_LLM)
    })?;
    Ok(Arc::new(client))
}

fn runtime(command: &str) -> Result<tokio::runtime::Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            EXIT_RUNTIME_INIT,
        )
    })
}
