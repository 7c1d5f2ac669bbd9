use std::env;
use std::fs;
use std::path::Path;

use concierge_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

use crate::commands::{load_config, CommandResult};

const COMMAND: &str = "config";

pub fn run(options: LoadOptions) -> CommandResult {
    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let config = match load_config(COMMAND, options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines =
        vec!["effective config (source precedence: flag > env > file > default):".to_string()];

    for (key_path, value, env_keys) in effective_values(&config) {
        lines.push(render_line(key_path, &value, source(key_path, env_keys)));
    }

    CommandResult::output(lines.join("\n"))
}

type EffectiveValue = (&'static str, String, &'static [&'static str]);

fn effective_values(config: &AppConfig) -> [EffectiveValue; 10] {
    let catalog_path = config
        .catalog
        .path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<bundled>".to_string());
    let llm_api_key = if config.llm.api_key.is_some() { "<redacted>" } else { "<unset>" };

    [
        ("catalog.path", catalog_path, &["CONCIERGE_CATALOG_PATH"]),
        (
            "catalog.default_limit",
            config.catalog.default_limit.to_string(),
            &["CONCIERGE_CATALOG_DEFAULT_LIMIT"],
        ),
        ("llm.provider", format!("{:?}", config.llm.provider), &["CONCIERGE_LLM_PROVIDER"]),
        ("llm.model", config.llm.model.clone(), &["CONCIERGE_LLM_MODEL"]),
        (
            "llm.base_url",
            config.llm.base_url.clone().unwrap_or_else(|| {
                format!("<unset> (using {})", config.llm.provider.default_base_url())
            }),
            &["CONCIERGE_LLM_BASE_URL"],
        ),
        ("llm.api_key", llm_api_key.to_string(), &["CONCIERGE_LLM_API_KEY", "OPENAI_API_KEY"]),
        (
            "llm.timeout_secs",
            config.llm.timeout_secs.to_string(),
            &["CONCIERGE_LLM_TIMEOUT_SECS"],
        ),
        ("llm.max_retries", config.llm.max_retries.to_string(), &["CONCIERGE_LLM_MAX_RETRIES"]),
        (
            "logging.level",
            config.logging.level.clone(),
            &["CONCIERGE_LOGGING_LEVEL", "CONCIERGE_LOG_LEVEL"],
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format),
            &["CONCIERGE_LOGGING_FORMAT", "CONCIERGE_LOG_FORMAT"],
        ),
    ]
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

#[cfg(test)]
mod tests {
    use super::contains_path;

    #[test]
    fn dotted_paths_resolve_inside_tables() {
        let doc: toml::Value = "[llm]\nmodel = \"gpt-4o-mini\"\n".parse().expect("valid toml");

        assert!(contains_path(&doc, "llm.model"));
        assert!(!contains_path(&doc, "llm.api_key"));
        assert!(!contains_path(&doc, "catalog.path"));
    }
}
