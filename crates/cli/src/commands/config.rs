use std::fs;
use std::path::Path;

use rebate_core::config::{read_env, resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

use crate::commands::CommandResult;

struct Field<'a> {
    key_path: &'static str,
    env_keys: &'static [&'static str],
    value: &'a str,
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let max_connections = config.database.max_connections.to_string();
    let timeout_secs = config.database.timeout_secs.to_string();
    let reject_negative_inputs = config.calculation.reject_negative_inputs.to_string();
    let log_format = format!("{:?}", config.logging.format);

    let fields = [
        Field {
            key_path: "database.url",
            env_keys: &["REBATE_DATABASE_URL"],
            value: &config.database.url,
        },
        Field {
            key_path: "database.max_connections",
            env_keys: &["REBATE_DATABASE_MAX_CONNECTIONS"],
            value: &max_connections,
        },
        Field {
            key_path: "database.timeout_secs",
            env_keys: &["REBATE_DATABASE_TIMEOUT_SECS"],
            value: &timeout_secs,
        },
        Field {
            key_path: "calculation.reject_negative_inputs",
            env_keys: &["REBATE_CALCULATION_REJECT_NEGATIVE_INPUTS"],
            value: &reject_negative_inputs,
        },
        Field {
            key_path: "logging.level",
            env_keys: &["REBATE_LOGGING_LEVEL", "REBATE_LOG_LEVEL"],
            value: &config.logging.level,
        },
        Field {
            key_path: "logging.format",
            env_keys: &["REBATE_LOGGING_FORMAT", "REBATE_LOG_FORMAT"],
            value: &log_format,
        },
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(fields.iter().map(|field| {
        render_line(
            field.key_path,
            field.value,
            field_source(
                field.key_path,
                field.env_keys,
                config_file_doc.as_ref(),
                config_file_path.as_deref(),
            ),
        )
    }));

    CommandResult::success("config", lines.join("\n"))
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
    if let Some(env_key) = env_keys.iter().find(|key| read_env(key).is_some()) {
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
