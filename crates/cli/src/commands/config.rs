use std::env;
use std::fs;
use std::path::Path;

use basketry_core::config::{interpolate_env_vars, resolve_config_path, AppConfig, LoadOptions};
use serde::Serialize;
use toml::Value;

use crate::commands::{to_data, CommandResult};

#[derive(Debug, Serialize)]
struct ConfigEntry {
    key: &'static str,
    value: String,
    source: String,
}

pub fn run(options: LoadOptions) -> CommandResult {
    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let level_overridden = options.overrides.log_level.is_some();
    let format_overridden = options.overrides.log_format.is_some();
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return CommandResult::from_error("config", &error.into()),
    };
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let fields: [(&'static str, String, &[&str], bool); 9] = [
        (
            "mining.min_support",
            config.mining.min_support.to_string(),
            &["BASKETRY_MINING_MIN_SUPPORT"],
            false,
        ),
        (
            "mining.min_confidence",
            config.mining.min_confidence.to_string(),
            &["BASKETRY_MINING_MIN_CONFIDENCE"],
            false,
        ),
        (
            "mining.parallel_threshold",
            config.mining.parallel_threshold.to_string(),
            &["BASKETRY_MINING_PARALLEL_THRESHOLD"],
            false,
        ),
        (
            "matrix.max_items",
            config.matrix.max_items.to_string(),
            &["BASKETRY_MATRIX_MAX_ITEMS"],
            false,
        ),
        (
            "matrix.weighting",
            config.matrix.weighting.as_str().to_string(),
            &["BASKETRY_MATRIX_WEIGHTING"],
            false,
        ),
        (
            "insights.max_insights",
            config.insights.max_insights.to_string(),
            &["BASKETRY_INSIGHTS_MAX_INSIGHTS"],
            false,
        ),
        (
            "insights.high_confidence",
            config.insights.high_confidence.to_string(),
            &["BASKETRY_INSIGHTS_HIGH_CONFIDENCE"],
            false,
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            &["BASKETRY_LOGGING_LEVEL", "BASKETRY_LOG_LEVEL"],
            level_overridden,
        ),
        (
            "logging.format",
            config.logging.format.as_str().to_string(),
            &["BASKETRY_LOGGING_FORMAT", "BASKETRY_LOG_FORMAT"],
            format_overridden,
        ),
    ];

    let entries: Vec<ConfigEntry> = fields
        .into_iter()
        .map(|(key, value, env_keys, overridden)| ConfigEntry {
            key,
            value,
            source: field_source(
                key,
                overridden,
                env_keys,
                config_file_doc.as_ref(),
                config_file_path.as_deref(),
            ),
        })
        .collect();

    match to_data("config", &entries) {
        Ok(data) => CommandResult::success(
            "config",
            "effective config (source precedence: override > env > file > default)",
            data,
        ),
        Err(failure) => failure,
    }
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    let interpolated = interpolate_env_vars(&raw).ok()?;
    interpolated.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    overridden: bool,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if overridden {
        return "override".to_string();
    }

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
