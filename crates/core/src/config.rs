use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::insights::{DEFAULT_HIGH_CONFIDENCE, DEFAULT_MAX_INSIGHTS};
use crate::matrix::{MatrixWeighting, DEFAULT_MATRIX_MAX_ITEMS};
use crate::miner::DEFAULT_PARALLEL_THRESHOLD;

pub const DEFAULT_CONFIG_FILE: &str = "basketry.toml";
pub const NESTED_CONFIG_FILE: &str = "config/basketry.toml";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub mining: MiningConfig,
    pub matrix: MatrixConfig,
    pub insights: InsightConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct MiningConfig {
    pub min_support: f64,
    pub min_confidence: f64,
    pub parallel_threshold: usize,
}

#[derive(Clone, Debug)]
pub struct MatrixConfig {
    pub max_items: usize,
    pub weighting: MatrixWeighting,
}

#[derive(Clone, Debug)]
pub struct InsightConfig {
    pub max_insights: usize,
    pub high_confidence: f64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mining: MiningConfig {
                min_support: 0.1,
                min_confidence: 0.3,
                parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            },
            matrix: MatrixConfig {
                max_items: DEFAULT_MATRIX_MAX_ITEMS,
                weighting: MatrixWeighting::default(),
            },
            insights: InsightConfig {
                max_insights: DEFAULT_MAX_INSIGHTS,
                high_confidence: DEFAULT_HIGH_CONFIDENCE,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    /// Resolve the effective configuration: defaults, then the config file,
    /// then `BASKETRY_*` environment variables, then explicit overrides.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file || options.config_path.is_some() {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(mining) = patch.mining {
            if let Some(min_support) = mining.min_support {
                self.mining.min_support = min_support;
            }
            if let Some(min_confidence) = mining.min_confidence {
                self.mining.min_confidence = min_confidence;
            }
            if let Some(parallel_threshold) = mining.parallel_threshold {
                self.mining.parallel_threshold = parallel_threshold;
            }
        }

        if let Some(matrix) = patch.matrix {
            if let Some(max_items) = matrix.max_items {
                self.matrix.max_items = max_items;
            }
            if let Some(weighting) = matrix.weighting {
                self.matrix.weighting = weighting;
            }
        }

        if let Some(insights) = patch.insights {
            if let Some(max_insights) = insights.max_insights {
                self.insights.max_insights = max_insights;
            }
            if let Some(high_confidence) = insights.high_confidence {
                self.insights.high_confidence = high_confidence;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("BASKETRY_MINING_MIN_SUPPORT") {
            self.mining.min_support = parse_f64("BASKETRY_MINING_MIN_SUPPORT", &value)?;
        }
        if let Some(value) = read_env("BASKETRY_MINING_MIN_CONFIDENCE") {
            self.mining.min_confidence = parse_f64("BASKETRY_MINING_MIN_CONFIDENCE", &value)?;
        }
        if let Some(value) = read_env("BASKETRY_MINING_PARALLEL_THRESHOLD") {
            self.mining.parallel_threshold =
                parse_usize("BASKETRY_MINING_PARALLEL_THRESHOLD", &value)?;
        }

        if let Some(value) = read_env("BASKETRY_MATRIX_MAX_ITEMS") {
            self.matrix.max_items = parse_usize("BASKETRY_MATRIX_MAX_ITEMS", &value)?;
        }
        if let Some(value) = read_env("BASKETRY_MATRIX_WEIGHTING") {
            self.matrix.weighting = value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                key: "BASKETRY_MATRIX_WEIGHTING".to_string(),
                value: value.clone(),
            })?;
        }

        if let Some(value) = read_env("BASKETRY_INSIGHTS_MAX_INSIGHTS") {
            self.insights.max_insights = parse_usize("BASKETRY_INSIGHTS_MAX_INSIGHTS", &value)?;
        }
        if let Some(value) = read_env("BASKETRY_INSIGHTS_HIGH_CONFIDENCE") {
            self.insights.high_confidence =
                parse_f64("BASKETRY_INSIGHTS_HIGH_CONFIDENCE", &value)?;
        }

        let log_level =
            read_env("BASKETRY_LOGGING_LEVEL").or_else(|| read_env("BASKETRY_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("BASKETRY_LOGGING_FORMAT").or_else(|| read_env("BASKETRY_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_mining(&self.mining)?;
        validate_matrix(&self.matrix)?;
        validate_insights(&self.insights)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// The config file `load` would pick up for `explicit_path`, if one exists.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from(NESTED_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

/// Replace every `${VAR}` in `input` with the value of that environment variable.
pub fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_mining(mining: &MiningConfig) -> Result<(), ConfigError> {
    if !in_unit_interval(mining.min_support) {
        return Err(ConfigError::Validation(format!(
            "mining.min_support must be in (0,1], got {}",
            mining.min_support
        )));
    }

    if !in_unit_interval(mining.min_confidence) {
        return Err(ConfigError::Validation(format!(
            "mining.min_confidence must be in (0,1], got {}",
            mining.min_confidence
        )));
    }

    if mining.parallel_threshold == 0 {
        return Err(ConfigError::Validation(
            "mining.parallel_threshold must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_matrix(matrix: &MatrixConfig) -> Result<(), ConfigError> {
    if matrix.max_items == 0 {
        return Err(ConfigError::Validation(
            "matrix.max_items must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_insights(insights: &InsightConfig) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&insights.high_confidence) {
        return Err(ConfigError::Validation(
            "insights.high_confidence must be in range 0.0..=1.0".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn in_unit_interval(value: f64) -> bool {
    value > 0.0 && value <= 1.0
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    mining: Option<MiningPatch>,
    matrix: Option<MatrixPatch>,
    insights: Option<InsightPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct MiningPatch {
    min_support: Option<f64>,
    min_confidence: Option<f64>,
    parallel_threshold: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct MatrixPatch {
    max_items: Option<usize>,
    weighting: Option<MatrixWeighting>,
}

#[derive(Debug, Default, Deserialize)]
struct InsightPatch {
    max_insights: Option<usize>,
    high_confidence: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
