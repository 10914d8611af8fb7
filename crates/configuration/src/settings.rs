use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variables with this prefix override file settings,
/// e.g. `FUNDRANK_DATA_DIR=/mnt/cvm`.
pub const ENV_PREFIX: &str = "FUNDRANK";

/// Settings file looked up in the working directory when none is given.
pub const DEFAULT_SETTINGS_FILE: &str = "fundrank";

/// Application-level settings: where data lives and how the CLI behaves.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Root of the partitioned datasets (`<data_dir>/<dataset>/period=<p>/data.*`).
    pub data_dir: PathBuf,
    /// Where result tables are written when no explicit output is given.
    pub output_dir: PathBuf,
    /// The pipeline YAML used when `--config` is omitted.
    pub pipeline_path: PathBuf,
    /// `tracing` filter used when `RUST_LOG` is not set.
    pub log_filter: String,
    pub output_format: OutputFormat,
}

/// The on-disk format of result tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Parquet,
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Parquet => "parquet",
            OutputFormat::Csv => "csv",
        }
    }
}

impl Settings {
    /// Default output path for a stage, e.g. `data/output/features.parquet`.
    pub fn output_path(&self, stem: &str) -> PathBuf {
        self.output_dir
            .join(format!("{stem}.{}", self.output_format.extension()))
    }
}

/// Loads the application settings.
///
/// Sources, lowest priority first: built-in defaults, the settings file
/// (`path`, or an optional `fundrank.toml` in the working directory), then
/// `FUNDRANK_*` environment variables.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let file = match path {
        Some(p) => config::File::from(p).required(true),
        None => config::File::with_name(DEFAULT_SETTINGS_FILE).required(false),
    };

    let builder = config::Config::builder()
        .set_default("data_dir", "data")?
        .set_default("output_dir", "data/output")?
        .set_default("pipeline_path", "pipeline.yaml")?
        .set_default("log_filter", "info")?
        .set_default("output_format", "parquet")?
        .add_source(file)
        .add_source(config::Environment::with_prefix(ENV_PREFIX))
        .build()?;

    let settings = builder.try_deserialize::<Settings>()?;
    if settings.log_filter.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "log_filter must not be empty".to_string(),
        ));
    }
    Ok(settings)
}
