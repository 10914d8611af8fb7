//! # Fundrank Configuration
//!
//! Two kinds of configuration live here:
//!
//! - **Pipeline definitions** ([`PipelineConfig`]): the YAML file declaring
//!   features, scores and profiles. Adding a metric is a YAML edit, never a
//!   code change.
//! - **Application settings** ([`Settings`]): directories, the default
//!   pipeline path and the log filter, loaded with the `config` crate from
//!   `fundrank.toml` and `FUNDRANK_*` environment variables.
//!
//! This crate only parses. Semantic validation (does a method exist, does a
//! score reference a declared feature) belongs to the stages that own those
//! concepts.

// Declare the modules that make up this crate.
pub mod error;
pub mod ordered;
pub mod pipeline;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use ordered::OrderedMap;
pub use pipeline::{
    load_pipeline, AdjustmentParam, AdjustmentSpec, FeatureRecipe, FeatureSection,
    PipelineConfig, ProfileSection, ProfileSpec, RecipeArg, ScoreArgs, ScoreSection, ScoreSpec,
};
pub use settings::{load_settings, OutputFormat, Settings};
