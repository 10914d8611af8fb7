//! # Fundrank Scoring
//!
//! The Score Engine: normalizes feature columns into comparable score
//! columns. Each score reads one feature, normalizes it (optionally per
//! partition, e.g. per `competencia`), applies its adjustment chain and is
//! appended to a copy of the frame. NaN and infinite feature values are
//! missing values, never part of a partition's statistics.
//!
//! ## Public API
//!
//! - [`compute_scores_from_yaml`], [`compute_scores`]: one-shot entry points.
//! - [`ScorePlan`]: a resolved `score` section that can be validated
//!   against the configuration alone and reused across tables.
//! - [`Normalization`]: `zscore`, `minmax` and `percentile`.

pub mod error;
pub mod normalize;
pub mod scorer;

pub use error::ScoreError;
pub use normalize::Normalization;
pub use scorer::{compute_scores, compute_scores_from_yaml, ScorePlan, ScoreStep};
