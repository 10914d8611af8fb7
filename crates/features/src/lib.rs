//! # Fundrank Features
//!
//! Turns raw holdings rows into a Feature Table: one row per group key
//! (fund, period, ...) and one column per declared feature.
//!
//! ## Architectural Principles
//!
//! - **Declarative:** every feature is a YAML recipe (`method`, `args`,
//!   `adjustment`). Adding a feature never needs a code change unless it
//!   needs a new custom function.
//! - **Validate first:** [`AggregationRegistry::from_config`] resolves every
//!   method, argument list and adjustment before any row is read.
//! - **Extensible:** custom aggregations implement [`CustomAggregation`] and
//!   are registered by name in a [`CustomFunctionTable`].
//! - **Columnar:** built-in reducers run as one polars `group_by` per
//!   dataset; custom aggregations see each group as its own `DataFrame`.
//! - **Deterministic:** custom groups are aggregated in parallel, and every
//!   frame is emitted sorted by key.
//!
//! ## Public API
//!
//! - [`compute_all_features`] / [`compute_features`]: the Feature Engine.
//! - [`AggregationRegistry`], [`Method`], [`Reducer`]: recipe resolution.
//! - [`CustomAggregation`], [`CustomFunctionTable`], [`GroupView`]: the
//!   extension point, with the default holdings functions in [`holdings`].

pub mod custom;
pub mod engine;
pub mod error;
pub mod group;
pub mod holdings;
pub mod reducer;
pub mod registry;

pub use custom::{CustomAggregation, CustomFunctionTable};
pub use engine::{compute_all_features, compute_features};
pub use error::FeatureError;
pub use group::GroupView;
pub use reducer::Reducer;
pub use registry::{AggregationRegistry, DatasetRecipes, Method, ResolvedRecipe};
