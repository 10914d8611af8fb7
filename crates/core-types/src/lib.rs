//! # Fundrank Core Types
//!
//! The shared tabular helpers used by every stage of the ranking pipeline.
//! Data travels between stages as a polars [`DataFrame`](polars::prelude::DataFrame).
//!
//! ## Architectural Principles
//!
//! - **Nullable by construction:** a null cell is the one and only "missing"
//!   marker. NaN and infinities are turned into nulls with [`finite`].
//! - **Immutable stages:** stages take `&DataFrame` and return a new frame.
//! - **Deterministic grouping:** [`partition_groups`] yields groups sorted by key.
//!
//! ## Public API
//!
//! - [`to_numeric`], [`numeric_cells`], [`finite`], [`to_text`]: reading
//!   cells of any column type as numbers or text.
//! - [`Datasets`], [`stack_frames`], [`text_columns`]: named input frames.
//! - [`GroupKey`], [`Group`], [`partition_groups`]: group-by support.
//! - [`CoreError`]: a bad cell, or an error raised by polars.

pub mod column;
pub mod error;
pub mod frame;
pub mod group;

// Re-export the core types to provide a clean public API.
pub use column::{finite, numeric_cells, to_numeric, to_text, NumericCell};
pub use error::CoreError;
pub use frame::{has_column, stack_frames, text_columns, Datasets};
pub use group::{partition_groups, Group, GroupKey};
