//! # Fundrank Engine
//!
//! The orchestrator crate. A [`Pipeline`] owns a validated pipeline
//! definition and runs the three stages in order:
//!
//! 1. **Features:** raw dataset rows are aggregated per group key.
//! 2. **Scores:** features are normalized into comparable score columns.
//! 3. **Profiles:** scores are combined per investor profile and ranked.
//!
//! ## Architectural Principles
//!
//! - **Fail before reading:** [`Pipeline::new`] checks every recipe, score
//!   and profile weight, including cross-stage references, so a bad
//!   definition never touches data.
//! - **No I/O:** loading and writing frames belongs to the caller; the
//!   engine only maps frames to frames.
//!
//! ## Public API
//!
//! - [`Pipeline`], [`PipelineOutput`].
//! - [`EngineError`], with [`EngineError::is_config_validation`] to tell
//!   definition errors from data errors.

pub mod error;
pub mod pipeline;

pub use error::EngineError;
pub use pipeline::{Pipeline, PipelineOutput};
