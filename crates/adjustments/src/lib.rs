//! # Fundrank Adjustments
//!
//! Named, pure post-processing transforms applied to feature and score
//! values. Every adjustment is a total function `Option<f64> -> Option<f64>`:
//! it never panics, and a non-finite intermediate becomes missing.
//!
//! Names are resolved once, when a pipeline is loaded, into an
//! [`AdjustmentChain`]; an unknown name is a configuration error long before
//! any row is touched.

pub mod chain;
pub mod error;

pub use chain::{Adjustment, AdjustmentChain};
pub use error::AdjustmentError;
