//! # Fundrank Ranking
//!
//! The Profile Ranker: combines score columns into one weighted score per
//! investor profile and ranks funds by it.
//!
//! ## Architectural Principles
//!
//! - **No silent imputation:** a missing score makes the profile's weighted
//!   sum missing. Fill upstream (e.g. a `coalesce` adjustment) if that is
//!   not wanted.
//! - **Dense ranking:** ties share a rank and never leave gaps. Rows without
//!   a weighted sum get the sentinel rank 0.
//!
//! ## Public API
//!
//! - [`compute_profile_scores_from_df`], [`compute_profile_scores_from_yaml`].
//! - [`ProfilePlan`]: a checked `profile` section.
//! - [`dense_rank`].
//! - [`top_funds`]: the best-ranked funds of one profile.

pub mod error;
pub mod profile;
pub mod rank;
pub mod top;

pub use error::RankError;
pub use profile::{
    compute_profile_scores_from_df, compute_profile_scores_from_yaml, ProfilePlan, ProfileStep,
};
pub use rank::dense_rank;
pub use top::top_funds;
