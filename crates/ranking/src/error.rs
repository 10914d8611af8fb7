use core_types::CoreError;
use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RankError {
    #[error("Profile '{profile}' weights unknown score column '{score}'")]
    UnknownScore { profile: String, score: String },

    #[error("Profile '{profile}' weights column '{score}', which is not numeric: {reason}")]
    NonNumericScore {
        profile: String,
        score: String,
        reason: String,
    },

    #[error("Profile '{profile}' has a non-finite weight for '{score}'")]
    InvalidWeight { profile: String, score: String },

    #[error("Profile '{0}' has no weights")]
    EmptyProfile(String),

    #[error("Profile '{profile}' would overwrite existing column '{column}'")]
    DuplicateColumn { profile: String, column: String },

    #[error("Frame has no rank column for profile '{profile}' (expected '{column}')")]
    NotRanked { profile: String, column: String },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

impl RankError {
    /// True for errors caused by the profile definitions rather than the data.
    pub fn is_config_validation(&self) -> bool {
        matches!(
            self,
            RankError::UnknownScore { .. }
                | RankError::InvalidWeight { .. }
                | RankError::EmptyProfile(_)
                | RankError::DuplicateColumn { .. }
        )
    }
}
