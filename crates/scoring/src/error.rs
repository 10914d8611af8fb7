use adjustments::AdjustmentError;
use core_types::CoreError;
use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoreError {
    #[error("Score '{score}' reads feature '{feature}', which is not in the table")]
    MissingFeature { score: String, feature: String },

    #[error("Score '{score}' reads feature '{feature}', which is not numeric: {reason}")]
    NonNumericFeature {
        score: String,
        feature: String,
        reason: String,
    },

    #[error("Score '{score}' groups by '{column}', which is not in the table")]
    MissingGroupColumn { score: String, column: String },

    #[error("Score '{score}' has unsupported type '{kind}' (expected zscore, minmax or percentile)")]
    UnsupportedType { score: String, kind: String },

    #[error("Score '{score}' would overwrite existing column '{score}'")]
    DuplicateColumn { score: String },

    #[error("Invalid adjustment for score '{score}': {source}")]
    Adjustment {
        score: String,
        #[source]
        source: AdjustmentError,
    },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

impl ScoreError {
    /// True for errors caused by the score definitions rather than the data.
    pub fn is_config_validation(&self) -> bool {
        matches!(
            self,
            ScoreError::UnsupportedType { .. }
                | ScoreError::DuplicateColumn { .. }
                | ScoreError::Adjustment { .. }
        )
    }
}
