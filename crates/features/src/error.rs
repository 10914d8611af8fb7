use adjustments::AdjustmentError;
use core_types::CoreError;
use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("Pipeline configuration has no `feature` section")]
    MissingSection,

    #[error("`feature.group_keys` must name at least one column")]
    EmptyGroupKeys,

    #[error("No recipe registered for feature '{feature}' of dataset '{dataset}'")]
    UnknownFeature { dataset: String, feature: String },

    #[error("Unknown aggregation method '{0}'")]
    UnknownMethod(String),

    #[error("Invalid arguments for method '{method}': {reason}")]
    InvalidArguments { method: String, reason: String },

    #[error(transparent)]
    Adjustment(#[from] AdjustmentError),

    #[error("Invalid recipe for feature '{feature}' of dataset '{dataset}': {source}")]
    InvalidRecipe {
        dataset: String,
        feature: String,
        #[source]
        source: Box<FeatureError>,
    },

    #[error("Feature '{feature}' is declared by both '{first}' and '{second}'")]
    DuplicateFeature {
        feature: String,
        first: String,
        second: String,
    },

    #[error("Feature '{0}' has the same name as a group key column")]
    FeatureShadowsGroupKey(String),

    #[error("Dataset '{dataset}' has no group key column '{column}'")]
    MissingGroupKey { dataset: String, column: String },

    #[error("Feature '{feature}' needs column '{column}' which dataset '{dataset}' does not have")]
    MissingSourceColumn {
        dataset: String,
        feature: String,
        column: String,
    },

    #[error("Failed to compute feature '{feature}' of dataset '{dataset}' for group {group}: {reason}")]
    Computation {
        dataset: String,
        feature: String,
        group: String,
        reason: String,
    },

    #[error("No features were computed; check the feature registry and the input datasets")]
    NoFeatures,

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

impl FeatureError {
    /// True for errors caused by the pipeline configuration itself rather
    /// than by the data it was applied to.
    pub fn is_config_validation(&self) -> bool {
        matches!(
            self,
            FeatureError::MissingSection
                | FeatureError::EmptyGroupKeys
                | FeatureError::UnknownFeature { .. }
                | FeatureError::UnknownMethod(_)
                | FeatureError::InvalidArguments { .. }
                | FeatureError::Adjustment(_)
                | FeatureError::InvalidRecipe { .. }
                | FeatureError::DuplicateFeature { .. }
                | FeatureError::FeatureShadowsGroupKey(_)
        )
    }
}
