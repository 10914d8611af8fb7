use configuration::ConfigError;
use features::FeatureError;
use ranking::RankError;
use scoring::ScoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Feature error: {0}")]
    Feature(#[from] FeatureError),

    #[error("Score error: {0}")]
    Score(#[from] ScoreError),

    #[error("Ranking error: {0}")]
    Rank(#[from] RankError),

    #[error("Score '{score}' reads '{feature}', which is neither a declared feature nor an earlier score")]
    UnknownScoreFeature { score: String, feature: String },

    #[error("Profile '{profile}' weights '{score}', which is neither a declared score nor a feature")]
    UnknownScore { profile: String, score: String },
}

impl EngineError {
    /// True when the pipeline definition itself is invalid, regardless of
    /// the data it would run on.
    pub fn is_config_validation(&self) -> bool {
        match self {
            EngineError::Configuration(_)
            | EngineError::UnknownScoreFeature { .. }
            | EngineError::UnknownScore { .. } => true,
            EngineError::Feature(e) => e.is_config_validation(),
            EngineError::Score(e) => e.is_config_validation(),
            EngineError::Rank(e) => e.is_config_validation(),
        }
    }
}
