use crate::error::EngineError;
use configuration::{load_pipeline, PipelineConfig};
use core_types::Datasets;
use features::{compute_all_features, AggregationRegistry, CustomFunctionTable, FeatureError};
use polars::prelude::DataFrame;
use ranking::ProfilePlan;
use scoring::ScorePlan;
use std::path::Path;

/// The three frames produced by a full run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    /// One row per group key, one column per feature.
    pub features: DataFrame,
    /// `features` plus one column per score.
    pub scored: DataFrame,
    /// `scored` plus `score_<profile>` and `rank_<profile>` per profile.
    pub ranked: DataFrame,
}

/// A validated pipeline definition, ready to run against any number of
/// dataset collections.
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    registry: AggregationRegistry,
    scores: ScorePlan,
    profiles: ProfilePlan,
}

impl Pipeline {
    /// Builds and validates every stage. Nothing here reads data, so a bad
    /// definition is rejected before any dataset is loaded.
    pub fn new(config: PipelineConfig, functions: CustomFunctionTable) -> Result<Self, EngineError> {
        let section = config.feature.as_ref().ok_or(FeatureError::MissingSection)?;
        let registry = AggregationRegistry::from_config(section, functions)?;
        let scores = ScorePlan::new(&config.score)?;
        let profiles = ProfilePlan::new(&config.profile)?;

        let mut known: Vec<&str> = registry.feature_names().collect();
        for step in scores.steps() {
            if !known.contains(&step.feature.as_str()) {
                return Err(EngineError::UnknownScoreFeature {
                    score: step.name.clone(),
                    feature: step.feature.clone(),
                });
            }
            known.push(&step.name);
        }
        for profile in profiles.profiles() {
            if let Some((score, _)) = profile
                .weights
                .iter()
                .find(|(score, _)| !known.contains(&score.as_str()))
            {
                return Err(EngineError::UnknownScore {
                    profile: profile.name.clone(),
                    score: score.clone(),
                });
            }
        }

        tracing::info!(
            datasets = registry.datasets().len(),
            features = registry.feature_names().count(),
            scores = scores.steps().len(),
            profiles = profiles.profiles().len(),
            "Pipeline validated"
        );
        Ok(Self {
            config,
            registry,
            scores,
            profiles,
        })
    }

    /// Loads a pipeline YAML file with the default custom functions.
    pub fn from_path(path: &Path) -> Result<Self, EngineError> {
        let config = load_pipeline(path)?;
        Self::new(config, CustomFunctionTable::with_defaults())
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn registry(&self) -> &AggregationRegistry {
        &self.registry
    }

    /// Names of the datasets the feature registry reads, in declaration order.
    pub fn dataset_names(&self) -> impl Iterator<Item = &str> {
        self.registry.datasets().iter().map(|d| d.name.as_str())
    }

    pub fn features(&self, datasets: &Datasets) -> Result<DataFrame, EngineError> {
        Ok(compute_all_features(datasets, &self.config, &self.registry)?)
    }

    pub fn score(&self, features: &DataFrame) -> Result<DataFrame, EngineError> {
        Ok(self.scores.apply(features)?)
    }

    pub fn rank(&self, scored: &DataFrame) -> Result<DataFrame, EngineError> {
        Ok(self.profiles.apply(scored)?)
    }

    /// Runs features, then scores, then profile ranks.
    pub fn run(&self, datasets: &Datasets) -> Result<PipelineOutput, EngineError> {
        let features = self.features(datasets)?;
        let scored = self.score(&features)?;
        let ranked = self.rank(&scored)?;

        tracing::info!(
            rows = ranked.height(),
            columns = ranked.width(),
            "Pipeline run complete"
        );
        Ok(PipelineOutput {
            features,
            scored,
            ranked,
        })
    }
}
