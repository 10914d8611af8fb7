use crate::error::RankError;
use crate::rank::dense_rank;
use configuration::{PipelineConfig, ProfileSection};
use core_types::{finite, has_column, to_numeric};
use polars::prelude::*;

/// One investor profile: a linear combination of score columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileStep {
    pub name: String,
    pub weights: Vec<(String, f64)>,
}

impl ProfileStep {
    pub fn score_column(&self) -> String {
        format!("score_{}", self.name)
    }

    pub fn rank_column(&self) -> String {
        format!("rank_{}", self.name)
    }
}

/// A checked `profile` section.
#[derive(Debug, Clone, Default)]
pub struct ProfilePlan {
    profiles: Vec<ProfileStep>,
}

impl ProfilePlan {
    /// Checks the weights themselves; column references are checked against
    /// a table by [`ProfilePlan::validate`].
    pub fn new(section: &ProfileSection) -> Result<Self, RankError> {
        let mut profiles = Vec::with_capacity(section.len());
        for (name, spec) in section.iter() {
            if spec.weights.is_empty() {
                return Err(RankError::EmptyProfile(name.to_string()));
            }
            if let Some((score, _)) = spec.weights.iter().find(|(_, w)| !w.is_finite()) {
                return Err(RankError::InvalidWeight {
                    profile: name.to_string(),
                    score: score.to_string(),
                });
            }
            profiles.push(ProfileStep {
                name: name.to_string(),
                weights: spec
                    .weights
                    .iter()
                    .map(|(score, w)| (score.to_string(), *w))
                    .collect(),
            });
        }
        Ok(Self { profiles })
    }

    pub fn profiles(&self) -> &[ProfileStep] {
        &self.profiles
    }

    pub fn validate(&self, table: &DataFrame) -> Result<(), RankError> {
        let mut produced: Vec<String> = Vec::new();
        for profile in &self.profiles {
            for (score, _) in &profile.weights {
                let column = table.column(score).map_err(|_| RankError::UnknownScore {
                    profile: profile.name.clone(),
                    score: score.clone(),
                })?;
                to_numeric(column).map_err(|e| RankError::NonNumericScore {
                        profile: profile.name.clone(),
                        score: score.clone(),
                        reason: e.to_string(),
                    })?;
            }
            for column in [profile.score_column(), profile.rank_column()] {
                if has_column(table, &column) || produced.contains(&column) {
                    return Err(RankError::DuplicateColumn {
                        profile: profile.name.clone(),
                        column,
                    });
                }
                produced.push(column);
            }
        }
        Ok(())
    }

    /// Validates, then appends `score_<profile>` and `rank_<profile>` for
    /// every profile in declaration order.
    pub fn apply(&self, table: &DataFrame) -> Result<DataFrame, RankError> {
        self.validate(table)?;

        let mut out = table.clone();
        for profile in &self.profiles {
            let mut sums = Float64Chunked::full(&profile.score_column(), 0.0, table.height());
            for (score, weight) in &profile.weights {
                let values = to_numeric(table.column(score)?)?;
                sums = &sums + &(&values * *weight);
            }
            let sums = finite(&sums).with_name(&profile.score_column());
            let ranks = dense_rank(&sums)?.with_name(&profile.rank_column());

            tracing::debug!(
                profile = %profile.name,
                unranked = sums.null_count(),
                "Profile ranked"
            );
            out.with_column(sums.into_series())?;
            out.with_column(ranks.into_series())?;
        }

        tracing::info!(
            rows = out.height(),
            profiles = self.profiles.len(),
            "Profile rankings computed"
        );
        Ok(out)
    }
}

/// Appends the weighted score and dense rank of every profile.
pub fn compute_profile_scores_from_df(
    table: &DataFrame,
    profiles: &ProfileSection,
) -> Result<DataFrame, RankError> {
    ProfilePlan::new(profiles)?.apply(table)
}

/// Applies the `profile` (or `profiles`) section of a pipeline configuration.
pub fn compute_profile_scores_from_yaml(
    table: &DataFrame,
    config: &PipelineConfig,
) -> Result<DataFrame, RankError> {
    compute_profile_scores_from_df(table, &config.profile)
}
