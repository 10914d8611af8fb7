use crate::error::ScoreError;
use crate::normalize::Normalization;
use adjustments::AdjustmentChain;
use configuration::{PipelineConfig, ScoreSection};
use core_types::{has_column, to_numeric};
use polars::prelude::*;

/// One resolved score definition.
#[derive(Debug, Clone)]
pub struct ScoreStep {
    pub name: String,
    pub feature: String,
    pub group_by: Option<String>,
    pub normalization: Normalization,
    pub adjustments: AdjustmentChain,
}

/// The score section with every type and adjustment resolved.
///
/// Building a plan only needs the configuration, so pipelines can reject a
/// bad `score` section before any feature is computed.
#[derive(Debug, Clone, Default)]
pub struct ScorePlan {
    steps: Vec<ScoreStep>,
}

impl ScorePlan {
    pub fn new(section: &ScoreSection) -> Result<Self, ScoreError> {
        let steps = section
            .iter()
            .map(|(name, spec)| {
                let normalization = Normalization::from_name(spec.kind.trim()).ok_or_else(|| {
                    ScoreError::UnsupportedType {
                        score: name.to_string(),
                        kind: spec.kind.clone(),
                    }
                })?;
                let adjustments = AdjustmentChain::resolve(&spec.adjustment).map_err(|source| {
                    ScoreError::Adjustment {
                        score: name.to_string(),
                        source,
                    }
                })?;
                Ok(ScoreStep {
                    name: name.to_string(),
                    feature: spec.args.feature.clone(),
                    group_by: spec.args.group_by.clone(),
                    normalization,
                    adjustments,
                })
            })
            .collect::<Result<Vec<_>, ScoreError>>()?;
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[ScoreStep] {
        &self.steps
    }

    /// Checks the plan against a concrete feature table.
    ///
    /// A score may read a column produced by an earlier score.
    pub fn validate(&self, table: &DataFrame) -> Result<(), ScoreError> {
        let mut produced: Vec<&str> = Vec::new();
        for step in &self.steps {
            if has_column(table, &step.name) || produced.contains(&step.name.as_str()) {
                return Err(ScoreError::DuplicateColumn {
                    score: step.name.clone(),
                });
            }
            if let Some(column) = &step.group_by {
                if !has_column(table, column) && !produced.contains(&column.as_str()) {
                    return Err(ScoreError::MissingGroupColumn {
                        score: step.name.clone(),
                        column: column.clone(),
                    });
                }
            }
            if !produced.contains(&step.feature.as_str()) {
                let column = table.column(&step.feature).map_err(|_| ScoreError::MissingFeature {
                    score: step.name.clone(),
                    feature: step.feature.clone(),
                })?;
                to_numeric(column).map_err(|e| ScoreError::NonNumericFeature {
                        score: step.name.clone(),
                        feature: step.feature.clone(),
                        reason: e.to_string(),
                    })?;
            }
            produced.push(&step.name);
        }
        Ok(())
    }

    /// Validates, then appends one numeric column per score.
    pub fn apply(&self, table: &DataFrame) -> Result<DataFrame, ScoreError> {
        self.validate(table)?;

        let mut out = table.clone();
        for step in &self.steps {
            let values = to_numeric(out.column(&step.feature)?)?;
            let partition = match &step.group_by {
                Some(column) => Some(out.column(column)?.clone()),
                None => None,
            };
            let normalized = step.normalization.apply(&values, partition.as_ref())?;

            let mut scores: Vec<Option<f64>> = normalized.into_iter().collect();
            step.adjustments.apply_column(&mut scores);

            tracing::debug!(
                score = %step.name,
                feature = %step.feature,
                normalization = %step.normalization,
                missing = scores.iter().filter(|s| s.is_none()).count(),
                "Score computed"
            );
            out.with_column(Series::new(&step.name, scores))?;
        }

        tracing::info!(
            rows = out.height(),
            scores = self.steps.len(),
            "Scores computed"
        );
        Ok(out)
    }
}

/// Appends every score of `section` to `table`.
pub fn compute_scores(table: &DataFrame, section: &ScoreSection) -> Result<DataFrame, ScoreError> {
    ScorePlan::new(section)?.apply(table)
}

/// Applies the `score` section of a pipeline configuration.
pub fn compute_scores_from_yaml(
    table: &DataFrame,
    config: &PipelineConfig,
) -> Result<DataFrame, ScoreError> {
    compute_scores(table, &config.score)
}
