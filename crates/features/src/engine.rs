use crate::error::FeatureError;
use crate::group::GroupView;
use crate::registry::{AggregationRegistry, Method, ResolvedRecipe};
use configuration::PipelineConfig;
use core_types::{finite, has_column, partition_groups, text_columns, Datasets, GroupKey};
use polars::prelude::*;
use rayon::prelude::*;

/// Computes every feature declared in `config.feature` from `datasets`.
///
/// Recipes are looked up in `registry`, which must have been built from the
/// same section. The result has one row per distinct group key across all
/// contributing datasets: the group-key columns (text) followed by one
/// numeric column per feature in declaration order.
pub fn compute_all_features(
    datasets: &Datasets,
    config: &PipelineConfig,
    registry: &AggregationRegistry,
) -> Result<DataFrame, FeatureError> {
    let section = config.feature.as_ref().ok_or(FeatureError::MissingSection)?;

    let mut plan: Vec<(&str, Vec<&ResolvedRecipe>)> = Vec::new();
    for (dataset, recipes) in section.feature_registry.iter() {
        let resolved = recipes
            .keys()
            .map(|feature| registry.resolve(dataset, feature))
            .collect::<Result<Vec<_>, _>>()?;
        plan.push((dataset, resolved));
    }

    run_plan(datasets, &section.group_keys, &plan)
}

/// Computes every feature registered in `registry`.
pub fn compute_features(
    datasets: &Datasets,
    registry: &AggregationRegistry,
) -> Result<DataFrame, FeatureError> {
    let plan: Vec<(&str, Vec<&ResolvedRecipe>)> = registry
        .datasets()
        .iter()
        .map(|d| (d.name.as_str(), d.recipes.iter().collect()))
        .collect();
    run_plan(datasets, registry.group_keys(), &plan)
}

fn run_plan(
    datasets: &Datasets,
    group_keys: &[String],
    plan: &[(&str, Vec<&ResolvedRecipe>)],
) -> Result<DataFrame, FeatureError> {
    if group_keys.is_empty() {
        return Err(FeatureError::EmptyGroupKeys);
    }

    for name in datasets.keys() {
        if !plan.iter().any(|(dataset, _)| dataset == name) {
            tracing::warn!(dataset = %name, "Dataset has no feature registry entry; skipping");
        }
    }

    let mut frames = Vec::new();
    for (dataset, recipes) in plan {
        if recipes.is_empty() {
            tracing::warn!(dataset = %dataset, "No features defined for dataset; skipping");
            continue;
        }
        let Some(frame) = datasets.get(*dataset) else {
            tracing::warn!(dataset = %dataset, "Dataset not present in input; skipping");
            continue;
        };
        frames.push(compute_dataset(dataset, frame, group_keys, recipes)?);
    }

    if frames.is_empty() {
        return Err(FeatureError::NoFeatures);
    }

    let features = outer_union(group_keys, frames)?;
    tracing::info!(
        rows = features.height(),
        columns = features.width(),
        "Feature table computed"
    );
    Ok(features)
}

fn compute_dataset(
    dataset: &str,
    frame: &DataFrame,
    group_keys: &[String],
    recipes: &[&ResolvedRecipe],
) -> Result<DataFrame, FeatureError> {
    for key in group_keys {
        if !has_column(frame, key) {
            return Err(FeatureError::MissingGroupKey {
                dataset: dataset.to_string(),
                column: key.clone(),
            });
        }
    }
    for recipe in recipes {
        if let Some(column) = recipe
            .required_columns()
            .into_iter()
            .find(|c| !has_column(frame, c))
        {
            return Err(FeatureError::MissingSourceColumn {
                dataset: dataset.to_string(),
                feature: recipe.feature.clone(),
                column: column.to_string(),
            });
        }
    }

    let keyed = text_columns(frame, group_keys)?;
    let key_exprs: Vec<Expr> = group_keys.iter().map(|k| col(k)).collect();
    let groups = if recipes.iter().any(|r| matches!(r.method, Method::Custom(_))) {
        partition_groups(&keyed, group_keys)?
    } else {
        Vec::new()
    };

    let mut prepared: Vec<Series> = keyed.select(group_keys)?.get_columns().to_vec();
    let mut aggregations: Vec<Expr> = Vec::new();
    let mut custom_columns: Vec<Series> = Vec::new();

    for recipe in recipes {
        tracing::debug!(
            dataset = %dataset,
            feature = %recipe.feature,
            method = %recipe.method.name(),
            "Aggregating feature"
        );
        match &recipe.method {
            Method::Builtin(reducer) => {
                let source = recipe.source_column().ok_or_else(|| FeatureError::InvalidArguments {
                    method: reducer.name().to_string(),
                    reason: "no source column".to_string(),
                })?;
                let input = reducer.prepare(keyed.column(source)?)?;
                if let Some((group, reason)) = first_rejected(&keyed, group_keys, input.rejected)? {
                    return Err(computation(dataset, &recipe.feature, &group, reason));
                }
                prepared.push(input.values.with_name(&recipe.feature));
                aggregations.push(reducer.expr(&recipe.feature, recipe.members()));
            }
            Method::Custom(function) => {
                // Collected before short-circuiting so the reported failure is
                // always the first failing group in key order.
                let results: Vec<Result<Option<f64>, FeatureError>> = groups
                    .par_iter()
                    .map(|group| {
                        function
                            .aggregate(&GroupView::new(&group.key, &group.frame), &recipe.args)
                            .map_err(|reason| computation(dataset, &recipe.feature, &group.key, reason))
                    })
                    .collect();
                let values = results.into_iter().collect::<Result<Vec<_>, _>>()?;
                custom_columns.push(Series::new(&recipe.feature, values));
            }
        }
    }

    let builtin = if aggregations.is_empty() {
        None
    } else {
        Some(
            DataFrame::new(prepared)?
                .lazy()
                .group_by(key_exprs.clone())
                .agg(aggregations)
                .collect()?,
        )
    };
    let custom = if custom_columns.is_empty() {
        None
    } else {
        let mut columns: Vec<Series> = group_keys
            .iter()
            .enumerate()
            .map(|(pos, name)| {
                let values: Vec<Option<String>> = groups
                    .iter()
                    .map(|g| g.key.0.get(pos).cloned().flatten())
                    .collect();
                Series::new(name, values)
            })
            .collect();
        columns.extend(custom_columns);
        Some(DataFrame::new(columns)?)
    };

    let joined = match (builtin, custom) {
        (Some(builtin), Some(custom)) => builtin
            .lazy()
            .join(
                custom.lazy(),
                key_exprs.clone(),
                key_exprs,
                JoinArgs {
                    join_nulls: true,
                    ..JoinArgs::new(JoinType::Left)
                },
            )
            .collect()?,
        (Some(frame), None) | (None, Some(frame)) => frame,
        (None, None) => return Err(FeatureError::NoFeatures),
    };

    let mut out = joined.sort(group_keys, vec![false; group_keys.len()], false)?;
    for recipe in recipes {
        let mut values: Vec<Option<f64>> = finite(out.column(&recipe.feature)?.f64()?)
            .into_iter()
            .collect();
        recipe.adjustments.apply_column(&mut values);
        out.with_column(Series::new(&recipe.feature, values))?;
    }
    let order: Vec<&str> = group_keys
        .iter()
        .map(String::as_str)
        .chain(recipes.iter().map(|r| r.feature.as_str()))
        .collect();
    let out = out.select(order)?;

    tracing::info!(
        dataset = %dataset,
        rows = frame.height(),
        groups = out.height(),
        features = recipes.len(),
        "Dataset features computed"
    );
    Ok(out)
}

/// The rejected row whose group sorts first, with its reason.
fn first_rejected(
    keyed: &DataFrame,
    group_keys: &[String],
    rejected: Vec<(usize, String)>,
) -> Result<Option<(GroupKey, String)>, FeatureError> {
    let mut first: Option<(GroupKey, String)> = None;
    for (row, reason) in rejected {
        let key = GroupKey::of_row(keyed, group_keys, row)?;
        if first.as_ref().is_none_or(|(seen, _)| key < *seen) {
            first = Some((key, reason));
        }
    }
    Ok(first)
}

fn computation(dataset: &str, feature: &str, group: &GroupKey, reason: String) -> FeatureError {
    FeatureError::Computation {
        dataset: dataset.to_string(),
        feature: feature.to_string(),
        group: group.to_string(),
        reason,
    }
}

/// Joins per-dataset frames on the group key, keeping every group.
fn outer_union(group_keys: &[String], frames: Vec<DataFrame>) -> Result<DataFrame, FeatureError> {
    let keys: Vec<Expr> = group_keys.iter().map(|k| col(k)).collect();
    let args = JoinArgs {
        join_nulls: true,
        ..JoinArgs::new(JoinType::Outer { coalesce: true })
    };

    let mut frames = frames.into_iter();
    let mut joined = frames.next().ok_or(FeatureError::NoFeatures)?.lazy();
    for frame in frames {
        joined = joined.join(frame.lazy(), keys.clone(), keys.clone(), args.clone());
    }
    Ok(joined
        .collect()?
        .sort(group_keys, vec![false; group_keys.len()], false)?)
}
