use crate::custom::{CustomAggregation, CustomFunctionTable};
use crate::error::FeatureError;
use crate::reducer::Reducer;
use adjustments::AdjustmentChain;
use configuration::{FeatureRecipe, FeatureSection, RecipeArg};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A resolved aggregation method.
#[derive(Clone)]
pub enum Method {
    Builtin(Reducer),
    Custom(Arc<dyn CustomAggregation>),
}

impl Method {
    pub fn name(&self) -> &str {
        match self {
            Method::Builtin(reducer) => reducer.name(),
            Method::Custom(function) => function.name(),
        }
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Builtin(reducer) => write!(f, "Builtin({reducer})"),
            Method::Custom(function) => write!(f, "Custom({})", function.name()),
        }
    }
}

/// A feature recipe whose method, arguments and adjustments were all checked.
#[derive(Debug, Clone)]
pub struct ResolvedRecipe {
    pub dataset: String,
    pub feature: String,
    pub method: Method,
    pub args: Vec<RecipeArg>,
    pub adjustments: AdjustmentChain,
    source_column: Option<String>,
    members: Vec<String>,
}

impl ResolvedRecipe {
    /// Columns the recipe reads, checked against each dataset before any
    /// group is aggregated.
    pub fn required_columns(&self) -> Vec<&str> {
        match &self.method {
            Method::Builtin(_) => self.source_column.as_deref().into_iter().collect(),
            Method::Custom(function) => function.required_columns().to_vec(),
        }
    }

    /// The column a built-in reducer aggregates.
    pub fn source_column(&self) -> Option<&str> {
        self.source_column.as_deref()
    }

    /// The member list of an `isin` recipe; empty for every other method.
    pub fn members(&self) -> &[String] {
        &self.members
    }
}

/// Recipes of one dataset, in declaration order.
#[derive(Debug, Clone)]
pub struct DatasetRecipes {
    pub name: String,
    pub recipes: Vec<ResolvedRecipe>,
}

/// Every feature recipe of a pipeline, validated up front.
///
/// Building the registry resolves each method name, checks each recipe's
/// argument shape and resolves each adjustment chain, so a bad configuration
/// fails before any dataset is read.
#[derive(Debug, Clone)]
pub struct AggregationRegistry {
    group_keys: Vec<String>,
    datasets: Vec<DatasetRecipes>,
    functions: CustomFunctionTable,
}

impl AggregationRegistry {
    pub fn from_config(
        section: &FeatureSection,
        functions: CustomFunctionTable,
    ) -> Result<Self, FeatureError> {
        if section.group_keys.is_empty() {
            return Err(FeatureError::EmptyGroupKeys);
        }

        let mut registry = Self {
            group_keys: section.group_keys.clone(),
            datasets: Vec::new(),
            functions,
        };
        let mut declared_in: HashMap<String, String> = HashMap::new();

        for (dataset, recipes) in section.feature_registry.iter() {
            let mut resolved = Vec::with_capacity(recipes.len());
            for (feature, recipe) in recipes.iter() {
                if registry.group_keys.iter().any(|k| k == feature) {
                    return Err(FeatureError::FeatureShadowsGroupKey(feature.to_string()));
                }
                if let Some(first) = declared_in.get(feature) {
                    return Err(FeatureError::DuplicateFeature {
                        feature: feature.to_string(),
                        first: first.clone(),
                        second: dataset.to_string(),
                    });
                }
                declared_in.insert(feature.to_string(), dataset.to_string());

                let recipe = registry
                    .resolve_recipe(dataset, feature, recipe)
                    .map_err(|source| FeatureError::InvalidRecipe {
                        dataset: dataset.to_string(),
                        feature: feature.to_string(),
                        source: Box::new(source),
                    })?;
                resolved.push(recipe);
            }
            registry.datasets.push(DatasetRecipes {
                name: dataset.to_string(),
                recipes: resolved,
            });
        }

        tracing::debug!(
            datasets = registry.datasets.len(),
            features = declared_in.len(),
            "Aggregation registry built"
        );
        Ok(registry)
    }

    pub fn group_keys(&self) -> &[String] {
        &self.group_keys
    }

    pub fn datasets(&self) -> &[DatasetRecipes] {
        &self.datasets
    }

    /// Every registered feature name, in declaration order.
    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.datasets
            .iter()
            .flat_map(|d| d.recipes.iter().map(|r| r.feature.as_str()))
    }

    pub fn resolve(&self, dataset: &str, feature: &str) -> Result<&ResolvedRecipe, FeatureError> {
        self.datasets
            .iter()
            .filter(|d| d.name == dataset)
            .flat_map(|d| d.recipes.iter())
            .find(|r| r.feature == feature)
            .ok_or_else(|| FeatureError::UnknownFeature {
                dataset: dataset.to_string(),
                feature: feature.to_string(),
            })
    }

    /// Looks a method name up among the built-ins, then the custom functions.
    pub fn resolve_method(&self, name: &str) -> Result<Method, FeatureError> {
        if let Some(reducer) = Reducer::from_name(name) {
            return Ok(Method::Builtin(reducer));
        }
        self.functions
            .get(name)
            .map(Method::Custom)
            .ok_or_else(|| FeatureError::UnknownMethod(name.to_string()))
    }

    fn resolve_recipe(
        &self,
        dataset: &str,
        feature: &str,
        recipe: &FeatureRecipe,
    ) -> Result<ResolvedRecipe, FeatureError> {
        let method = self.resolve_method(recipe.method.trim())?;
        let invalid = |reason: String| FeatureError::InvalidArguments {
            method: method.name().to_string(),
            reason,
        };

        let (source_column, members) = match &method {
            Method::Builtin(reducer) => {
                let expected = if reducer.takes_members() { 2 } else { 1 };
                if recipe.args.len() != expected {
                    return Err(invalid(format!(
                        "expected {expected} argument(s), got {}",
                        recipe.args.len()
                    )));
                }
                let column = recipe.args[0]
                    .as_str()
                    .ok_or_else(|| invalid("the first argument must be a column name".into()))?;
                let members = match recipe.args.get(1) {
                    None => Vec::new(),
                    Some(arg) => arg
                        .as_list()
                        .ok_or_else(|| invalid("the second argument must be a list".into()))?
                        .iter()
                        .map(|m| {
                            m.render()
                                .ok_or_else(|| invalid("list members must be scalars".into()))
                        })
                        .collect::<Result<Vec<_>, _>>()?,
                };
                (Some(column.to_string()), members)
            }
            Method::Custom(function) => {
                function.validate_args(&recipe.args).map_err(invalid)?;
                (None, Vec::new())
            }
        };

        let adjustments = AdjustmentChain::resolve(&recipe.adjustment)?;

        Ok(ResolvedRecipe {
            dataset: dataset.to_string(),
            feature: feature.to_string(),
            method,
            args: recipe.args.clone(),
            adjustments,
            source_column,
            members,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use configuration::PipelineConfig;

    fn section(yaml: &str) -> FeatureSection {
        PipelineConfig::from_yaml_str(yaml)
            .unwrap()
            .feature
            .unwrap()
    }

    fn build(yaml: &str) -> Result<AggregationRegistry, FeatureError> {
        AggregationRegistry::from_config(&section(yaml), CustomFunctionTable::with_defaults())
    }

    #[test]
    fn resolves_builtin_and_custom_recipes() {
        let registry = build(
            r#"
feature:
  group_keys: [CNPJ_FUNDO_CLASSE]
  feature_registry:
    cda_blc:
      n_emissores: { method: nunique, args: [CPF_CNPJ_EMISSOR] }
      issuer_hhi: { method: hhi_feature_fn }
      n_credito: { method: isin, args: [TP_APLIC, [Debêntures, CRI]], adjustment: [log1p] }
"#,
        )
        .unwrap();

        let hhi = registry.resolve("cda_blc", "issuer_hhi").unwrap();
        assert!(matches!(hhi.method, Method::Custom(_)));
        assert_eq!(hhi.required_columns(), vec!["VL_MERC_POS_FINAL", "CPF_CNPJ_EMISSOR"]);

        let isin = registry.resolve("cda_blc", "n_credito").unwrap();
        assert!(matches!(isin.method, Method::Builtin(Reducer::Isin)));
        assert_eq!(isin.members, vec!["Debêntures", "CRI"]);
        assert_eq!(isin.adjustments.steps().len(), 1);

        assert_eq!(
            registry.feature_names().collect::<Vec<_>>(),
            vec!["n_emissores", "issuer_hhi", "n_credito"]
        );
    }

    #[test]
    fn unknown_feature_and_method_are_reported() {
        let registry = build(
            "feature:\n  group_keys: [k]\n  feature_registry:\n    d:\n      f: { method: sum, args: [v] }\n",
        )
        .unwrap();
        assert!(matches!(
            registry.resolve("d", "g"),
            Err(FeatureError::UnknownFeature { .. })
        ));
        assert!(matches!(
            registry.resolve_method("percentile_99"),
            Err(FeatureError::UnknownMethod(_))
        ));
    }

    #[test]
    fn invalid_recipes_fail_at_build_time() {
        let unknown_method = build(
            "feature:\n  group_keys: [k]\n  feature_registry:\n    d:\n      f: { method: magic, args: [v] }\n",
        )
        .unwrap_err();
        match unknown_method {
            FeatureError::InvalidRecipe { feature, source, .. } => {
                assert_eq!(feature, "f");
                assert!(matches!(*source, FeatureError::UnknownMethod(_)));
            }
            other => panic!("unexpected error: {other}"),
        }

        let bad_adjustment = build(
            "feature:\n  group_keys: [k]\n  feature_registry:\n    d:\n      f: { method: sum, args: [v], adjustment: [sqrt] }\n",
        )
        .unwrap_err();
        assert!(bad_adjustment.is_config_validation());

        let missing_column_arg = build(
            "feature:\n  group_keys: [k]\n  feature_registry:\n    d:\n      f: { method: max }\n",
        )
        .unwrap_err();
        assert!(matches!(missing_column_arg, FeatureError::InvalidRecipe { .. }));
    }

    #[test]
    fn feature_names_must_be_unique_and_distinct_from_keys() {
        let duplicate = build(
            "feature:\n  group_keys: [k]\n  feature_registry:\n    a:\n      f: { method: sum, args: [v] }\n    b:\n      f: { method: max, args: [v] }\n",
        )
        .unwrap_err();
        assert!(matches!(duplicate, FeatureError::DuplicateFeature { .. }));

        let shadow = build(
            "feature:\n  group_keys: [k]\n  feature_registry:\n    a:\n      k: { method: sum, args: [v] }\n",
        )
        .unwrap_err();
        assert!(matches!(shadow, FeatureError::FeatureShadowsGroupKey(_)));
    }
}
