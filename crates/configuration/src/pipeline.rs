use crate::error::ConfigError;
use crate::ordered::OrderedMap;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Score definitions keyed by output column name.
pub type ScoreSection = OrderedMap<ScoreSpec>;
/// Profile definitions keyed by profile name.
pub type ProfileSection = OrderedMap<ProfileSpec>;

/// The root of a pipeline YAML file.
///
/// Each stage only reads its own section, so partial files are valid: a
/// file with just `score` is enough for the score command.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub feature: Option<FeatureSection>,
    #[serde(default)]
    pub score: ScoreSection,
    #[serde(default, alias = "profiles")]
    pub profile: ProfileSection,
}

impl PipelineConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

/// Loads and parses a pipeline YAML file.
pub fn load_pipeline(path: impl AsRef<Path>) -> Result<PipelineConfig, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = PipelineConfig::from_yaml_str(&text)?;
    tracing::debug!(
        path = %path.display(),
        scores = config.score.len(),
        profiles = config.profile.len(),
        "Loaded pipeline configuration"
    );
    Ok(config)
}

/// The `feature` section: grouping columns plus recipes per dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureSection {
    pub group_keys: Vec<String>,
    /// dataset name -> feature name -> recipe
    #[serde(default)]
    pub feature_registry: OrderedMap<OrderedMap<FeatureRecipe>>,
}

impl FeatureSection {
    /// Every declared feature name, in declaration order across datasets.
    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.feature_registry
            .iter()
            .flat_map(|(_, recipes)| recipes.keys())
    }
}

/// How one feature is aggregated from the rows of a group.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeatureRecipe {
    pub method: String,
    #[serde(default, deserialize_with = "nullable_list")]
    pub args: Vec<RecipeArg>,
    #[serde(default, alias = "adjustments", deserialize_with = "one_or_many")]
    pub adjustment: Vec<AdjustmentSpec>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A literal recipe argument as written in YAML.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RecipeArg {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<RecipeArg>),
}

impl RecipeArg {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RecipeArg::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[RecipeArg]> {
        match self {
            RecipeArg::List(items) => Some(items),
            _ => None,
        }
    }

    /// Renders a scalar the way it would appear in a table cell.
    ///
    /// Whole numbers drop their fractional part so `[2024]` matches a cell
    /// holding `"2024"`. Lists have no scalar rendering.
    pub fn render(&self) -> Option<String> {
        match self {
            RecipeArg::Bool(b) => Some(b.to_string()),
            RecipeArg::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                Some(format!("{}", *n as i64))
            }
            RecipeArg::Number(n) => Some(n.to_string()),
            RecipeArg::Text(s) => Some(s.clone()),
            RecipeArg::List(_) => None,
        }
    }
}

impl fmt::Display for RecipeArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecipeArg::List(items) => {
                let parts: Vec<String> = items.iter().map(|i| i.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            other => f.write_str(&other.render().unwrap_or_default()),
        }
    }
}

/// One entry of an adjustment chain: `log`, or `coalesce: 0.5`, or `clip: [0, 2]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawAdjustment")]
pub struct AdjustmentSpec {
    pub name: String,
    pub param: Option<AdjustmentParam>,
}

impl AdjustmentSpec {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param: None,
        }
    }

    pub fn with_param(name: impl Into<String>, param: AdjustmentParam) -> Self {
        Self {
            name: name.into(),
            param: Some(param),
        }
    }
}

impl fmt::Display for AdjustmentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.param {
            None => f.write_str(&self.name),
            Some(AdjustmentParam::Scalar(v)) => write!(f, "{}: {v}", self.name),
            Some(AdjustmentParam::Bounds(v)) => write!(f, "{}: {v:?}", self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AdjustmentParam {
    Scalar(f64),
    Bounds(Vec<f64>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAdjustment {
    Name(String),
    Parameterized(BTreeMap<String, AdjustmentParam>),
}

impl TryFrom<RawAdjustment> for AdjustmentSpec {
    type Error = String;

    fn try_from(raw: RawAdjustment) -> Result<Self, Self::Error> {
        match raw {
            RawAdjustment::Name(name) => Ok(AdjustmentSpec::named(name)),
            RawAdjustment::Parameterized(map) => {
                if map.len() != 1 {
                    return Err(format!(
                        "an adjustment with parameters must have exactly one key, found {}",
                        map.len()
                    ));
                }
                let (name, param) = map.into_iter().next().ok_or("empty adjustment")?;
                Ok(AdjustmentSpec::with_param(name, param))
            }
        }
    }
}

/// A normalization of one feature column into a score column.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScoreSpec {
    #[serde(rename = "type")]
    pub kind: String,
    pub args: ScoreArgs,
    #[serde(default, alias = "adjustments", deserialize_with = "one_or_many")]
    pub adjustment: Vec<AdjustmentSpec>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScoreArgs {
    pub feature: String,
    /// Normalize within each partition of this column instead of the whole table.
    #[serde(default)]
    pub group_by: Option<String>,
}

/// Score-column weights of one investor profile.
///
/// In YAML every key except `description` is a score column name mapped to
/// its weight.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileSpec {
    pub weights: OrderedMap<f64>,
    pub description: Option<String>,
}

impl ProfileSpec {
    pub fn new<K: Into<String>>(weights: impl IntoIterator<Item = (K, f64)>) -> Self {
        Self {
            weights: weights.into_iter().collect(),
            description: None,
        }
    }
}

impl<'de> Deserialize<'de> for ProfileSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ProfileVisitor;

        impl<'de> Visitor<'de> for ProfileVisitor {
            type Value = ProfileSpec;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of score names to numeric weights")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(ProfileSpec::default())
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut profile = ProfileSpec::default();
                while let Some(key) = access.next_key::<String>()? {
                    if key == "description" {
                        profile.description = access.next_value()?;
                        continue;
                    }
                    let weight: f64 = access.next_value().map_err(|e| {
                        de::Error::custom(format!("weight for '{key}' must be a number: {e}"))
                    })?;
                    if !profile.weights.push(key.clone(), weight) {
                        return Err(de::Error::custom(format!("duplicate weight '{key}'")));
                    }
                }
                Ok(profile)
            }
        }

        deserializer.deserialize_any(ProfileVisitor)
    }
}

fn nullable_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts `~`, a single adjustment, or a list of adjustments.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<AdjustmentSpec>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<AdjustmentSpec>),
        One(AdjustmentSpec),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::Many(list)) => list,
        Some(OneOrMany::One(single)) => vec![single],
    })
}
