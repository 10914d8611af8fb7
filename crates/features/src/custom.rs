use crate::group::GroupView;
use crate::holdings::{CreditShare, IssuerHhi, RelatedPartyShare};
use configuration::RecipeArg;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A named aggregation that sees every column of a group.
///
/// Implementations must be pure: the same group and arguments always give the
/// same result. They run on the rayon pool, hence `Send + Sync`.
pub trait CustomAggregation: Send + Sync {
    /// The name recipes refer to in `method:`.
    fn name(&self) -> &str;

    /// Columns that must exist in any dataset this function is applied to.
    fn required_columns(&self) -> &[&str] {
        &[]
    }

    /// Checks the recipe's literal arguments once, at registry build time.
    fn validate_args(&self, args: &[RecipeArg]) -> Result<(), String>;

    /// Produces one value for the group. `Ok(None)` is a missing result.
    fn aggregate(&self, group: &GroupView<'_>, args: &[RecipeArg]) -> Result<Option<f64>, String>;
}

/// Custom aggregations available to recipes, keyed by name.
#[derive(Clone, Default)]
pub struct CustomFunctionTable {
    functions: BTreeMap<String, Arc<dyn CustomAggregation>>,
}

impl CustomFunctionTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The holdings functions every deployment ships with.
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        table.register(CreditShare);
        table.register(RelatedPartyShare);
        table.register(IssuerHhi);
        table
    }

    /// Registers `function` under its own name, replacing any previous entry.
    pub fn register<F: CustomAggregation + 'static>(&mut self, function: F) {
        self.functions
            .insert(function.name().to_string(), Arc::new(function));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn CustomAggregation>> {
        self.functions.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for CustomFunctionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}
