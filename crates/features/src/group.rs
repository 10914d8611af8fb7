use core_types::{to_numeric, to_text, CoreError, GroupKey};
use polars::prelude::*;

/// Read-only access to the rows of one group.
///
/// Aggregations report problems as plain reason strings; the feature engine
/// attaches the dataset, feature and group before surfacing them.
#[derive(Debug, Clone, Copy)]
pub struct GroupView<'a> {
    key: &'a GroupKey,
    frame: &'a DataFrame,
}

impl<'a> GroupView<'a> {
    pub fn new(key: &'a GroupKey, frame: &'a DataFrame) -> Self {
        Self { key, frame }
    }

    pub fn key(&self) -> &GroupKey {
        self.key
    }

    /// Every row of the group, key columns included (as text).
    pub fn frame(&self) -> &'a DataFrame {
        self.frame
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    pub fn column(&self, name: &str) -> Result<&'a Series, String> {
        self.frame
            .column(name)
            .map_err(|_| format!("column '{name}' not found"))
    }

    /// The group's cells of `name` as nullable numbers.
    ///
    /// Text that does not parse as a number is an error; missing cells stay
    /// null so each caller decides how to treat them.
    pub fn numbers(&self, name: &str) -> Result<Float64Chunked, String> {
        to_numeric(self.column(name)?).map_err(|e| match e {
            CoreError::NotNumeric { value, .. } => {
                format!("value '{value}' in column '{name}' is not numeric")
            }
            other => other.to_string(),
        })
    }

    /// The group's cells of `name` rendered as text.
    pub fn texts(&self, name: &str) -> Result<StringChunked, String> {
        to_text(self.column(name)?).map_err(|e| e.to_string())
    }
}
