use crate::column::to_text;
use crate::error::CoreError;
use crate::frame::text_columns;
use polars::prelude::*;
use std::fmt;

/// The rendered values of the group-key columns for one group.
///
/// A missing key cell is kept as `None` so rows with null keys form their own
/// group instead of being dropped. Ordering follows `Option`, so groups with a
/// missing key sort first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey(pub Vec<Option<String>>);

impl GroupKey {
    /// The key of `row`, rendered from the `keys` columns of `frame`.
    pub fn of_row(frame: &DataFrame, keys: &[String], row: usize) -> Result<Self, CoreError> {
        let mut parts = Vec::with_capacity(keys.len());
        for key in keys {
            let text = to_text(frame.column(key)?)?;
            parts.push(text.get(row).map(str::to_string));
        }
        Ok(GroupKey(parts))
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = self
            .0
            .iter()
            .map(|v| v.as_deref().unwrap_or("<missing>"))
            .collect();
        write!(f, "({})", parts.join(", "))
    }
}

/// The rows of one group, with the key columns rendered as text.
#[derive(Debug, Clone)]
pub struct Group {
    pub key: GroupKey,
    pub frame: DataFrame,
}

/// Splits `frame` by the values of the `keys` columns.
///
/// Rows keep their original order inside a group, and groups are returned
/// sorted by key so the output order never depends on input row order.
pub fn partition_groups(frame: &DataFrame, keys: &[String]) -> Result<Vec<Group>, CoreError> {
    let keyed = text_columns(frame, keys)?;
    for key in keys {
        keyed.column(key)?;
    }
    if keyed.height() == 0 {
        return Ok(Vec::new());
    }

    let mut groups = keyed
        .partition_by_stable(keys.to_vec(), true)?
        .into_iter()
        .map(|part| {
            Ok(Group {
                key: GroupKey::of_row(&part, keys, 0)?,
                frame: part,
            })
        })
        .collect::<Result<Vec<_>, CoreError>>()?;
    groups.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(groups)
}
