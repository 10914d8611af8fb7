use core_types::{numeric_cells, to_text, CoreError, NumericCell};
use polars::prelude::*;
use std::fmt;

/// The built-in aggregations over one column of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reducer {
    Sum,
    Mean,
    Median,
    Min,
    Max,
    /// Sample standard deviation (n - 1).
    Std,
    /// Non-missing cells.
    Count,
    /// Distinct non-missing cells.
    Nunique,
    /// First non-missing value.
    First,
    /// Rows whose value is one of a list of members.
    Isin,
}

enum Input {
    /// Numbers only; a missing cell is an error.
    Strict,
    /// Numbers or missing cells.
    Lenient,
    Text,
}

/// A source column ready for [`Reducer::expr`].
#[derive(Debug, Clone)]
pub struct Prepared {
    pub values: Series,
    /// Rows the reducer cannot accept, with the reason.
    pub rejected: Vec<(usize, String)>,
}

impl Reducer {
    pub const ALL: [Reducer; 10] = [
        Reducer::Sum,
        Reducer::Mean,
        Reducer::Median,
        Reducer::Min,
        Reducer::Max,
        Reducer::Std,
        Reducer::Count,
        Reducer::Nunique,
        Reducer::First,
        Reducer::Isin,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Reducer::Sum => "sum",
            Reducer::Mean => "mean",
            Reducer::Median => "median",
            Reducer::Min => "min",
            Reducer::Max => "max",
            Reducer::Std => "std",
            Reducer::Count => "count",
            Reducer::Nunique => "nunique",
            Reducer::First => "first",
            Reducer::Isin => "isin",
        }
    }

    /// True if the reducer takes a member list as its second argument.
    pub fn takes_members(&self) -> bool {
        matches!(self, Reducer::Isin)
    }

    fn input(&self) -> Input {
        match self {
            Reducer::Count | Reducer::Nunique | Reducer::Isin => Input::Text,
            Reducer::First => Input::Lenient,
            _ => Input::Strict,
        }
    }

    /// Reads the source column the way this reducer expects it.
    ///
    /// Counting reducers see the column as text. Every other reducer sees
    /// numbers: text that does not parse is rejected, and so is a missing
    /// cell unless the reducer is [`Reducer::First`].
    pub fn prepare(&self, source: &Series) -> Result<Prepared, CoreError> {
        let column = source.name();
        let input = self.input();
        if matches!(input, Input::Text) {
            return Ok(Prepared {
                values: to_text(source)?.into_series(),
                rejected: Vec::new(),
            });
        }

        let mut rejected = Vec::new();
        let values: Float64Chunked = numeric_cells(source)?
            .into_iter()
            .enumerate()
            .map(|(row, cell)| match cell {
                NumericCell::Number(v) => Some(v),
                NumericCell::Missing => {
                    if matches!(input, Input::Strict) {
                        rejected.push((row, format!("missing value in column '{column}'")));
                    }
                    None
                }
                NumericCell::Invalid(value) => {
                    rejected.push((row, format!("value '{value}' in column '{column}' is not numeric")));
                    None
                }
            })
            .collect();
        Ok(Prepared {
            values: values.with_name(column).into_series(),
            rejected,
        })
    }

    /// The aggregation over a prepared `column`, as a Float64 expression named
    /// like the column.
    ///
    /// `members` is only read by [`Reducer::Isin`].
    pub fn expr(&self, column: &str, members: &[String]) -> Expr {
        let value = col(column);
        let reduced = match self {
            Reducer::Sum => value.sum(),
            Reducer::Mean => value.mean(),
            Reducer::Median => value.median(),
            Reducer::Min => value.min(),
            Reducer::Max => value.max(),
            Reducer::Std => value.std(1),
            Reducer::Count => value.count(),
            Reducer::Nunique => value.drop_nulls().n_unique(),
            Reducer::First => value.drop_nulls().first(),
            Reducer::Isin => value
                .is_in(lit(Series::new("members", members)))
                .sum(),
        };
        reduced.cast(DataType::Float64).alias(column)
    }
}

impl fmt::Display for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fixture() -> DataFrame {
        df!(
            "value" => &["4", "1", "3", "2"],
            "issuer" => &[Some("E1"), None, Some("E1"), Some("E2")],
            "gappy" => &[None, Some(2.0), None, Some(5.0)],
            "label" => &["a", "b", "c", "d"],
        )
        .unwrap()
    }

    fn reduce_in(
        frame: &DataFrame,
        reducer: Reducer,
        column: &str,
        members: &[String],
    ) -> Result<Option<f64>, String> {
        let prepared = reducer.prepare(frame.column(column).unwrap()).unwrap();
        if let Some((_, reason)) = prepared.rejected.into_iter().next() {
            return Err(reason);
        }
        let out = DataFrame::new(vec![prepared.values])
            .unwrap()
            .lazy()
            .select([reducer.expr(column, members)])
            .collect()
            .unwrap();
        Ok(out.column(column).unwrap().f64().unwrap().get(0))
    }

    fn reduce(reducer: Reducer, column: &str) -> Result<Option<f64>, String> {
        reduce_in(&fixture(), reducer, column, &[])
    }

    #[test]
    fn numeric_reducers_over_text_cells() {
        assert_eq!(reduce(Reducer::Sum, "value"), Ok(Some(10.0)));
        assert_eq!(reduce(Reducer::Mean, "value"), Ok(Some(2.5)));
        assert_eq!(reduce(Reducer::Median, "value"), Ok(Some(2.5)));
        assert_eq!(reduce(Reducer::Min, "value"), Ok(Some(1.0)));
        assert_eq!(reduce(Reducer::Max, "value"), Ok(Some(4.0)));
        let std = reduce(Reducer::Std, "value").unwrap().unwrap();
        assert!((std - 1.2909944487358056).abs() < 1e-12);
    }

    #[test]
    fn degenerate_results_on_empty_groups() {
        let empty = fixture().head(Some(0));
        assert_eq!(reduce_in(&empty, Reducer::Sum, "value", &[]), Ok(Some(0.0)));
        assert_eq!(reduce_in(&empty, Reducer::Count, "value", &[]), Ok(Some(0.0)));
        assert_eq!(reduce_in(&empty, Reducer::Mean, "value", &[]), Ok(None));
        assert_eq!(reduce_in(&empty, Reducer::Max, "value", &[]), Ok(None));

        let single = fixture().head(Some(1));
        assert_eq!(reduce_in(&single, Reducer::Std, "value", &[]), Ok(None));
    }

    #[test]
    fn counting_reducers_skip_missing_cells() {
        assert_eq!(reduce(Reducer::Count, "issuer"), Ok(Some(3.0)));
        assert_eq!(reduce(Reducer::Nunique, "issuer"), Ok(Some(2.0)));
        assert_eq!(reduce(Reducer::First, "gappy"), Ok(Some(2.0)));
    }

    #[test]
    fn numeric_reducers_refuse_missing_and_text() {
        assert!(reduce(Reducer::Sum, "gappy").unwrap_err().contains("missing"));
        assert!(reduce(Reducer::Max, "label").unwrap_err().contains("not numeric"));
        assert!(reduce(Reducer::First, "label").unwrap_err().contains("not numeric"));
    }

    #[test]
    fn isin_counts_member_rows() {
        let members = vec!["E1".to_string(), "E9".to_string()];
        assert_eq!(
            reduce_in(&fixture(), Reducer::Isin, "issuer", &members),
            Ok(Some(2.0))
        );
    }
}
