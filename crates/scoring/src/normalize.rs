//! Column normalizations.
//!
//! Every normalization maps the non-missing values of one partition to
//! comparable scores and leaves missing cells missing. Partitions are polars
//! windows (`expr.over(partition)`).

use core_types::finite;
use polars::prelude::*;
use std::fmt;

/// Relative tolerance under which a standard deviation counts as zero.
const ZERO_SPREAD: f64 = 1e-12;

const VALUE: &str = "value";
const PARTITION: &str = "partition";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalization {
    /// `(x - mean) / s` with the sample standard deviation.
    ZScore,
    /// `(x - min) / (max - min)`.
    MinMax,
    /// Average-tie ascending rank divided by the number of values.
    Percentile,
}

impl Normalization {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "zscore" => Some(Normalization::ZScore),
            "minmax" => Some(Normalization::MinMax),
            "percentile" => Some(Normalization::Percentile),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Normalization::ZScore => "zscore",
            Normalization::MinMax => "minmax",
            Normalization::Percentile => "percentile",
        }
    }

    /// Normalizes `values` within each partition (the whole column when
    /// `partition` is `None`).
    ///
    /// NaN and infinities are treated as missing before any statistic is
    /// taken, so one bad cell never spoils the rest of its partition.
    pub fn apply(
        &self,
        values: &Float64Chunked,
        partition: Option<&Series>,
    ) -> PolarsResult<Float64Chunked> {
        if values.is_empty() {
            return Ok(values.clone());
        }
        let partition = match partition {
            Some(series) => series.clone().with_name(PARTITION),
            None => Series::new(PARTITION, vec![0i32; values.len()]),
        };
        let frame = DataFrame::new(vec![finite(values).with_name(VALUE).into_series(), partition])?;

        let scored = frame
            .lazy()
            .select([self.expr().alias(VALUE)])
            .collect()?;
        let scored = scored.column(VALUE)?.cast(&DataType::Float64)?;
        Ok(finite(scored.f64()?).with_name(values.name()))
    }

    fn expr(&self) -> Expr {
        let x = col(VALUE);
        let window = |e: Expr| e.over([col(PARTITION)]);
        let missing = x.clone().is_null();

        match self {
            Normalization::ZScore => {
                let n = window(x.clone().count());
                let mean = window(x.clone().mean());
                let sd = window(x.clone().std(1));
                let scale = when(mean.clone().abs().gt(lit(1.0)))
                    .then(mean.clone().abs())
                    .otherwise(lit(1.0));
                let flat = n
                    .lt(lit(2))
                    .or(sd.clone().is_finite().not())
                    .or(sd.clone().lt_eq(scale * lit(ZERO_SPREAD)));
                when(missing)
                    .then(lit(NULL))
                    .when(flat)
                    .then(lit(0.0))
                    .otherwise((x - mean) / sd)
            }
            Normalization::MinMax => {
                let lo = window(x.clone().min());
                let range = window(x.clone().max()) - lo.clone();
                when(missing)
                    .then(lit(NULL))
                    .when(range.clone().lt(lit(1e-10)))
                    .then(lit(0.5))
                    .otherwise((x - lo) / range)
            }
            Normalization::Percentile => {
                let rank = window(x.clone().rank(
                    RankOptions {
                        method: RankMethod::Average,
                        descending: false,
                    },
                    None,
                ));
                let n = window(x.count()).cast(DataType::Float64);
                when(missing).then(lit(NULL)).otherwise(rank / n)
            }
        }
    }
}

impl fmt::Display for Normalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
