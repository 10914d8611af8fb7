use crate::error::RankError;
use core_types::to_numeric;
use polars::prelude::*;

/// The best `n` rows of a ranked frame for one profile.
///
/// Rows are ordered by `rank_<profile>`; rows with the unranked sentinel 0
/// are dropped and ties keep frame order. With `latest_in`, only rows whose
/// value in that column is the greatest (e.g. the latest `competencia`) are
/// considered.
pub fn top_funds(
    table: &DataFrame,
    profile: &str,
    n: usize,
    latest_in: Option<&str>,
) -> Result<DataFrame, RankError> {
    let rank_column = format!("rank_{profile}");
    let ranks = table.column(&rank_column).map_err(|_| RankError::NotRanked {
        profile: profile.to_string(),
        column: rank_column.clone(),
    })?;
    let ranks = to_numeric(ranks)?;

    let mut keep = ranks.gt_eq(1.0);
    if let Some(name) = latest_in {
        keep = &keep & &latest(table.column(name)?)?;
    }

    let picked = table.filter(&keep)?;
    let order = ranks.filter(&keep)?.arg_sort(SortOptions {
        maintain_order: true,
        ..Default::default()
    });
    let top = picked.take(&order)?.head(Some(n));
    tracing::debug!(profile = %profile, rows = top.height(), "Top funds selected");
    Ok(top)
}

/// Rows holding the greatest value of `periods`.
///
/// Periods that all read as numbers are compared as numbers, so `202501`
/// is later than `99999` whether the column holds integers or text.
fn latest(periods: &Series) -> Result<BooleanChunked, RankError> {
    if let Ok(numbers) = to_numeric(periods) {
        return Ok(match numbers.max() {
            Some(max) => numbers.equal(max),
            None => BooleanChunked::full(periods.name(), false, periods.len()),
        });
    }
    let max = periods.max_as_series()?;
    Ok(periods.equal(&max)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ranked() -> DataFrame {
        df!(
            "CNPJ_FUNDO_CLASSE" => &["F1", "F2", "F3", "F4", "F5"],
            "competencia" => &["202501", "202502", "202502", "202502", "202501"],
            "rank_balanced" => &[1i64, 3, 0, 2, 2],
        )
        .unwrap()
    }

    fn funds(table: &DataFrame) -> Vec<String> {
        table
            .column("CNPJ_FUNDO_CLASSE")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn orders_by_rank_and_drops_unranked_rows() {
        let top = top_funds(&ranked(), "balanced", 3, None).unwrap();
        assert_eq!(funds(&top), vec!["F1", "F4", "F5"]);
        assert_eq!(top.get_column_names(), ranked().get_column_names());

        let all = top_funds(&ranked(), "balanced", 10, None).unwrap();
        assert_eq!(all.height(), 4);
    }

    #[test]
    fn latest_period_filter() {
        let top = top_funds(&ranked(), "balanced", 5, Some("competencia")).unwrap();
        assert_eq!(funds(&top), vec!["F4", "F2"]);
    }

    #[test]
    fn latest_period_compares_numbers_not_text() {
        let mut table = ranked();
        table
            .with_column(Series::new("competencia", &[9i64, 10, 10, 10, 9]))
            .unwrap();
        let top = top_funds(&table, "balanced", 5, Some("competencia")).unwrap();
        assert_eq!(funds(&top), vec!["F4", "F2"]);

        table
            .with_column(Series::new("competencia", &["99999", "202501", "202501", "202501", "99999"]))
            .unwrap();
        let top = top_funds(&table, "balanced", 5, Some("competencia")).unwrap();
        assert_eq!(funds(&top), vec!["F4", "F2"]);
    }

    #[test]
    fn text_periods_compare_as_text() {
        let mut table = ranked();
        table
            .with_column(Series::new("competencia", &["2025-01", "2025-02", "2025-02", "2025-02", "2025-01"]))
            .unwrap();
        let top = top_funds(&table, "balanced", 5, Some("competencia")).unwrap();
        assert_eq!(funds(&top), vec!["F4", "F2"]);
    }

    #[test]
    fn unranked_profile_is_an_error() {
        assert!(matches!(
            top_funds(&ranked(), "aggressive", 5, None),
            Err(RankError::NotRanked { .. })
        ));
        assert!(matches!(
            top_funds(&ranked(), "balanced", 5, Some("ano")),
            Err(RankError::Polars(_))
        ));
    }
}
