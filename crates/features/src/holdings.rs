//! Portfolio-composition features over CDA holdings rows.
//!
//! Every function weights rows by their final market position
//! (`VL_MERC_POS_FINAL`). Rows without a position do not contribute, and a
//! group whose total position is zero yields a missing value.

use crate::custom::CustomAggregation;
use crate::group::GroupView;
use configuration::RecipeArg;
use polars::prelude::*;

pub const POSITION_VALUE: &str = "VL_MERC_POS_FINAL";
pub const ASSET_CLASS: &str = "TP_APLIC";
pub const RELATED_ISSUER: &str = "EMISSOR_LIGADO";
pub const ISSUER_ID: &str = "CPF_CNPJ_EMISSOR";

/// Share of the position held in a list of asset classes.
///
/// `args: [[Debêntures, CRI, ...]]`
#[derive(Debug, Clone, Copy)]
pub struct CreditShare;

impl CustomAggregation for CreditShare {
    fn name(&self) -> &str {
        "credito_share_feature_fn"
    }

    fn required_columns(&self) -> &[&str] {
        &[POSITION_VALUE, ASSET_CLASS]
    }

    fn validate_args(&self, args: &[RecipeArg]) -> Result<(), String> {
        asset_classes(args).map(|_| ())
    }

    fn aggregate(&self, group: &GroupView<'_>, args: &[RecipeArg]) -> Result<Option<f64>, String> {
        let classes = asset_classes(args)?;
        let positions = group.numbers(POSITION_VALUE)?;
        let in_class: BooleanChunked = group
            .texts(ASSET_CLASS)?
            .into_iter()
            .map(|kind| kind.is_some_and(|k| classes.iter().any(|c| c == k)))
            .collect();
        weighted_share(&positions, &in_class)
    }
}

/// Share of the position issued by related parties (`EMISSOR_LIGADO == "S"`).
#[derive(Debug, Clone, Copy)]
pub struct RelatedPartyShare;

impl CustomAggregation for RelatedPartyShare {
    fn name(&self) -> &str {
        "related_party_share_feature_fn"
    }

    fn required_columns(&self) -> &[&str] {
        &[POSITION_VALUE, RELATED_ISSUER]
    }

    fn validate_args(&self, args: &[RecipeArg]) -> Result<(), String> {
        no_args(args)
    }

    fn aggregate(&self, group: &GroupView<'_>, _args: &[RecipeArg]) -> Result<Option<f64>, String> {
        let positions = group.numbers(POSITION_VALUE)?;
        let related: BooleanChunked = group
            .texts(RELATED_ISSUER)?
            .into_iter()
            .map(|flag| flag.map(str::trim) == Some("S"))
            .collect();
        weighted_share(&positions, &related)
    }
}

/// Herfindahl-Hirschman index of issuer concentration.
///
/// Sum of squared issuer weights, where an issuer's weight is its share of the
/// group's position. Rows without an issuer are left out of both sides.
#[derive(Debug, Clone, Copy)]
pub struct IssuerHhi;

impl CustomAggregation for IssuerHhi {
    fn name(&self) -> &str {
        "hhi_feature_fn"
    }

    fn required_columns(&self) -> &[&str] {
        &[POSITION_VALUE, ISSUER_ID]
    }

    fn validate_args(&self, args: &[RecipeArg]) -> Result<(), String> {
        no_args(args)
    }

    fn aggregate(&self, group: &GroupView<'_>, _args: &[RecipeArg]) -> Result<Option<f64>, String> {
        let positions = group.numbers(POSITION_VALUE)?;
        let issuers = group.texts(ISSUER_ID)?;
        let rows = DataFrame::new(vec![
            issuers.with_name(ISSUER_ID).into_series(),
            positions.with_name(POSITION_VALUE).into_series(),
        ])
        .map_err(|e| e.to_string())?;

        let exposure = rows
            .lazy()
            .drop_nulls(None)
            .group_by([col(ISSUER_ID)])
            .agg([col(POSITION_VALUE).sum()])
            .collect()
            .map_err(|e| e.to_string())?;
        let exposure = exposure
            .column(POSITION_VALUE)
            .and_then(|s| s.f64())
            .map_err(|e| e.to_string())?;

        let total = exposure.sum().unwrap_or(0.0);
        if total == 0.0 {
            return Ok(None);
        }
        let weights = exposure / total;
        Ok((&weights * &weights).sum())
    }
}

/// `Σ position · [mask] / Σ position`, or `None` on a zero total.
fn weighted_share(positions: &Float64Chunked, mask: &BooleanChunked) -> Result<Option<f64>, String> {
    let total = positions.sum().unwrap_or(0.0);
    let hit = positions
        .filter(mask)
        .map_err(|e| e.to_string())?
        .sum()
        .unwrap_or(0.0);
    Ok((total != 0.0).then(|| hit / total))
}

fn asset_classes(args: &[RecipeArg]) -> Result<Vec<String>, String> {
    match args {
        [RecipeArg::List(items)] => items
            .iter()
            .map(|item| {
                item.render()
                    .ok_or_else(|| "asset classes must be scalars".to_string())
            })
            .collect(),
        _ => Err("expected a single list of asset classes".to_string()),
    }
}

fn no_args(args: &[RecipeArg]) -> Result<(), String> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(format!("takes no arguments, got {}", args.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::GroupKey;
    use pretty_assertions::assert_eq;

    fn holdings() -> DataFrame {
        df!(
            "CNPJ_FUNDO_CLASSE" => &["F1", "F1", "F1"],
            POSITION_VALUE => &[600.0, 300.0, 100.0],
            ASSET_CLASS => &["Debêntures", "CRI", "Títulos Públicos"],
            RELATED_ISSUER => &["N", "S", "N"],
            ISSUER_ID => &["E1", "E1", "E2"],
        )
        .unwrap()
    }

    fn run_on(function: &dyn CustomAggregation, args: &[RecipeArg], frame: &DataFrame) -> Option<f64> {
        let key = GroupKey(vec![Some("F1".into())]);
        function.aggregate(&GroupView::new(&key, frame), args).unwrap()
    }

    fn run(function: &dyn CustomAggregation, args: &[RecipeArg]) -> Option<f64> {
        run_on(function, args, &holdings())
    }

    fn credit_classes() -> Vec<RecipeArg> {
        vec![RecipeArg::List(vec![
            RecipeArg::Text("Debêntures".into()),
            RecipeArg::Text("CRI".into()),
        ])]
    }

    #[test]
    fn credit_share_weights_by_position() {
        let share = run(&CreditShare, &credit_classes()).unwrap();
        assert!((share - 0.9).abs() < 1e-12);
    }

    #[test]
    fn related_party_share_counts_flagged_rows() {
        let share = run(&RelatedPartyShare, &[]).unwrap();
        assert!((share - 0.3).abs() < 1e-12);
    }

    #[test]
    fn hhi_aggregates_by_issuer() {
        // E1 holds 900 of 1000, E2 holds 100: 0.81 + 0.01
        let hhi = run(&IssuerHhi, &[]).unwrap();
        assert!((hhi - 0.82).abs() < 1e-12);
    }

    #[test]
    fn rows_without_position_or_issuer_are_left_out() {
        let frame = df!(
            POSITION_VALUE => &[Some("500"), None, Some("500")],
            ASSET_CLASS => &["CRI", "CRI", "Ações"],
            ISSUER_ID => &[Some("E1"), Some("E2"), None],
        )
        .unwrap();
        let share = run_on(&CreditShare, &credit_classes(), &frame).unwrap();
        assert!((share - 0.5).abs() < 1e-12);
        assert_eq!(run_on(&IssuerHhi, &[], &frame), Some(1.0));
    }

    #[test]
    fn zero_total_position_is_missing() {
        let empty = holdings().head(Some(0));
        assert_eq!(run_on(&CreditShare, &credit_classes(), &empty), None);
        assert_eq!(run_on(&IssuerHhi, &[], &empty), None);
    }

    #[test]
    fn argument_shapes_are_validated() {
        assert!(CreditShare.validate_args(&credit_classes()).is_ok());
        assert!(CreditShare.validate_args(&[RecipeArg::Text("CRI".into())]).is_err());
        assert!(IssuerHhi.validate_args(&credit_classes()).is_err());
    }
}
