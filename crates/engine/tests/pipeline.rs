use configuration::{PipelineConfig, RecipeArg};
use core_types::{to_numeric, to_text, Datasets};
use engine::{EngineError, Pipeline};
use features::{CustomAggregation, CustomFunctionTable, FeatureError, GroupView};
use polars::prelude::*;
use pretty_assertions::assert_eq;

fn config(yaml: &str) -> PipelineConfig {
    PipelineConfig::from_yaml_str(yaml).unwrap()
}

fn pipeline(yaml: &str) -> Result<Pipeline, EngineError> {
    Pipeline::new(config(yaml), CustomFunctionTable::with_defaults())
}

fn numbers(frame: &DataFrame, name: &str) -> Vec<Option<f64>> {
    to_numeric(frame.column(name).unwrap()).unwrap().into_iter().collect()
}

fn texts(frame: &DataFrame, name: &str) -> Vec<Option<String>> {
    to_text(frame.column(name).unwrap())
        .unwrap()
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect()
}

fn ranks(frame: &DataFrame, name: &str) -> Vec<Option<i64>> {
    frame.column(name).unwrap().i64().unwrap().into_iter().collect()
}

fn approx(actual: &[Option<f64>], expected: &[Option<f64>]) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        match (a, e) {
            (Some(a), Some(e)) => assert!((a - e).abs() < 1e-9, "{a} != {e}"),
            _ => assert_eq!(a, e),
        }
    }
}

fn two_funds() -> Datasets {
    let cda_pl = df!(
        "fund_id" => ["F1", "F2", "F1"],
        "period" => ["202501", "202501", "202501"],
        "VL_PATRIM_LIQ" => ["100", "200", "300"],
    )
    .unwrap();
    Datasets::from([("cda_pl".to_string(), cda_pl)])
}

const TWO_FUNDS: &str = r#"
feature:
  group_keys: [fund_id, period]
  feature_registry:
    cda_pl:
      patrimonio_liq: { method: max, args: [VL_PATRIM_LIQ] }
score:
  size_score: { type: zscore, args: { feature: patrimonio_liq } }
profile:
  growth: { description: "Bigger is better", size_score: 1.0 }
"#;

#[test]
fn end_to_end_two_funds_one_period() {
    let output = pipeline(TWO_FUNDS).unwrap().run(&two_funds()).unwrap();

    assert_eq!(output.features.height(), 2);
    assert_eq!(
        output.features.get_column_names(),
        ["fund_id", "period", "patrimonio_liq"]
    );
    assert_eq!(
        texts(&output.features, "fund_id"),
        vec![Some("F1".to_string()), Some("F2".to_string())]
    );
    assert_eq!(
        numbers(&output.features, "patrimonio_liq"),
        vec![Some(300.0), Some(200.0)]
    );

    assert_eq!(output.scored.height(), 2);
    approx(
        &numbers(&output.scored, "size_score"),
        &[Some(0.5f64.sqrt()), Some(-(0.5f64.sqrt()))],
    );

    assert_eq!(
        &output.ranked.get_column_names()[4..],
        ["score_growth", "rank_growth"]
    );
    assert_eq!(ranks(&output.ranked, "rank_growth"), vec![Some(1), Some(2)]);
}

#[test]
fn unknown_profile_score_is_rejected_before_any_data() {
    let yaml = TWO_FUNDS.replace("size_score: 1.0", "liquidity_score: 1.0");
    let err = pipeline(&yaml).unwrap_err();

    match &err {
        EngineError::UnknownScore { profile, score } => {
            assert_eq!(profile, "growth");
            assert_eq!(score, "liquidity_score");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.is_config_validation());
}

#[test]
fn score_of_undeclared_feature_is_rejected() {
    let yaml = TWO_FUNDS.replace("feature: patrimonio_liq", "feature: n_emissores");
    let err = pipeline(&yaml).unwrap_err();
    assert!(matches!(err, EngineError::UnknownScoreFeature { .. }));
    assert!(err.is_config_validation());

    let no_features = pipeline("score: {}\n").unwrap_err();
    assert!(matches!(
        no_features,
        EngineError::Feature(FeatureError::MissingSection)
    ));
}

#[test]
fn datasets_are_outer_joined_and_missing_sums_rank_zero() {
    let cda_blc = df!(
        "fund_id" => ["F1", "F1", "F2"],
        "period" => ["202501", "202501", "202501"],
        "TP_APLIC" => ["Debêntures", "Títulos Públicos", "CRI"],
        "VL_MERC_POS_FINAL" => [60.0, 40.0, 10.0],
    )
    .unwrap();
    let cda_pl = df!(
        "fund_id" => ["F1", "F3"],
        "period" => ["202501", "202501"],
        "VL_PATRIM_LIQ" => ["1000", "500"],
    )
    .unwrap();
    let datasets = Datasets::from([
        ("cda_blc".to_string(), cda_blc),
        ("cda_pl".to_string(), cda_pl),
    ]);

    let output = pipeline(
        r#"
feature:
  group_keys: [fund_id, period]
  feature_registry:
    cda_blc:
      credito_share: { method: credito_share_feature_fn, args: [[Debêntures, CRI]], adjustment: [clip] }
    cda_pl:
      patrimonio_liq: { method: max, args: [VL_PATRIM_LIQ] }
score:
  credit_risk_score:
    type: zscore
    args: { feature: credito_share, group_by: period }
    adjustment: [invert, coalesce]
  size_score: { type: zscore, args: { feature: patrimonio_liq } }
profiles:
  conservative: { size_score: 0.5, credit_risk_score: 0.5 }
"#,
    )
    .unwrap()
    .run(&datasets)
    .unwrap();

    let features = &output.features;
    assert_eq!(
        texts(features, "fund_id"),
        vec![Some("F1".to_string()), Some("F2".to_string()), Some("F3".to_string())]
    );
    approx(&numbers(features, "credito_share"), &[Some(0.6), Some(1.0), None]);
    assert_eq!(
        numbers(features, "patrimonio_liq"),
        vec![Some(1000.0), None, Some(500.0)]
    );

    // F3 has no holdings rows; coalesce fills its credit score.
    assert_eq!(numbers(&output.scored, "credit_risk_score")[2], Some(0.0));
    // F2 has no size score, so its weighted sum is missing.
    assert_eq!(numbers(&output.ranked, "score_conservative")[1], None);
    assert_eq!(
        ranks(&output.ranked, "rank_conservative"),
        vec![Some(1), Some(0), Some(2)]
    );
}

#[test]
fn data_errors_are_not_config_errors() {
    let mut datasets = two_funds();
    let bad = df!(
        "fund_id" => ["F1"],
        "period" => ["202501"],
        "VL_PATRIM_LIQ" => ["n/a"],
    )
    .unwrap();
    datasets.insert("cda_pl".to_string(), bad);

    let err = pipeline(TWO_FUNDS).unwrap().run(&datasets).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Feature(FeatureError::Computation { .. })
    ));
    assert!(!err.is_config_validation());
}

struct PositionCount;

impl CustomAggregation for PositionCount {
    fn name(&self) -> &str {
        "position_count"
    }

    fn validate_args(&self, args: &[RecipeArg]) -> Result<(), String> {
        if args.is_empty() {
            Ok(())
        } else {
            Err("takes no arguments".to_string())
        }
    }

    fn aggregate(&self, group: &GroupView<'_>, _args: &[RecipeArg]) -> Result<Option<f64>, String> {
        Ok(Some(group.len() as f64))
    }
}

#[test]
fn caller_supplied_functions_are_resolved_by_name() {
    let mut functions = CustomFunctionTable::with_defaults();
    functions.register(PositionCount);
    let pipeline = Pipeline::new(
        config(
            r#"
feature:
  group_keys: [fund_id]
  feature_registry:
    cda_pl:
      n_rows: { method: position_count }
"#,
        ),
        functions,
    )
    .unwrap();

    assert_eq!(pipeline.dataset_names().collect::<Vec<_>>(), vec!["cda_pl"]);
    let output = pipeline.run(&two_funds()).unwrap();
    assert_eq!(numbers(&output.features, "n_rows"), vec![Some(2.0), Some(1.0)]);
    // No scores or profiles: the later stages pass the frame through.
    assert_eq!(output.ranked, output.features);
}

#[test]
fn shipped_pipeline_definition_is_valid() {
    let pipeline = shipped_pipeline();

    assert_eq!(
        pipeline.dataset_names().collect::<Vec<_>>(),
        vec!["cda_blc", "cda_pl"]
    );
    assert_eq!(pipeline.config().profile.len(), 3);
}

fn shipped_pipeline() -> Pipeline {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../pipeline.yaml");
    Pipeline::from_path(&path).unwrap()
}

#[test]
fn shipped_pipeline_counts_distinct_assets_and_credit_classes() {
    // One asset reported three times under different credit instruments.
    let cda_blc = df!(
        "CNPJ_FUNDO_CLASSE" => ["00.000.000/0001-00"; 3],
        "DENOM_SOCIAL" => ["FUNDO RENDA FIXA"; 3],
        "competencia" => ["202501"; 3],
        "CD_ATIVO" => ["ATV1"; 3],
        "TP_APLIC" => ["Cédula de Crédito", "Notas Promissórias", "CRI"],
        "CPF_CNPJ_EMISSOR" => ["11.111.111/0001-11"; 3],
        "EMISSOR_LIGADO" => ["N"; 3],
        "VL_MERC_POS_FINAL" => [100.0, 50.0, 25.0],
    )
    .unwrap();
    let datasets = Datasets::from([("cda_blc".to_string(), cda_blc)]);

    let features = shipped_pipeline().features(&datasets).unwrap();

    assert_eq!(features.height(), 1);
    assert_eq!(numbers(&features, "n_ativos"), vec![Some(1.0)]);
    assert_eq!(numbers(&features, "n_emissores"), vec![Some(1.0)]);
    approx(&numbers(&features, "credito_share"), &[Some(1.0)]);
    approx(&numbers(&features, "issuer_hhi"), &[Some(1.0)]);
}

#[test]
fn shipped_pipeline_takes_log1p_of_net_assets() {
    let cda_pl = df!(
        "CNPJ_FUNDO_CLASSE" => ["A", "B"],
        "DENOM_SOCIAL" => ["FUNDO A", "FUNDO B"],
        "competencia" => ["202501", "202501"],
        "VL_PATRIM_LIQ" => [0.0, 999.0],
    )
    .unwrap();
    let datasets = Datasets::from([("cda_pl".to_string(), cda_pl)]);

    let features = shipped_pipeline().features(&datasets).unwrap();
    approx(&numbers(&features, "log_aum"), &[Some(0.0), Some(1000f64.ln())]);
}
