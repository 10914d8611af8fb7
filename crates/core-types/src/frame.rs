use crate::error::CoreError;
use polars::functions::concat_df_diagonal;
use polars::prelude::*;
use std::collections::BTreeMap;

/// Named input frames, keyed by dataset name.
pub type Datasets = BTreeMap<String, DataFrame>;

pub fn has_column(frame: &DataFrame, name: &str) -> bool {
    frame.get_column_index(name).is_some()
}

/// Stacks frames row-wise.
///
/// The result holds the union of all column names in first-seen order; a
/// frame lacking a column contributes missing cells for it. A column whose
/// type differs between frames is stacked as text.
pub fn stack_frames(frames: &[DataFrame]) -> Result<DataFrame, CoreError> {
    if frames.is_empty() {
        return Ok(DataFrame::default());
    }

    let mut dtypes: BTreeMap<&str, &DataType> = BTreeMap::new();
    let mut mixed: Vec<String> = Vec::new();
    for series in frames.iter().flat_map(|f| f.get_columns()) {
        match dtypes.get(series.name()) {
            None => {
                dtypes.insert(series.name(), series.dtype());
            }
            Some(seen) if *seen != series.dtype() && !mixed.iter().any(|m| m == series.name()) => {
                mixed.push(series.name().to_string());
            }
            Some(_) => {}
        }
    }

    if mixed.is_empty() {
        return Ok(concat_df_diagonal(frames)?);
    }
    let aligned = frames
        .iter()
        .map(|frame| text_columns(frame, &mixed))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(concat_df_diagonal(&aligned)?)
}

/// A copy of `frame` with each of `names` (when present) rendered as text.
pub fn text_columns(frame: &DataFrame, names: &[String]) -> Result<DataFrame, CoreError> {
    let mut out = frame.clone();
    for name in names {
        if let Ok(series) = frame.column(name) {
            out.with_column(series.cast(&DataType::String)?)?;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(frame: &DataFrame, name: &str) -> Vec<Option<String>> {
        frame
            .column(name)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect()
    }

    #[test]
    fn stacking_unions_columns_and_pads_missing_cells() {
        let first = df!("fund" => &["F1"], "value" => &["10"]).unwrap();
        let second = df!("fund" => &["F2", "F3"], "period" => &["202501", "202502"]).unwrap();

        let stacked = stack_frames(&[first, second]).unwrap();

        assert_eq!(stacked.height(), 3);
        assert_eq!(stacked.get_column_names(), ["fund", "value", "period"]);
        assert_eq!(texts(&stacked, "value"), vec![Some("10".into()), None, None]);
        assert_eq!(
            texts(&stacked, "period"),
            vec![None, Some("202501".into()), Some("202502".into())]
        );
    }

    #[test]
    fn mixed_types_are_stacked_as_text() {
        let first = df!("value" => &[1.5f64]).unwrap();
        let second = df!("value" => &["x"]).unwrap();

        let stacked = stack_frames(&[first, second]).unwrap();

        assert_eq!(texts(&stacked, "value"), vec![Some("1.5".into()), Some("x".into())]);
    }

    #[test]
    fn nothing_to_stack_is_an_empty_frame() {
        let stacked = stack_frames(&[]).unwrap();
        assert_eq!(stacked.width(), 0);
        assert!(!has_column(&stacked, "fund"));
    }
}
