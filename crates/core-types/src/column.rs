use crate::error::CoreError;
use polars::prelude::*;

/// One cell read as a number.
#[derive(Debug, Clone, PartialEq)]
pub enum NumericCell {
    Missing,
    Number(f64),
    /// Text that does not parse as a number, kept verbatim.
    Invalid(String),
}

fn parse_cell(cell: Option<&str>) -> NumericCell {
    match cell {
        None => NumericCell::Missing,
        Some(text) => text
            .trim()
            .parse::<f64>()
            .map_or_else(|_| NumericCell::Invalid(text.to_string()), NumericCell::Number),
    }
}

/// Reads every cell of `series` as a number.
///
/// Numeric and boolean series are cast; anything else is rendered as text
/// and parsed, ignoring surrounding whitespace.
pub fn numeric_cells(series: &Series) -> Result<Vec<NumericCell>, CoreError> {
    let dtype = series.dtype();
    if dtype.is_numeric() || dtype == &DataType::Boolean {
        let numbers = series.cast(&DataType::Float64)?;
        return Ok(numbers
            .f64()?
            .into_iter()
            .map(|v| v.map_or(NumericCell::Missing, NumericCell::Number))
            .collect());
    }
    Ok(to_text(series)?.into_iter().map(parse_cell).collect())
}

/// Converts `series` into nullable floats named like the series.
///
/// A cell that is not numeric is an error, never a silent zero or missing
/// value.
pub fn to_numeric(series: &Series) -> Result<Float64Chunked, CoreError> {
    numeric_cells(series)?
        .into_iter()
        .enumerate()
        .map(|(row, cell)| match cell {
            NumericCell::Missing => Ok(None),
            NumericCell::Number(v) => Ok(Some(v)),
            NumericCell::Invalid(value) => Err(CoreError::NotNumeric {
                column: series.name().to_string(),
                row,
                value,
            }),
        })
        .collect::<Result<Float64Chunked, _>>()
        .map(|values| values.with_name(series.name()))
}

/// Replaces NaN and infinities with missing values.
pub fn finite(values: &Float64Chunked) -> Float64Chunked {
    values
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect::<Float64Chunked>()
        .with_name(values.name())
}

/// Renders `series` as text, the way group keys and CSV cells are written.
pub fn to_text(series: &Series) -> Result<StringChunked, CoreError> {
    let text = series.cast(&DataType::String)?;
    Ok(text.str()?.clone())
}
