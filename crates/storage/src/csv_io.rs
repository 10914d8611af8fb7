use crate::error::StorageError;
use core_types::to_text;
use polars::prelude::*;
use std::path::Path;

/// Reads a CSV file with a header row. Every column is loaded as text and
/// empty fields become nulls.
pub fn read_csv(path: &Path) -> Result<DataFrame, StorageError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];

    for record in reader.records() {
        let record = record?;
        for (column, field) in cells.iter_mut().zip(record.iter()) {
            column.push((!field.is_empty()).then(|| field.to_string()));
        }
    }

    let columns: Vec<Series> = headers
        .iter()
        .zip(&cells)
        .map(|(name, values)| Series::new(name, values.as_slice()))
        .collect();
    Ok(DataFrame::new(columns)?)
}

/// Writes a frame as CSV with a header row; nulls are empty fields.
pub fn write_csv(frame: &DataFrame, path: &Path) -> Result<(), StorageError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(frame.get_column_names())?;

    let columns = frame
        .get_columns()
        .iter()
        .map(to_text)
        .collect::<Result<Vec<_>, _>>()?;
    for row in 0..frame.height() {
        let record: Vec<&str> = columns
            .iter()
            .map(|c| c.get(row).unwrap_or_default())
            .collect();
        writer.write_record(&record)?;
    }
    writer
        .flush()
        .map_err(|source| StorageError::io(path, source))?;
    Ok(())
}
