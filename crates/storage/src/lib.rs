//! # Fundrank Storage
//!
//! File I/O for the ranking pipeline: partitioned dataset discovery and
//! CSV / Parquet frame reading and writing. The format is always chosen by
//! file extension.

pub mod csv_io;
pub mod dataset;
pub mod error;
pub mod parquet_io;

pub use dataset::{load_datasets, load_partitioned_dataset, partition_files};
pub use error::StorageError;

use polars::prelude::DataFrame;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Parquet,
    Csv,
}

fn format_of(path: &Path) -> Result<Format, StorageError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("parquet") => Ok(Format::Parquet),
        Some(ext) if ext.eq_ignore_ascii_case("csv") => Ok(Format::Csv),
        _ => Err(StorageError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Reads a `.parquet` or `.csv` table.
pub fn read_table(path: impl AsRef<Path>) -> Result<DataFrame, StorageError> {
    let path = path.as_ref();
    match format_of(path)? {
        Format::Parquet => parquet_io::read_parquet(path),
        Format::Csv => csv_io::read_csv(path),
    }
}

/// Writes a frame as `.parquet` or `.csv`, creating parent directories.
pub fn write_table(table: &DataFrame, path: impl AsRef<Path>) -> Result<(), StorageError> {
    let path = path.as_ref();
    let format = format_of(path)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| StorageError::io(parent, source))?;
    }
    match format {
        Format::Parquet => parquet_io::write_parquet(table, path)?,
        Format::Csv => csv_io::write_csv(table, path)?,
    }
    tracing::info!(
        path = %path.display(),
        rows = table.height(),
        columns = table.width(),
        "Table written"
    );
    Ok(())
}
