use crate::error::StorageError;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Reads a Parquet file as-is; column types come from the file schema.
pub fn read_parquet(path: &Path) -> Result<DataFrame, StorageError> {
    let file = File::open(path).map_err(|source| StorageError::io(path, source))?;
    Ok(ParquetReader::new(file).finish()?)
}

/// Writes a frame as a single Parquet file.
pub fn write_parquet(frame: &DataFrame, path: &Path) -> Result<(), StorageError> {
    let mut file = File::create(path).map_err(|source| StorageError::io(path, source))?;
    ParquetWriter::new(&mut file).finish(&mut frame.clone())?;
    Ok(())
}
