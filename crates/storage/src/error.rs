use core_types::CoreError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    #[error("Failed to walk dataset directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Unsupported table format for '{0}' (expected .parquet or .csv)")]
    UnsupportedFormat(PathBuf),

    #[error("Dataset directory not found: {0}")]
    DatasetNotFound(PathBuf),

    #[error("No data.parquet or data.csv partitions under {0}")]
    NoPartitions(PathBuf),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}
