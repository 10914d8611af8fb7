use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Column '{column}' row {row}: value '{value}' is not numeric")]
    NotNumeric {
        column: String,
        row: usize,
        value: String,
    },

    #[error(transparent)]
    Polars(#[from] PolarsError),
}
