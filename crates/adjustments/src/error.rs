use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdjustmentError {
    #[error("Unknown adjustment '{0}'")]
    UnknownAdjustment(String),

    #[error("Invalid parameter for adjustment '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },
}
