use thiserror::Error;

use crate::models::UserId;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    #[error("Length mismatch: expected {expected} values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Unknown user: {0}")]
    UnknownUser(UserId),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// CSV failures reach us only through `Reader::from_reader`, so they are
// decode/shape problems rather than file-system ones.
impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::SchemaViolation(err.to_string())
    }
}
