use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unknown category '{0}'")]
    InvalidCategory(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Errors specific to the variation derivation.
///
/// `DivisionUndefined` is not a hard failure: read-side callers translate it
/// to "variation unavailable".
#[derive(Error, Debug)]
pub enum VariationError {
    #[error("previous value is zero, variation undefined")]
    DivisionUndefined,

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
