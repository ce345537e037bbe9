use thiserror::Error;

/// Errors from filter evaluation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterError {
    /// The filter could not decide visibility for a path.
    #[error("filter evaluation failed: {0}")]
    Evaluation(String),
}

/// Result alias for filter operations.
pub type FilterResult<T> = Result<T, FilterError>;
