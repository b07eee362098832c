//! Error taxonomy for the search pipeline.

use thiserror::Error;

/// Failure inside the storage collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid snapshot: {0}")]
    Snapshot(String),

    #[error("unknown term {0:?}")]
    UnknownTerm(String),

    #[error("invalid posting: {0}")]
    InvalidPosting(String),
}

/// Client-side problem with the raw query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing query")]
    MissingQuery,

    #[error("only stop words or too short")]
    NoMeaningfulTerms,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
