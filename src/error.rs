use thiserror::Error;

/// Failures the valuator can meet. None of them escape `evaluate`: validation and
/// sales retrieval become verdict messages, a blacklist failure reads as "not
/// blacklisted", persistence is logged and dropped.
#[derive(Debug, Error)]
pub enum ValuationError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Error: failed to fetch sales history - {0}")]
    Retrieval(String),

    #[error("blacklist unavailable: {0}")]
    Blacklist(String),

    #[error("failed to persist listing analysis: {0}")]
    Persistence(String),
}
