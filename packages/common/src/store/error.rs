use thiserror::Error;

/// Errors raised by problem, test case and submission stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The record to update does not exist.
    #[error("record not found: {0}")]
    NotFound(String),
    /// The underlying storage failed (connection lost, query rejected, ...).
    #[error("storage backend error: {0}")]
    Backend(String),
}
