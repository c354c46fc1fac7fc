//! Store error types.

use thiserror::Error;

use super::Table;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Row not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Insert collided with an existing row UUID.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Mutation does not fit the column it targets.
    #[error("constraint violation on {table}.{column}: {reason}")]
    Constraint {
        table: Table,
        column: String,
        reason: String,
    },

    /// Row could not be decoded into its model.
    #[error("schema mismatch on {table}.{column}: {reason}")]
    Schema {
        table: Table,
        column: String,
        reason: String,
    },

    /// Transaction did not complete in time.
    #[error("transaction timed out after {0}s")]
    Timeout(u64),

    /// Internal error.
    #[error("internal: {0}")]
    Internal(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
