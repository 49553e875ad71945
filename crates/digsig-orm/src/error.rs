//! Error types for the model layer.

use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors that can occur during record operations.
///
/// Engine-side failures (constraint violations, locking, type conversion)
/// are carried unchanged in [`OrmError::Database`].
#[derive(Debug, Error)]
pub enum OrmError {
    /// A database operation failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// No record with the given primary key exists.
    #[error("{table} record not found: {id}")]
    NotFound {
        /// Table that was queried.
        table: &'static str,
        /// Primary key that was looked up.
        id: i64,
    },

    /// A cleaning user with this name already exists for the customer.
    #[error("cleaning user '{name}' already exists for customer {customer}")]
    DuplicateUser {
        /// The rejected user name.
        name: String,
        /// The customer the name is already taken for.
        customer: i64,
    },

    /// A required key is absent from, or has the wrong type in, a JSON document.
    #[error("missing or invalid field: {0}")]
    MissingField(&'static str),

    /// A statistics retention period is negative or reaches outside the
    /// representable time range.
    #[error("invalid statistics retention period: {0}")]
    InvalidRetention(chrono::Duration),

    /// A day count given by the caller is out of range.
    #[error(transparent)]
    InvalidDays(#[from] digsig_types::InvalidDays),

    /// JSON serialization failed.
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OrmError {
    /// Returns `true` if the engine rejected the statement because of a
    /// `NOT NULL`, `CHECK`, `UNIQUE` or foreign-key constraint.
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            Self::Database(err) => err.sqlite_error_code() == Some(ErrorCode::ConstraintViolation),
            _ => false,
        }
    }

    /// Returns `true` for [`OrmError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
