//! Database error classification.
//!
//! Maps raw sqlx errors onto a small set of variants the rest of the
//! application can match on. Constraint names and tables are preserved so the
//! API layer can produce useful messages.

use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum DbError {
    /// Record not found
    #[error("Record not found")]
    NotFound,

    /// Unique constraint violation
    #[error("Unique constraint violation: {constraint:?} on table {table:?}")]
    UniqueViolation {
        constraint: Option<String>,
        table: Option<String>,
    },

    /// Foreign key constraint violation
    #[error("Foreign key constraint violation: {constraint:?} on table {table:?}")]
    ForeignKeyViolation {
        constraint: Option<String>,
        table: Option<String>,
    },

    /// Check constraint violation
    #[error("Check constraint violation: {constraint:?} on table {table:?}")]
    CheckViolation {
        constraint: Option<String>,
        table: Option<String>,
    },

    /// Any other database error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(db_err) => {
                let constraint = db_err.constraint().map(|s| s.to_string());
                let table = db_err.table().map(|s| s.to_string());

                if db_err.is_unique_violation() {
                    DbError::UniqueViolation { constraint, table }
                } else if db_err.is_foreign_key_violation() {
                    DbError::ForeignKeyViolation { constraint, table }
                } else if db_err.is_check_violation() {
                    DbError::CheckViolation { constraint, table }
                } else {
                    DbError::Other(anyhow::Error::from(err))
                }
            }
            _ => DbError::Other(anyhow::Error::from(err)),
        }
    }
}

/// Type alias for database operation results
pub type Result<T> = std::result::Result<T, DbError>;
