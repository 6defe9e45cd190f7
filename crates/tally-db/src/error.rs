//! # Database Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sqlx::Error / MigrateError / CoreError (row decoding)                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError                                                               │
//! │       │                                                                 │
//! │       ├── dashboard reads:  NotFound → 404, rest → 500                 │
//! │       └── sale recorder:    RecordError::Persistence, logged only      │
//! │                             "Database Error: Failed to Create Sale."   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::error::ErrorKind;
use tally_core::CoreError;
use thiserror::Error;

/// Which schema rule a write broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// `users.email` taken.
    Unique,
    /// Sale by an unknown user, or a line for an unknown item.
    ForeignKey,
    /// A `CHECK` on prices, quantities or enum columns.
    Check,
    NotNull,
}

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The store refused a write.
    #[error("{kind:?} constraint failed: {detail}")]
    Constraint { kind: ConstraintKind, detail: String },

    /// Opening the database or acquiring a pooled connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Begin or commit of a write transaction failed.
    #[error("Transaction failed: {0}")]
    Transaction(String),

    #[error("Query failed: {0}")]
    Query(String),

    /// A stored value could not be decoded into a domain type.
    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

impl DbError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DbError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let kind = match db_err.kind() {
                    ErrorKind::UniqueViolation => ConstraintKind::Unique,
                    ErrorKind::ForeignKeyViolation => ConstraintKind::ForeignKey,
                    ErrorKind::CheckViolation => ConstraintKind::Check,
                    ErrorKind::NotNullViolation => ConstraintKind::NotNull,
                    _ => return DbError::Query(db_err.message().to_string()),
                };
                DbError::Constraint {
                    kind,
                    detail: db_err.message().to_string(),
                }
            }

            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DbError::Connection(err.to_string())
            }

            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                DbError::InvalidData(err.to_string())
            }

            _ => DbError::Query(err.to_string()),
        }
    }
}

impl From<CoreError> for DbError {
    fn from(err: CoreError) -> Self {
        DbError::InvalidData(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
