//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)        Domain rule (CoreError)              │
//! │       │                                 │                               │
//! │       ▼                                 ▼                               │
//! │  DbError (this module) ← constraint kind, stock shortfall, ...         │
//! │       │                                                                 │
//! │       ├──► AuthError::Storage   (login only)                           │
//! │       ▼                                                                 │
//! │  Forms layer shows the message                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use softx_core::{CoreError, ValidationError};
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - A sale is finalized for a product id that does not exist
    /// - `fetch_one` returns no rows
    ///
    /// Updates and deletes of missing ids are no-ops and never return this.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Duplicate CPF, CNPJ or e-mail on insert or update
    #[error("Duplicate value for {field}")]
    UniqueViolation { field: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Product pointing at a supplier that does not exist
    /// - Deleting a product or client that sales still reference
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation (role, permission, ledger kind).
    #[error("Check constraint violation: {message}")]
    CheckViolation { message: String },

    /// Stock decrement would go below zero. Nothing was written.
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: i64,
        available: i64,
        requested: i64,
    },

    /// Input rejected before reaching storage.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Business rule violation from softx-core.
    #[error(transparent)]
    Domain(CoreError),

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file can't be created
    /// - Data directory can't be resolved or created
    /// - File permissions issue
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Password hashing failed.
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// True for duplicate CPF/CNPJ/e-mail errors.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation { .. })
    }
}

/// Stock shortfalls keep their own variant; the rest is wrapped.
impl From<CoreError> for DbError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InsufficientStock {
                product_id,
                available,
                requested,
            } => DbError::InsufficientStock {
                product_id,
                available,
                requested,
            },
            CoreError::Validation(v) => DbError::Validation(v),
            other => DbError::Domain(other),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → constraint kind reported by the driver
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message().to_string();

                if db_err.is_unique_violation() {
                    // "UNIQUE constraint failed: clientes.cpf_cliente"
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation { field }
                } else if db_err.is_foreign_key_violation() {
                    DbError::ForeignKeyViolation { message: msg }
                } else if db_err.is_check_violation() {
                    DbError::CheckViolation { message: msg }
                } else {
                    DbError::QueryFailed(msg)
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Authentication Error
// =============================================================================

/// Why a login attempt failed.
///
/// Unknown username, wrong password and an unreadable stored hash all map to
/// `InvalidCredentials`. Database failures are `Storage`.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Authentication unavailable: {0}")]
    Storage(#[from] DbError),
}
