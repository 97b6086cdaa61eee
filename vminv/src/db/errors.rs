use thiserror::Error;

/// Unified error type for database operations that application code can handle
#[derive(Error, Debug)]
pub enum DbError {
    /// Entity not found by the given identifier
    #[error("Entity not found")]
    NotFound,

    /// Unique constraint violation
    #[error("Unique constraint violation")]
    UniqueViolation {
        table: Option<String>,
        column: Option<String>,
        message: String,
    },

    /// Foreign key constraint violation
    #[error("Foreign key constraint violation")]
    ForeignKeyViolation { message: String },

    /// Check constraint violation
    #[error("Check constraint violation")]
    CheckViolation { message: String },

    /// Catch-all for non-recoverable errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convert from sqlx::Error using proper sqlx error categorization
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    // SQLite doesn't expose constraint()/table() accessors, so the
                    // offending table and column are parsed out of the message,
                    // e.g. "UNIQUE constraint failed: users.email"
                    let (table, column) = extract_conflicting_column(db_err.message());

                    DbError::UniqueViolation {
                        table,
                        column,
                        message: db_err.message().to_string(),
                    }
                } else if db_err.is_foreign_key_violation() {
                    DbError::ForeignKeyViolation {
                        message: db_err.message().to_string(),
                    }
                } else if db_err.is_check_violation() {
                    DbError::CheckViolation {
                        message: db_err.message().to_string(),
                    }
                } else {
                    // All other database errors are non-recoverable - convert to anyhow
                    DbError::Other(anyhow::Error::from(err))
                }
            }
            // All other sqlx errors are non-recoverable - convert to anyhow with context
            _ => DbError::Other(anyhow::Error::from(err)),
        }
    }
}

/// Extract the conflicting table and column from a SQLite unique violation message.
///
/// SQLite formats these as "UNIQUE constraint failed: table.column" (possibly
/// with further columns for composite indexes; only the first is used).
fn extract_conflicting_column(message: &str) -> (Option<String>, Option<String>) {
    let Some(rest) = message.strip_prefix("UNIQUE constraint failed: ") else {
        return (None, None);
    };

    let first = rest.split(',').next().unwrap_or(rest).trim();
    match first.split_once('.') {
        Some((table, column)) => (Some(table.to_string()), Some(column.to_string())),
        None => (None, None),
    }
}

/// Type alias for database operation results
pub type Result<T> = std::result::Result<T, DbError>;
