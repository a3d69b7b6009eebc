//! # Database Errors
//!
//! ```text
//! sqlx::Error ──► DbError ──► ApiError (apps/api) ──► {"code", "message"}
//!
//! RowNotFound                         NotFound
//! "UNIQUE constraint failed: t.col"   UniqueViolation { field: "col" }
//! "FOREIGN KEY constraint failed"     ForeignKeyViolation
//! "CHECK constraint failed: …"        ConstraintViolation
//! PoolTimedOut                        PoolExhausted
//! ```

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// No row with that id, or no entry for that player in the session.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index rejected the write, e.g. a rename onto a taken name.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A CHECK rejected the row: negative counter, unknown status text.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A stored chip distribution could not be encoded or decoded.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Backup failed: {0}")]
    Backup(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound { .. })
    }

    /// Classifies a SQLite error message by the constraint it names.
    fn from_sqlite_message(msg: &str) -> Self {
        if let Some(columns) = msg.strip_prefix("UNIQUE constraint failed: ") {
            // "players.name" → "name"; composite keys keep the full list
            let field = match columns.split_once('.') {
                Some((_, column)) if !column.contains(',') => column,
                _ => columns,
            };
            return DbError::UniqueViolation {
                field: field.to_string(),
                value: "unknown".to_string(),
            };
        }

        if msg.starts_with("FOREIGN KEY constraint failed") {
            DbError::ForeignKeyViolation {
                message: msg.to_string(),
            }
        } else if msg.starts_with("CHECK constraint failed") {
            DbError::ConstraintViolation(msg.to_string())
        } else {
            DbError::QueryFailed(msg.to_string())
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) => DbError::from_sqlite_message(db_err.message()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Serialization(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let err = DbError::not_found("Session", "sid_20240105_1");
        assert_eq!(err.to_string(), "Session not found: sid_20240105_1");
        assert!(err.is_not_found());

        let err = DbError::duplicate("name", "Alice");
        assert_eq!(err.to_string(), "Duplicate name: 'Alice' already exists");
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_sqlite_messages_classified() {
        assert!(matches!(
            DbError::from_sqlite_message("UNIQUE constraint failed: players.name"),
            DbError::UniqueViolation { ref field, .. } if field == "name"
        ));
        assert!(matches!(
            DbError::from_sqlite_message(
                "UNIQUE constraint failed: entries.session_id, entries.player_id"
            ),
            DbError::UniqueViolation { ref field, .. } if field.contains("player_id")
        ));
        assert!(matches!(
            DbError::from_sqlite_message("FOREIGN KEY constraint failed"),
            DbError::ForeignKeyViolation { .. }
        ));
        assert!(matches!(
            DbError::from_sqlite_message("CHECK constraint failed: seven_two_wins >= 0"),
            DbError::ConstraintViolation(_)
        ));
        assert!(matches!(
            DbError::from_sqlite_message("no such table: chips"),
            DbError::QueryFailed(_)
        ));
    }
}
