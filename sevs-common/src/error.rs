//! Common error types for SEVS

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Common result type for SEVS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds shared by every SEVS workflow
///
/// Conflicts come in two shapes: a barcode bound to someone else, and an
/// entry already recorded for the same participant and venue. Both are
/// usually the losing side of a race, so neither is logged as a failure.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed required input
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Referenced participant, barcode or staff member does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Barcode already bound to a different participant
    #[error("Barcode already assigned to another participant: {barcode}")]
    BarcodeTaken { barcode: String },

    /// Participant already checked in at this venue
    #[error("Already entered {venue} at {timestamp}")]
    AlreadyEntered {
        venue: String,
        timestamp: DateTime<Utc>,
    },

    /// Missing, malformed or expired credential
    #[error("Not authenticated")]
    Authentication,

    /// Login rejected; unknown identifier and wrong password look the same
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Credential is valid but the role is not allowed
    #[error("Forbidden - insufficient role")]
    Authorization,

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for both invariant-violation variants
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::BarcodeTaken { .. } | Error::AlreadyEntered { .. })
    }
}

/// Whether a store error is a UNIQUE constraint violation
///
/// Workflows use this to turn the losing side of a concurrent write into
/// a conflict instead of a server error.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db_err| db_err.is_unique_violation())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_grouping() {
        assert!(Error::BarcodeTaken { barcode: "BC1".into() }.is_conflict());
        assert!(Error::AlreadyEntered {
            venue: "MainHall".into(),
            timestamp: Utc::now(),
        }
        .is_conflict());
        assert!(!Error::NotFound("x".into()).is_conflict());
        assert!(!Error::Authentication.is_conflict());
    }

    #[test]
    fn test_non_database_error_is_not_unique_violation() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }

    #[tokio::test]
    async fn test_unique_violation_detected() {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query("CREATE TABLE t (v TEXT UNIQUE)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO t (v) VALUES ('a')")
            .execute(&pool)
            .await
            .unwrap();

        let err = sqlx::query("INSERT INTO t (v) VALUES ('a')")
            .execute(&pool)
            .await
            .unwrap_err();

        assert!(is_unique_violation(&err));
    }
}
