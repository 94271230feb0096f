//! Database initialization
//!
//! Creates the database file on first run and brings the schema up
//! idempotently on every start. The UNIQUE constraints declared here are
//! what keeps barcode binding and entry marking correct under concurrent
//! requests, so they must never be relaxed into application-level checks.

use crate::config::PoolSettings;
use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// How long a writer waits on a locked database before failing
const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Marker stored in `entries.dedupe_scope` when duplicates are blocked forever
pub const DEDUPE_SCOPE_EVER: &str = "*";

/// Open (creating if needed) the database and ensure the schema exists
pub async fn init_database(db_path: &Path, settings: &PoolSettings) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Pragmas go on the connect options so every pooled connection gets them
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// Single-connection in-memory database with the full schema
///
/// Every in-memory connection is its own database, so the pool is capped
/// at one connection that is never recycled.
pub async fn init_database_in_memory() -> Result<SqlitePool> {
    let options = "sqlite::memory:"
        .parse::<SqliteConnectOptions>()?
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables and indexes (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_staff_table(pool).await?;
    create_participants_table(pool).await?;
    create_entries_table(pool).await?;
    create_settings_table(pool).await?;
    Ok(())
}

async fn create_staff_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS staff (
            id TEXT PRIMARY KEY,
            staff_id TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'STAFF'
                CHECK (role IN ('ADMIN', 'COORDINATOR', 'STAFF')),
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_participants_table(pool: &SqlitePool) -> Result<()> {
    // barcode is UNIQUE but nullable: SQLite allows any number of NULLs,
    // which is exactly "unassigned"
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS participants (
            id TEXT PRIMARY KEY,
            reference_no TEXT NOT NULL UNIQUE,
            prefix TEXT NOT NULL DEFAULT '',
            name TEXT NOT NULL DEFAULT '',
            gender TEXT NOT NULL DEFAULT '',
            designation TEXT NOT NULL DEFAULT '',
            institution TEXT NOT NULL DEFAULT '',
            institute_address TEXT NOT NULL DEFAULT '',
            state TEXT NOT NULL DEFAULT '',
            country TEXT NOT NULL DEFAULT '',
            email TEXT NOT NULL UNIQUE,
            mobile_no TEXT NOT NULL DEFAULT '',
            registered_category TEXT NOT NULL DEFAULT '',
            paper_id TEXT NOT NULL DEFAULT '',
            registration_date TEXT NOT NULL DEFAULT '',
            transaction_id TEXT NOT NULL DEFAULT '',
            invoice_no TEXT NOT NULL DEFAULT '',
            amount_paid REAL,
            barcode TEXT UNIQUE,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_participants_created_at ON participants(created_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_entries_table(pool: &SqlitePool) -> Result<()> {
    // dedupe_scope is '*' (one entry per venue ever) or a local YYYY-MM-DD
    // (one entry per venue per day)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS entries (
            id TEXT PRIMARY KEY,
            participant_id TEXT NOT NULL REFERENCES participants(id),
            venue TEXT NOT NULL,
            timestamp INTEGER NOT NULL,
            staff_id TEXT NOT NULL,
            dedupe_scope TEXT NOT NULL,
            UNIQUE (participant_id, venue, dedupe_scope)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_entries_timestamp ON entries(timestamp)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_entries_venue ON entries(venue)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Key-value store for generated runtime values (token signing secret)
async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
