//! Entry ledger database operations

use super::participants::qualified_columns;
use sevs_common::db::{Entry, EntryStats, EntryWithParticipant, VenueCount};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

/// Entry about to be inserted
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub id: String,
    pub participant_id: String,
    pub venue: String,
    pub timestamp_ms: i64,
    pub staff_id: String,
    /// `*` or a local `YYYY-MM-DD`
    pub dedupe_scope: String,
}

const ENTRY_COLUMNS: &str = "id, participant_id, venue, timestamp, staff_id";

/// Insert an entry
///
/// Fails with a unique violation when the participant already has an
/// entry for this venue within the same dedupe scope.
pub async fn insert(pool: &SqlitePool, entry: &NewEntry) -> sqlx::Result<Entry> {
    let sql = format!(
        "INSERT INTO entries (id, participant_id, venue, timestamp, staff_id, dedupe_scope)
         VALUES (?, ?, ?, ?, ?, ?)
         RETURNING {}",
        ENTRY_COLUMNS
    );
    sqlx::query_as::<_, Entry>(&sql)
        .bind(&entry.id)
        .bind(&entry.participant_id)
        .bind(&entry.venue)
        .bind(entry.timestamp_ms)
        .bind(&entry.staff_id)
        .bind(&entry.dedupe_scope)
        .fetch_one(pool)
        .await
}

/// The entry occupying a (participant, venue, scope) slot, if any
pub async fn find_in_scope(
    pool: &SqlitePool,
    participant_id: &str,
    venue: &str,
    dedupe_scope: &str,
) -> sqlx::Result<Option<Entry>> {
    let sql = format!(
        "SELECT {} FROM entries WHERE participant_id = ? AND venue = ? AND dedupe_scope = ?",
        ENTRY_COLUMNS
    );
    sqlx::query_as::<_, Entry>(&sql)
        .bind(participant_id)
        .bind(venue)
        .bind(dedupe_scope)
        .fetch_optional(pool)
        .await
}

/// All entries of one participant, newest first
pub async fn for_participant(pool: &SqlitePool, participant_id: &str) -> sqlx::Result<Vec<Entry>> {
    let sql = format!(
        "SELECT {} FROM entries WHERE participant_id = ? ORDER BY timestamp DESC, rowid DESC",
        ENTRY_COLUMNS
    );
    sqlx::query_as::<_, Entry>(&sql)
        .bind(participant_id)
        .fetch_all(pool)
        .await
}

/// Entries joined with their participants, newest first
///
/// `venue` filters on exact venue; `range` is an inclusive millisecond window.
pub async fn list(
    pool: &SqlitePool,
    venue: Option<&str>,
    range: Option<(i64, i64)>,
) -> sqlx::Result<Vec<EntryWithParticipant>> {
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT e.id AS entry_id, e.participant_id, e.venue, e.timestamp, e.staff_id, {} \
         FROM entries e JOIN participants p ON p.id = e.participant_id WHERE 1 = 1",
        qualified_columns("p")
    ));

    if let Some(venue) = venue {
        query.push(" AND e.venue = ").push_bind(venue);
    }
    if let Some((start, end)) = range {
        query
            .push(" AND e.timestamp BETWEEN ")
            .push_bind(start)
            .push(" AND ")
            .push_bind(end);
    }
    query.push(" ORDER BY e.timestamp DESC, e.rowid DESC");

    query
        .build_query_as::<EntryWithParticipant>()
        .fetch_all(pool)
        .await
}

/// Totals, distinct participants and per-venue counts from one snapshot
pub async fn stats(pool: &SqlitePool) -> sqlx::Result<EntryStats> {
    let mut tx = pool.begin().await?;

    let total_entries: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entries")
        .fetch_one(&mut *tx)
        .await?;

    let unique_participants: i64 =
        sqlx::query_scalar("SELECT COUNT(DISTINCT participant_id) FROM entries")
            .fetch_one(&mut *tx)
            .await?;

    let entries_by_venue = sqlx::query_as::<_, VenueCount>(
        "SELECT venue, COUNT(*) AS count FROM entries GROUP BY venue ORDER BY count DESC, venue",
    )
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(EntryStats {
        total_entries,
        unique_participants,
        entries_by_venue,
    })
}
