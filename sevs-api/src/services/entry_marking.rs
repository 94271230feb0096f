//! Venue entry marking and the entry ledger views
//!
//! An entry is accepted at most once per (participant, venue, scope). With
//! `DuplicateScope::Ever` the scope is a fixed marker; with
//! `DuplicateScope::Day` it is the local calendar day of the scan. The
//! UNIQUE constraint on that triple is the only duplicate check, so two
//! scans racing each other produce exactly one entry.

use super::required;
use crate::db::entries::{self, NewEntry};
use crate::db::participants;
use serde::Serialize;
use sevs_common::api::AuthContext;
use sevs_common::config::DuplicateScope;
use sevs_common::db::{Entry, EntryStats, EntryWithParticipant, Participant, DEDUPE_SCOPE_EVER};
use sevs_common::error::is_unique_violation;
use sevs_common::time::{local_day_bounds, local_day_key, now, parse_date, to_millis};
use sevs_common::{Error, Result};
use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

/// Successfully recorded entry
#[derive(Debug, Clone, Serialize)]
pub struct MarkedEntry {
    pub participant: Participant,
    pub entry: Entry,
}

/// Participant plus every entry they have, newest first
#[derive(Debug, Clone, Serialize)]
pub struct EntryHistory {
    pub participant: Participant,
    pub entries: Vec<Entry>,
}

/// Admin listing filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    pub venue: Option<String>,
    pub date: Option<NaiveDate>,
}

impl EntryFilter {
    /// Build from raw query values; a venue of `all` (or blank) means any
    pub fn from_query(venue: Option<&str>, date: Option<&str>) -> Result<Self> {
        let venue = venue
            .map(str::trim)
            .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
            .map(str::to_string);
        let date = match date.map(str::trim).filter(|d| !d.is_empty()) {
            Some(raw) => Some(parse_date(raw)?),
            None => None,
        };
        Ok(Self { venue, date })
    }
}

/// Scope key stored alongside an entry made at `timestamp_ms`
pub fn dedupe_scope_key(scope: DuplicateScope, timestamp_ms: i64) -> String {
    match scope {
        DuplicateScope::Ever => DEDUPE_SCOPE_EVER.to_string(),
        DuplicateScope::Day => local_day_key(timestamp_ms),
    }
}

/// Record that the participant holding `barcode` entered `venue`
pub async fn mark_entry(
    pool: &SqlitePool,
    scope: DuplicateScope,
    barcode: Option<&str>,
    venue: Option<&str>,
    actor: &AuthContext,
) -> Result<MarkedEntry> {
    let [barcode, venue] = required([barcode, venue], "Barcode & venue required")?;

    let participant = participants::find_by_barcode(pool, barcode)
        .await?
        .ok_or_else(|| Error::NotFound("Invalid barcode".to_string()))?;

    let timestamp_ms = to_millis(now());
    let new_entry = NewEntry {
        id: Uuid::new_v4().to_string(),
        participant_id: participant.id.clone(),
        venue: venue.to_string(),
        timestamp_ms,
        staff_id: actor.staff_id.clone(),
        dedupe_scope: dedupe_scope_key(scope, timestamp_ms),
    };

    match entries::insert(pool, &new_entry).await {
        Ok(entry) => {
            info!(
                participant_id = %participant.id,
                venue = %entry.venue,
                staff_id = %entry.staff_id,
                "Entry recorded"
            );
            Ok(MarkedEntry { participant, entry })
        }
        Err(err) if is_unique_violation(&err) => {
            let existing = entries::find_in_scope(
                pool,
                &new_entry.participant_id,
                &new_entry.venue,
                &new_entry.dedupe_scope,
            )
            .await?
            .ok_or_else(|| {
                Error::Internal("Duplicate entry reported but no entry found".to_string())
            })?;

            debug!(
                participant_id = %participant.id,
                venue = %existing.venue,
                "Duplicate entry rejected"
            );
            Err(Error::AlreadyEntered {
                venue: existing.venue,
                timestamp: existing.timestamp,
            })
        }
        Err(err) => Err(err.into()),
    }
}

/// Entry history for the participant holding `barcode`
pub async fn entry_history(pool: &SqlitePool, barcode: &str) -> Result<EntryHistory> {
    let participant = participants::find_by_barcode(pool, barcode)
        .await?
        .ok_or_else(|| Error::NotFound("Participant not found".to_string()))?;
    let entries = entries::for_participant(pool, &participant.id).await?;

    Ok(EntryHistory {
        participant,
        entries,
    })
}

/// Admin listing of entries, newest first
pub async fn list_entries(
    pool: &SqlitePool,
    filter: &EntryFilter,
) -> Result<Vec<EntryWithParticipant>> {
    let range = filter.date.map(local_day_bounds);
    Ok(entries::list(pool, filter.venue.as_deref(), range).await?)
}

/// Aggregate counts over the whole ledger
pub async fn entry_stats(pool: &SqlitePool) -> Result<EntryStats> {
    Ok(entries::stats(pool).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::participants::{set_barcode, upsert, ParticipantRecord};
    use sevs_common::db::{init_database_in_memory, Role};

    fn coordinator() -> AuthContext {
        AuthContext {
            user_id: "s1".to_string(),
            staff_id: "COORD001".to_string(),
            role: Role::Coordinator,
        }
    }

    async fn setup() -> SqlitePool {
        let pool = init_database_in_memory().await.unwrap();
        for (id, reference, email, barcode) in [
            ("p1", "REF1", "a@x.com", "BC1"),
            ("p2", "REF2", "b@x.com", "BC2"),
        ] {
            let record = ParticipantRecord {
                reference_no: reference.to_string(),
                email: email.to_string(),
                ..Default::default()
            };
            upsert(&pool, id, &record, 0).await.unwrap();
            set_barcode(&pool, email, Some(barcode), 0).await.unwrap();
        }
        pool
    }

    #[test]
    fn test_entry_filter_from_query() {
        assert_eq!(
            EntryFilter::from_query(Some("all"), None).unwrap(),
            EntryFilter::default()
        );
        assert_eq!(
            EntryFilter::from_query(Some("ALL"), Some("")).unwrap(),
            EntryFilter::default()
        );

        let filter = EntryFilter::from_query(Some("MainHall"), Some("2025-03-01")).unwrap();
        assert_eq!(filter.venue.as_deref(), Some("MainHall"));
        assert_eq!(filter.date, NaiveDate::from_ymd_opt(2025, 3, 1));

        assert!(matches!(
            EntryFilter::from_query(None, Some("01/03/2025")),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_dedupe_scope_key() {
        assert_eq!(dedupe_scope_key(DuplicateScope::Ever, 0), "*");
        let day = dedupe_scope_key(DuplicateScope::Day, to_millis(now()));
        assert_eq!(day.len(), 10);
        assert_eq!(day, local_day_key(to_millis(now())));
    }

    #[tokio::test]
    async fn test_mark_entry_once_per_venue() {
        let pool = setup().await;
        let actor = coordinator();

        let marked = mark_entry(&pool, DuplicateScope::Ever, Some("BC1"), Some("MainHall"), &actor)
            .await
            .unwrap();
        assert_eq!(marked.participant.id, "p1");
        assert_eq!(marked.entry.staff_id, "COORD001");

        let err = mark_entry(&pool, DuplicateScope::Ever, Some("BC1"), Some("MainHall"), &actor)
            .await
            .unwrap_err();
        match err {
            Error::AlreadyEntered { venue, timestamp } => {
                assert_eq!(venue, "MainHall");
                assert_eq!(timestamp, marked.entry.timestamp);
            }
            other => panic!("expected AlreadyEntered, got {:?}", other),
        }

        // Another venue is a separate slot
        mark_entry(&pool, DuplicateScope::Ever, Some("BC1"), Some("Hall-B"), &actor)
            .await
            .unwrap();

        let history = entry_history(&pool, "BC1").await.unwrap();
        assert_eq!(history.entries.len(), 2);
        assert_eq!(history.entries[0].venue, "Hall-B");
    }

    #[tokio::test]
    async fn test_day_scope_blocks_same_day() {
        let pool = setup().await;
        let actor = coordinator();

        mark_entry(&pool, DuplicateScope::Day, Some("BC2"), Some("MainHall"), &actor)
            .await
            .unwrap();
        let err = mark_entry(&pool, DuplicateScope::Day, Some("BC2"), Some("MainHall"), &actor)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyEntered { .. }));
    }

    #[tokio::test]
    async fn test_day_scope_ignores_previous_days() {
        let pool = setup().await;
        let yesterday_ms = to_millis(now()) - 36 * 3600 * 1000;
        entries::insert(
            &pool,
            &NewEntry {
                id: "old".to_string(),
                participant_id: "p1".to_string(),
                venue: "MainHall".to_string(),
                timestamp_ms: yesterday_ms,
                staff_id: "COORD001".to_string(),
                dedupe_scope: dedupe_scope_key(DuplicateScope::Day, yesterday_ms),
            },
        )
        .await
        .unwrap();

        let marked = mark_entry(&pool, DuplicateScope::Day, Some("BC1"), Some("MainHall"), &coordinator())
            .await
            .unwrap();
        assert_ne!(marked.entry.id, "old");
        assert_eq!(entry_history(&pool, "BC1").await.unwrap().entries.len(), 2);
    }

    #[tokio::test]
    async fn test_mark_entry_rejects_bad_input() {
        let pool = setup().await;
        let actor = coordinator();

        let err = mark_entry(&pool, DuplicateScope::Ever, Some("BC1"), None, &actor)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(ref msg) if msg == "Barcode & venue required"));

        let err = mark_entry(&pool, DuplicateScope::Ever, Some("NOPE"), Some("MainHall"), &actor)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(ref msg) if msg == "Invalid barcode"));

        // Barcodes match exactly
        let err = mark_entry(&pool, DuplicateScope::Ever, Some("bc1"), Some("MainHall"), &actor)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_history_unknown_barcode() {
        let pool = setup().await;
        assert!(matches!(
            entry_history(&pool, "NOPE").await,
            Err(Error::NotFound(_))
        ));
        let empty = entry_history(&pool, "BC2").await.unwrap();
        assert!(empty.entries.is_empty());
    }

    #[tokio::test]
    async fn test_list_today_and_stats() {
        let pool = setup().await;
        let actor = coordinator();
        mark_entry(&pool, DuplicateScope::Ever, Some("BC1"), Some("MainHall"), &actor)
            .await
            .unwrap();
        mark_entry(&pool, DuplicateScope::Ever, Some("BC2"), Some("MainHall"), &actor)
            .await
            .unwrap();

        let today = chrono::Local::now().date_naive();
        let filter = EntryFilter {
            venue: Some("MainHall".to_string()),
            date: Some(today),
        };
        assert_eq!(list_entries(&pool, &filter).await.unwrap().len(), 2);

        let other_day = EntryFilter {
            venue: None,
            date: today.pred_opt(),
        };
        assert!(list_entries(&pool, &other_day).await.unwrap().is_empty());

        let stats = entry_stats(&pool).await.unwrap();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.unique_participants, 2);
    }
}
