//! Concurrency tests for the two store-enforced invariants
//!
//! Uses a file-backed database with a multi-connection pool so requests
//! genuinely overlap:
//! - Racing scans of one barcode at one venue record exactly one entry
//! - Racing assignments of one barcode to different participants bind it once

mod helpers;

use helpers::{seed_participants, PARTICIPANTS};
use sevs_api::services::{barcode_binding, entry_marking};
use sevs_common::api::AuthContext;
use sevs_common::config::{DuplicateScope, PoolSettings};
use sevs_common::db::{init_database, Role};
use sevs_common::Error;
use sqlx::SqlitePool;

const RACERS: usize = 16;

async fn file_pool(dir: &tempfile::TempDir) -> SqlitePool {
    let pool = init_database(&dir.path().join("sevs.db"), &PoolSettings::default())
        .await
        .unwrap();
    seed_participants(&pool).await;
    pool
}

fn scanner(n: usize) -> AuthContext {
    AuthContext {
        user_id: format!("row-{}", n),
        staff_id: format!("STAFF{:03}", n),
        role: Role::Staff,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_scans_record_one_entry() {
    let dir = tempfile::tempdir().unwrap();
    let pool = file_pool(&dir).await;
    barcode_binding::assign_barcode(&pool, Some("a@x.com"), Some("BC100"))
        .await
        .unwrap();

    let handles: Vec<_> = (0..RACERS)
        .map(|n| {
            let pool = pool.clone();
            tokio::spawn(async move {
                entry_marking::mark_entry(
                    &pool,
                    DuplicateScope::Ever,
                    Some("BC100"),
                    Some("MainHall"),
                    &scanner(n),
                )
                .await
            })
        })
        .collect();

    let mut winners = Vec::new();
    let mut conflict_timestamps = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(marked) => winners.push(marked),
            Err(Error::AlreadyEntered { venue, timestamp }) => {
                assert_eq!(venue, "MainHall");
                conflict_timestamps.push(timestamp);
            }
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(winners.len(), 1, "exactly one scan must win");
    assert_eq!(conflict_timestamps.len(), RACERS - 1);
    let winning_timestamp = winners[0].entry.timestamp;
    assert!(conflict_timestamps.iter().all(|t| *t == winning_timestamp));

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entries")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 1);

    let stats = entry_marking::entry_stats(&pool).await.unwrap();
    assert_eq!(stats.total_entries, 1);
    assert_eq!(stats.unique_participants, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_assignments_bind_once() {
    let dir = tempfile::tempdir().unwrap();
    let pool = file_pool(&dir).await;

    let handles: Vec<_> = PARTICIPANTS
        .iter()
        .cycle()
        .take(RACERS)
        .map(|(_, _, _, email)| {
            let pool = pool.clone();
            let email = email.to_string();
            tokio::spawn(async move {
                let result =
                    barcode_binding::assign_barcode(&pool, Some(email.as_str()), Some("BC-RACE")).await;
                (email, result)
            })
        })
        .collect();

    let mut owners = Vec::new();
    for handle in handles {
        let (email, result) = handle.await.unwrap();
        match result {
            Ok(participant) => owners.push(participant.email),
            Err(Error::BarcodeTaken { barcode }) => assert_eq!(barcode, "BC-RACE"),
            Err(other) => panic!("unexpected error for {}: {:?}", email, other),
        }
    }

    // Re-binding by the owner also succeeds, so every success names one participant
    owners.sort();
    owners.dedup();
    assert_eq!(owners.len(), 1, "barcode bound to more than one participant");

    let holders: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM participants WHERE barcode = 'BC-RACE'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(holders, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_scans_at_different_venues_all_succeed() {
    let dir = tempfile::tempdir().unwrap();
    let pool = file_pool(&dir).await;
    barcode_binding::assign_barcode(&pool, Some("b@x.com"), Some("BC200"))
        .await
        .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|n| {
            let pool = pool.clone();
            tokio::spawn(async move {
                let venue = format!("Hall-{}", n);
                entry_marking::mark_entry(
                    &pool,
                    DuplicateScope::Ever,
                    Some("BC200"),
                    Some(venue.as_str()),
                    &scanner(n),
                )
                .await
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stats = entry_marking::entry_stats(&pool).await.unwrap();
    assert_eq!(stats.total_entries, 8);
    assert_eq!(stats.entries_by_venue.len(), 8);
}
