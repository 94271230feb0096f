//! Participant lookup

use crate::db::participants;
use sevs_common::db::Participant;
use sevs_common::{Error, Result};
use sqlx::SqlitePool;

/// Maximum hits returned by a search
pub const SEARCH_LIMIT: i64 = 10;

/// Substring search over email, mobile number, reference number and name
pub async fn search_participants(pool: &SqlitePool, query: Option<&str>) -> Result<Vec<Participant>> {
    let term = query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| Error::Validation("Search query required".to_string()))?;

    Ok(participants::search(pool, term, SEARCH_LIMIT).await?)
}

/// Every participant, newest first
pub async fn list_participants(pool: &SqlitePool) -> Result<Vec<Participant>> {
    Ok(participants::list_all(pool).await?)
}
