//! Database queries for sevs-api
//!
//! Free functions over `&SqlitePool` returning `sqlx::Result`, so callers
//! can tell a UNIQUE violation apart from other store failures.

pub mod entries;
pub mod participants;
pub mod staff;
