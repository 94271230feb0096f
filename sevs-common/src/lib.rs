//! # SEVS Common Library
//!
//! Shared code for the Smart Entry Validation Service:
//! - Error taxonomy used by every workflow
//! - Bootstrap configuration loading
//! - Database initialization and shared models
//! - Credential primitives (password hashes, bearer tokens)
//! - Time helpers for the entry ledger

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
