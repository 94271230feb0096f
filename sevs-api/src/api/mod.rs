//! HTTP API handlers for sevs-api

pub mod auth;
pub mod barcodes;
pub mod entries;
pub mod health;
pub mod participants;

pub use auth::{auth_middleware, login, require_admin};
pub use barcodes::{assign_barcode, deassign_barcode};
pub use entries::{entry_history, entry_stats, list_entries, mark_entry};
pub use health::health_routes;
pub use participants::{list_participants, search_participants, upload_excel};
