//! sevs-api library - event check-in service
//!
//! Staff log in, bind badge barcodes to pre-registered participants and
//! record venue entries; admins get the ledger, aggregate counts and
//! spreadsheet import.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use sevs_common::api::TokenKeys;
use sevs_common::config::DuplicateScope;
use sqlx::SqlitePool;

pub mod api;
pub mod db;
pub mod error;
pub mod server;
pub mod services;

/// Largest accepted spreadsheet upload
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Bearer token signing and verification keys
    pub keys: TokenKeys,
    /// How long a recorded entry blocks a repeat at the same venue
    pub duplicate_scope: DuplicateScope,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, keys: TokenKeys, duplicate_scope: DuplicateScope) -> Self {
        Self {
            db,
            keys,
            duplicate_scope,
            started_at: Utc::now(),
        }
    }
}

/// Build application router
///
/// Login, health and the banner are public; everything else needs a bearer
/// token, and the reporting, listing and import routes need the ADMIN role.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    // Admin routes (ADMIN role, checked after authentication)
    let admin = Router::new()
        .route("/entries/all", get(api::list_entries))
        .route("/entries/stats", get(api::entry_stats))
        .route("/participants", get(api::list_participants))
        .route(
            "/upload-excel",
            post(api::upload_excel).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route_layer(middleware::from_fn(api::require_admin));

    // Protected routes (any authenticated role)
    let protected = Router::new()
        .route("/assign-barcode", post(api::assign_barcode))
        .route("/deassign-barcode", post(api::deassign_barcode))
        .route("/mark-entry", post(api::mark_entry))
        .route("/entries/:barcode", get(api::entry_history))
        .route("/participants/search", get(api::search_participants))
        .merge(admin)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    // Public routes (no authentication)
    let public = Router::new()
        .route("/auth/login", post(api::login))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .with_state(state)
}
