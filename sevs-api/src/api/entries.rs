//! Entry marking and ledger endpoints

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use sevs_common::api::AuthContext;
use sevs_common::db::{Entry, EntryStats, EntryWithParticipant, Participant};

use crate::error::ApiResult;
use crate::services::entry_marking::{self, EntryFilter, EntryHistory};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct MarkEntryRequest {
    pub barcode: Option<String>,
    pub venue: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MarkEntryResponse {
    pub success: bool,
    pub message: String,
    pub participant: Participant,
    pub entry: Entry,
}

#[derive(Debug, Deserialize)]
pub struct EntryListQuery {
    pub venue: Option<String>,
    pub date: Option<String>,
}

/// POST /mark-entry
pub async fn mark_entry(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    body: Result<Json<MarkEntryRequest>, JsonRejection>,
) -> ApiResult<Json<MarkEntryResponse>> {
    let Json(req) = body?;
    let marked = entry_marking::mark_entry(
        &state.db,
        state.duplicate_scope,
        req.barcode.as_deref(),
        req.venue.as_deref(),
        &ctx,
    )
    .await?;

    Ok(Json(MarkEntryResponse {
        success: true,
        message: "Entry recorded".to_string(),
        participant: marked.participant,
        entry: marked.entry,
    }))
}

/// GET /entries/:barcode
pub async fn entry_history(
    State(state): State<AppState>,
    Path(barcode): Path<String>,
) -> ApiResult<Json<EntryHistory>> {
    Ok(Json(entry_marking::entry_history(&state.db, &barcode).await?))
}

/// GET /entries/all?venue&date (admin)
pub async fn list_entries(
    State(state): State<AppState>,
    query: Result<Query<EntryListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<EntryWithParticipant>>> {
    let Query(params) = query?;
    let filter = EntryFilter::from_query(params.venue.as_deref(), params.date.as_deref())?;

    Ok(Json(entry_marking::list_entries(&state.db, &filter).await?))
}

/// GET /entries/stats (admin)
pub async fn entry_stats(State(state): State<AppState>) -> ApiResult<Json<EntryStats>> {
    Ok(Json(entry_marking::entry_stats(&state.db).await?))
}
