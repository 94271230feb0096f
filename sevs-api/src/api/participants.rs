//! Participant search, listing and spreadsheet upload

use axum::{
    extract::multipart::MultipartRejection,
    extract::rejection::QueryRejection,
    extract::{Multipart, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use sevs_common::db::Participant;
use sevs_common::Error;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::services::participant_import::{self, RowError};
use crate::services::participants;
use crate::AppState;

/// Multipart field carrying the spreadsheet
const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub imported: usize,
    pub errors: Vec<RowError>,
}

/// GET /participants/search?query=
pub async fn search_participants(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Participant>>> {
    let Query(params) = query?;
    let found = participants::search_participants(&state.db, params.query.as_deref()).await?;
    Ok(Json(found))
}

/// GET /participants (admin)
pub async fn list_participants(State(state): State<AppState>) -> ApiResult<Json<Vec<Participant>>> {
    Ok(Json(participants::list_participants(&state.db).await?))
}

/// POST /upload-excel (admin, multipart field `file`)
pub async fn upload_excel(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadResponse>> {
    let mut multipart = multipart?;
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(UPLOAD_FIELD) {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            upload = Some((file_name, field.bytes().await?));
            break;
        }
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;
    info!(file = %file_name, size = bytes.len(), "Participant spreadsheet received");

    // Spreadsheet decoding is CPU-bound
    let rows = tokio::task::spawn_blocking(move || participant_import::parse_workbook(bytes.to_vec()))
        .await
        .map_err(|e| Error::Internal(format!("Spreadsheet parser task failed: {}", e)))??;

    let report = participant_import::import_rows(&state.db, &rows).await?;

    Ok(Json(UploadResponse {
        message: format!("{} participants imported.", report.imported),
        imported: report.imported,
        errors: report.errors,
    }))
}
