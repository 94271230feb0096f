//! Barcode binding endpoints

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use sevs_common::db::Participant;

use crate::error::ApiResult;
use crate::services::barcode_binding;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AssignBarcodeRequest {
    pub email: Option<String>,
    pub barcode: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeassignBarcodeRequest {
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BarcodeResponse {
    pub message: String,
    pub participant: Participant,
}

/// POST /assign-barcode
pub async fn assign_barcode(
    State(state): State<AppState>,
    body: Result<Json<AssignBarcodeRequest>, JsonRejection>,
) -> ApiResult<Json<BarcodeResponse>> {
    let Json(req) = body?;
    let participant =
        barcode_binding::assign_barcode(&state.db, req.email.as_deref(), req.barcode.as_deref())
            .await?;

    Ok(Json(BarcodeResponse {
        message: "Barcode assigned successfully".to_string(),
        participant,
    }))
}

/// POST /deassign-barcode
pub async fn deassign_barcode(
    State(state): State<AppState>,
    body: Result<Json<DeassignBarcodeRequest>, JsonRejection>,
) -> ApiResult<Json<BarcodeResponse>> {
    let Json(req) = body?;
    let participant = barcode_binding::deassign_barcode(&state.db, req.email.as_deref()).await?;

    Ok(Json(BarcodeResponse {
        message: "Barcode deassigned successfully".to_string(),
        participant,
    }))
}
