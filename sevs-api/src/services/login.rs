//! Staff login

use super::required;
use crate::db::staff;
use serde::Serialize;
use sevs_common::api::{verify_password, TokenKeys, UNMATCHABLE_PASSWORD_HASH};
use sevs_common::db::StaffSummary;
use sevs_common::{Error, Result};
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Issued bearer token plus the identity it represents
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: StaffSummary,
}

/// Authenticate by email or staff code and issue a token
///
/// Unknown identifier and wrong password fail identically, and both pay
/// for one Argon2 verification.
pub async fn login(
    pool: &SqlitePool,
    keys: &TokenKeys,
    identifier: Option<&str>,
    password: Option<&str>,
) -> Result<LoginResponse> {
    let [identifier] = required([identifier], "Identifier & password required")?;
    let password = password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| Error::Validation("Identifier & password required".to_string()))?;

    let found = staff::find_by_identifier(pool, identifier).await?;
    let stored_hash = found
        .as_ref()
        .map_or(UNMATCHABLE_PASSWORD_HASH, |staff| staff.password_hash.as_str())
        .to_string();
    let password = password.to_string();

    // Argon2 is CPU-bound
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| Error::Internal(format!("Password check task failed: {}", e)))?;

    let staff = match found {
        Some(staff) if matches => staff,
        _ => {
            warn!(identifier = %identifier, "Login rejected");
            return Err(Error::InvalidCredentials);
        }
    };

    let token = keys.issue(&staff)?;
    info!(staff_id = %staff.staff_id, role = %staff.role, "Staff logged in");

    Ok(LoginResponse {
        token,
        user: StaffSummary::from(&staff),
    })
}
