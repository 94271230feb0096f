//! Barcode binding
//!
//! Binds a physical badge barcode to a participant (found by email) and
//! releases it again. Uniqueness is enforced by the store: each operation
//! is a single UPDATE, and a UNIQUE violation on `barcode` means another
//! participant already holds it, including one that won a concurrent race.

use super::required;
use crate::db::participants;
use sevs_common::db::Participant;
use sevs_common::error::is_unique_violation;
use sevs_common::time::{now, to_millis};
use sevs_common::{Error, Result};
use sqlx::SqlitePool;
use tracing::info;

/// Bind `barcode` to the participant registered under `email`
///
/// Re-binding the barcode a participant already holds succeeds unchanged.
/// A participant's previous barcode, if different, is released.
pub async fn assign_barcode(
    pool: &SqlitePool,
    email: Option<&str>,
    barcode: Option<&str>,
) -> Result<Participant> {
    let [email, barcode] = required([email, barcode], "Email & barcode required")?;

    match participants::set_barcode(pool, email, Some(barcode), to_millis(now())).await {
        Ok(Some(participant)) => {
            info!(
                participant_id = %participant.id,
                barcode = %barcode,
                "Barcode assigned"
            );
            Ok(participant)
        }
        Ok(None) => Err(Error::NotFound("Participant not found".to_string())),
        Err(err) if is_unique_violation(&err) => Err(Error::BarcodeTaken {
            barcode: barcode.to_string(),
        }),
        Err(err) => Err(err.into()),
    }
}

/// Release whatever barcode the participant under `email` holds
///
/// Idempotent: a participant without a barcode is returned as-is.
pub async fn deassign_barcode(pool: &SqlitePool, email: Option<&str>) -> Result<Participant> {
    let [email] = required([email], "Email required")?;

    let participant = participants::set_barcode(pool, email, None, to_millis(now()))
        .await?
        .ok_or_else(|| Error::NotFound("Participant not found".to_string()))?;

    info!(participant_id = %participant.id, "Barcode released");
    Ok(participant)
}
