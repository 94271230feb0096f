//! Database models
//!
//! Row types for the three core tables plus the aggregate shapes returned
//! by reporting queries. Everything that crosses the HTTP boundary
//! serializes with camelCase field names.

use crate::time::from_millis;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use std::fmt;
use std::str::FromStr;

/// Staff role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Coordinator,
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Coordinator => "COORDINATOR",
            Role::Staff => "STAFF",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "COORDINATOR" => Ok(Role::Coordinator),
            "STAFF" => Ok(Role::Staff),
            other => Err(Error::Validation(format!("Unknown role '{}'", other))),
        }
    }
}

/// Staff directory row
#[derive(Debug, Clone)]
pub struct Staff {
    pub id: String,
    /// Human-assigned staff code (e.g. "COORD001")
    pub staff_id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

impl<'r> FromRow<'r, SqliteRow> for Staff {
    fn from_row(row: &'r SqliteRow) -> std::result::Result<Self, sqlx::Error> {
        let role: String = row.try_get("role")?;
        Ok(Self {
            id: row.try_get("id")?,
            staff_id: row.try_get("staff_id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            role: role.parse().map_err(|e: Error| sqlx::Error::Decode(Box::new(e)))?,
        })
    }
}

/// Staff identity as returned by login (never includes the password hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub staff_id: String,
    pub role: Role,
}

impl From<&Staff> for StaffSummary {
    fn from(staff: &Staff) -> Self {
        Self {
            id: staff.id.clone(),
            name: staff.name.clone(),
            email: staff.email.clone(),
            staff_id: staff.staff_id.clone(),
            role: staff.role,
        }
    }
}

/// Pre-registered participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    pub reference_no: String,
    pub prefix: String,
    pub name: String,
    pub gender: String,
    pub designation: String,
    pub institution: String,
    pub institute_address: String,
    pub state: String,
    pub country: String,
    pub email: String,
    pub mobile_no: String,
    pub registered_category: String,
    pub paper_id: String,
    pub registration_date: String,
    pub transaction_id: String,
    pub invoice_no: String,
    pub amount_paid: Option<f64>,
    /// None means unassigned
    pub barcode: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Column list matching `Participant::from_row`, for use in SELECTs
pub const PARTICIPANT_COLUMNS: &str = "id, reference_no, prefix, name, gender, designation, \
    institution, institute_address, state, country, email, mobile_no, registered_category, \
    paper_id, registration_date, transaction_id, invoice_no, amount_paid, barcode, \
    created_at, updated_at";

impl<'r> FromRow<'r, SqliteRow> for Participant {
    fn from_row(row: &'r SqliteRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            reference_no: row.try_get("reference_no")?,
            prefix: row.try_get("prefix")?,
            name: row.try_get("name")?,
            gender: row.try_get("gender")?,
            designation: row.try_get("designation")?,
            institution: row.try_get("institution")?,
            institute_address: row.try_get("institute_address")?,
            state: row.try_get("state")?,
            country: row.try_get("country")?,
            email: row.try_get("email")?,
            mobile_no: row.try_get("mobile_no")?,
            registered_category: row.try_get("registered_category")?,
            paper_id: row.try_get("paper_id")?,
            registration_date: row.try_get("registration_date")?,
            transaction_id: row.try_get("transaction_id")?,
            invoice_no: row.try_get("invoice_no")?,
            amount_paid: row.try_get("amount_paid")?,
            barcode: row.try_get("barcode")?,
            created_at: from_millis(row.try_get("created_at")?),
            updated_at: from_millis(row.try_get("updated_at")?),
        })
    }
}

/// One recorded check-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: String,
    pub participant_id: String,
    pub venue: String,
    pub timestamp: DateTime<Utc>,
    /// Staff code of the person who scanned
    pub staff_id: String,
}

impl<'r> FromRow<'r, SqliteRow> for Entry {
    fn from_row(row: &'r SqliteRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            participant_id: row.try_get("participant_id")?,
            venue: row.try_get("venue")?,
            timestamp: from_millis(row.try_get("timestamp")?),
            staff_id: row.try_get("staff_id")?,
        })
    }
}

/// Entry joined with its participant (admin listing)
///
/// Expects the entry id aliased as `entry_id` and the participant columns
/// under their own names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryWithParticipant {
    #[serde(flatten)]
    pub entry: Entry,
    pub participant: Participant,
}

impl<'r> FromRow<'r, SqliteRow> for EntryWithParticipant {
    fn from_row(row: &'r SqliteRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(Self {
            entry: Entry {
                id: row.try_get("entry_id")?,
                participant_id: row.try_get("participant_id")?,
                venue: row.try_get("venue")?,
                timestamp: from_millis(row.try_get("timestamp")?),
                staff_id: row.try_get("staff_id")?,
            },
            participant: Participant::from_row(row)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct VenueCount {
    pub venue: String,
    pub count: i64,
}

/// Aggregate view over the entry ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryStats {
    pub total_entries: i64,
    pub unique_participants: i64,
    pub entries_by_venue: Vec<VenueCount>,
}
