//! Staff provisioning from a TOML roster
//!
//! ```toml
//! [[staff]]
//! staff_id = "ADMIN001"
//! name = "Admin User"
//! email = "admin@event.com"
//! password = "admin123"
//! role = "ADMIN"
//! ```

use crate::db::staff;
use serde::Deserialize;
use sevs_common::api::hash_password;
use sevs_common::db::{Role, StaffSummary};
use sevs_common::time::{now, to_millis};
use sevs_common::{Error, Result};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct StaffRoster {
    #[serde(default)]
    pub staff: Vec<StaffSeed>,
}

#[derive(Clone, Deserialize)]
pub struct StaffSeed {
    pub staff_id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl std::fmt::Debug for StaffSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaffSeed")
            .field("staff_id", &self.staff_id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Parse a roster file's contents
pub fn parse_roster(content: &str) -> Result<StaffRoster> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Invalid staff roster: {}", e)))
}

/// Create or update every staff member in the roster, keyed by staff code
pub async fn seed_staff(pool: &SqlitePool, roster: &StaffRoster) -> Result<Vec<StaffSummary>> {
    let mut seeded = Vec::with_capacity(roster.staff.len());

    for seed in &roster.staff {
        let staff_id = seed.staff_id.trim();
        let email = seed.email.trim();
        if staff_id.is_empty() || email.is_empty() || seed.password.is_empty() {
            return Err(Error::Validation(format!(
                "Staff entry '{}' needs staff_id, email and password",
                seed.staff_id
            )));
        }

        let password = seed.password.clone();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| Error::Internal(format!("Password hashing task failed: {}", e)))??;
        let stored = staff::upsert(
            pool,
            &Uuid::new_v4().to_string(),
            staff_id,
            seed.name.trim(),
            email,
            &password_hash,
            seed.role,
            to_millis(now()),
        )
        .await?;

        info!(staff_id = %stored.staff_id, role = %stored.role, "Staff member provisioned");
        seeded.push(StaffSummary::from(&stored));
    }

    Ok(seeded)
}
