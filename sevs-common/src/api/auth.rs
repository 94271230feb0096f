//! Staff authentication primitives
//!
//! # Architecture
//!
//! - Passwords are stored as Argon2id PHC strings
//! - Login issues an HS256 bearer token carrying the staff row id, staff
//!   code and role
//! - Verification tries the primary secret, then the optional fallback
//!   secret, so a secret can be rotated without logging everyone out
//! - Without a configured secret, a random one is generated once and kept
//!   in the `settings` table
//!
//! Every verification failure collapses to `Error::Authentication`; callers
//! never learn whether a token was expired, malformed or forged.

use crate::db::models::{Role, Staff};
use crate::{Error, Result};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// `settings` key of the generated signing secret
const SIGNING_SECRET_KEY: &str = "token_signing_secret";

// ========================================
// Passwords
// ========================================

/// Hash a password with Argon2id and a random salt
pub fn hash_password(plain: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    rand::thread_rng().fill(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| Error::Internal(format!("Salt encoding failed: {}", e)))?;

    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Internal(format!("Password hashing failed: {}", e)))
}

/// Argon2id hash of a discarded random password, with the same parameters
/// `hash_password` uses
///
/// Login checks the submitted password against this when the identifier
/// matches nobody, so an unknown account costs as much as a wrong password.
pub const UNMATCHABLE_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$Fd7LLx3FOqKJY4ygFGfLmg$Som3EiVIYiE6Dhwp9F5n5Edl/cvUt39+k0rjRfzjJMw";

/// Check a password against a stored PHC hash
///
/// An unparseable stored hash simply fails verification.
pub fn verify_password(plain: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

// ========================================
// Tokens
// ========================================

/// Bearer token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Staff row id
    pub sub: String,
    /// Human staff code, recorded on entries
    pub staff_id: String,
    pub role: Role,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expiry (seconds since epoch)
    pub exp: i64,
}

impl Claims {
    /// Claims for a staff member, valid for `ttl_hours` from now
    pub fn for_staff(staff: &Staff, ttl_hours: u32) -> Self {
        let issued_at = chrono::Utc::now().timestamp();
        Self {
            sub: staff.id.clone(),
            staff_id: staff.staff_id.clone(),
            role: staff.role,
            iat: issued_at,
            exp: issued_at + i64::from(ttl_hours) * 3600,
        }
    }
}

/// Signing and verification keys
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: Vec<DecodingKey>,
    ttl_hours: u32,
}

impl TokenKeys {
    pub fn new(primary: &str, fallback: Option<&str>, ttl_hours: u32) -> Self {
        let mut decoding = vec![DecodingKey::from_secret(primary.as_bytes())];
        if let Some(fallback) = fallback {
            decoding.push(DecodingKey::from_secret(fallback.as_bytes()));
        }

        Self {
            encoding: EncodingKey::from_secret(primary.as_bytes()),
            decoding,
            ttl_hours,
        }
    }

    pub fn ttl_hours(&self) -> u32 {
        self.ttl_hours
    }

    /// Issue a token for a staff member
    pub fn issue(&self, staff: &Staff) -> Result<String> {
        self.sign(&Claims::for_staff(staff, self.ttl_hours))
    }

    /// Sign arbitrary claims with the primary secret
    pub fn sign(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| Error::Internal(format!("Token signing failed: {}", e)))
    }

    /// Verify a token against the primary secret, then the fallback
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        self.decoding
            .iter()
            .find_map(|key| decode::<Claims>(token, key, &validation).ok())
            .map(|data| data.claims)
            .ok_or(Error::Authentication)
    }
}

/// Shorten a token for log output
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 16 {
        return "***".to_string();
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 8..].iter().collect();
    format!("{}...{}", head, tail)
}

// ========================================
// Signing secret persistence
// ========================================

/// Load the generated signing secret, creating it on first use
///
/// INSERT OR IGNORE followed by a re-read means two processes starting
/// against the same database agree on one secret.
pub async fn load_or_create_signing_secret(pool: &SqlitePool) -> Result<String> {
    let existing: Option<String> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(SIGNING_SECRET_KEY)
            .fetch_optional(pool)
            .await?;

    if let Some(secret) = existing {
        return Ok(secret);
    }

    sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
        .bind(SIGNING_SECRET_KEY)
        .bind(generate_secret())
        .execute(pool)
        .await?;

    let stored: String = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(SIGNING_SECRET_KEY)
        .fetch_one(pool)
        .await?;

    Ok(stored)
}

/// 256 random bits as lowercase hex
fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

// ========================================
// Request identity
// ========================================

/// Verified identity of the staff member making a request
///
/// Passed explicitly into workflow calls instead of being read from a
/// request object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: String,
    pub staff_id: String,
    pub role: Role,
}

impl From<Claims> for AuthContext {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            staff_id: claims.staff_id,
            role: claims.role,
        }
    }
}

/// Reject identities whose role is not in `allowed`
pub fn require_role(ctx: &AuthContext, allowed: &[Role]) -> Result<()> {
    if allowed.contains(&ctx.role) {
        Ok(())
    } else {
        Err(Error::Authorization)
    }
}
