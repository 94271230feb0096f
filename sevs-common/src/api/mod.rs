//! API module for shared HTTP API functionality
//!
//! Contains ONLY framework-independent code:
//! - Pure credential functions (password hashing, token issue/verify)
//! - Database operations for the persisted signing secret
//! - The identity value handed from the auth gate to the workflows
//!
//! The service crate wraps these in axum middleware.

pub mod auth;

pub use auth::{
    hash_password, load_or_create_signing_secret, mask_token, require_role, verify_password,
    AuthContext, Claims, TokenKeys, UNMATCHABLE_PASSWORD_HASH,
};
