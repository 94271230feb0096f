//! sevs-api - Smart Entry Validation Service
//!
//! Event check-in HTTP API: staff login, barcode binding, venue entry
//! marking and admin reporting over a single SQLite database.

use anyhow::{Context, Result};
use clap::Parser;
use sevs_api::{server, AppState};
use sevs_common::api::{load_or_create_signing_secret, TokenKeys};
use sevs_common::config::{
    load_toml_config, parse_allowed_origins, ConfigOverrides, DuplicateScope, ServiceConfig,
};
use sevs_common::db::init_database;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "sevs-api")]
#[command(about = "Smart Entry Validation Service - event check-in API")]
#[command(version)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, env = "SEVS_CONFIG")]
    config: Option<PathBuf>,

    /// HTTP port
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// SQLite database file
    #[arg(short, long, env = "SEVS_DATABASE")]
    database: Option<PathBuf>,

    /// Comma-separated browser origins allowed by CORS
    #[arg(long, env = "FRONTEND_URL")]
    frontend_url: Option<String>,

    /// Token signing secret (a generated secret is persisted when absent)
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Previous signing secret still accepted for verification
    #[arg(long, env = "JWT_SECRET_FALLBACK", hide_env_values = true)]
    jwt_secret_fallback: Option<String>,

    /// Token lifetime in hours
    #[arg(long, env = "SEVS_TOKEN_TTL_HOURS")]
    token_ttl_hours: Option<u32>,

    /// Duplicate entry window: "ever" or "day"
    #[arg(long, env = "SEVS_DUPLICATE_SCOPE")]
    duplicate_scope: Option<DuplicateScope>,

    /// Log level when RUST_LOG is not set
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            port: self.port,
            database_path: self.database.clone(),
            allowed_origins: self.frontend_url.as_deref().map(parse_allowed_origins),
            jwt_secret: self.jwt_secret.clone(),
            jwt_secret_fallback: self.jwt_secret_fallback.clone(),
            token_ttl_hours: self.token_ttl_hours,
            duplicate_scope: self.duplicate_scope,
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let file_config = load_toml_config(args.config.as_deref())?;
    let config = ServiceConfig::resolve(args.overrides(), file_config)?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "sevs_api={level},sevs_common={level},tower_http={level}",
                level = config.log_level
            ))
        }))
        .init();

    info!(
        "Starting SEVS API (sevs-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    info!("Database path: {}", config.database_path.display());
    let pool = init_database(&config.database_path, &config.pool)
        .await
        .context("Failed to open database")?;

    let signing_secret = match &config.jwt_secret {
        Some(secret) => secret.clone(),
        None => {
            warn!("JWT_SECRET not set; using the generated secret stored in the database");
            load_or_create_signing_secret(&pool).await?
        }
    };
    let keys = TokenKeys::new(
        &signing_secret,
        config.jwt_secret_fallback.as_deref(),
        config.token_ttl_hours,
    );

    info!(
        duplicate_scope = %config.duplicate_scope,
        token_ttl_hours = config.token_ttl_hours,
        "Configuration loaded"
    );
    if config.allows_any_origin() {
        info!("CORS: any origin allowed");
    } else {
        info!("CORS: allowed origins {:?}", config.allowed_origins);
    }

    let state = AppState::new(pool.clone(), keys, config.duplicate_scope);
    server::run(&config, state).await?;

    pool.close().await;
    Ok(())
}
