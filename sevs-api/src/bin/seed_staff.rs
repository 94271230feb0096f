//! seed-staff - provision staff accounts from a TOML roster
//!
//! Re-running with the same roster updates names, emails, roles and
//! passwords in place (keyed by staff code). Passwords are never printed.

use anyhow::{Context, Result};
use clap::Parser;
use sevs_api::services::staff_seed::{parse_roster, seed_staff};
use sevs_common::config::{load_toml_config, ConfigOverrides, ServiceConfig};
use sevs_common::db::init_database;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "seed-staff")]
#[command(about = "Create or update SEVS staff accounts")]
#[command(version)]
struct Args {
    /// Staff roster TOML file ([[staff]] entries)
    #[arg(env = "SEVS_STAFF_FILE")]
    roster: PathBuf,

    /// Path to TOML configuration file
    #[arg(short, long, env = "SEVS_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(short, long, env = "SEVS_DATABASE")]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("seed_staff=info,sevs_api=info,sevs_common=info")),
        )
        .init();

    let args = Args::parse();

    let overrides = ConfigOverrides {
        database_path: args.database.clone(),
        ..Default::default()
    };
    let config = ServiceConfig::resolve(overrides, load_toml_config(args.config.as_deref())?)?;

    let content = std::fs::read_to_string(&args.roster)
        .with_context(|| format!("Failed to read roster {}", args.roster.display()))?;
    let roster = parse_roster(&content)?;

    let pool = init_database(&config.database_path, &config.pool).await?;
    let seeded = seed_staff(&pool, &roster).await?;
    pool.close().await;

    for staff in &seeded {
        println!("{:<12} {:<12} {}", staff.staff_id, staff.role.as_str(), staff.email);
    }
    info!("Provisioned {} staff member(s)", seeded.len());

    Ok(())
}
