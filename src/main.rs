#![allow(clippy::result_large_err)]

use dotenvy::dotenv;
use shop_admin::{
    bot::{self, BotData},
    config::{admins, database, settings},
    core::{access, seed},
    errors::{Error, Result},
};
use std::env;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load settings (catalog skeleton, warehouses, import limits)
    let app_config = settings::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;

    // 4. Connect and create any missing tables
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed permissions, default roles and the configured catalog skeleton
    access::seed_access_control(&db)
        .await
        .inspect_err(|e| error!("Failed to seed access control: {}", e))?;
    let report = seed::seed_from_config(&db, &app_config)
        .await
        .inspect_err(|e| error!("Failed to seed catalog: {}", e))?;
    info!(
        "Seeded {} categories, {} subcategories, {} warehouses.",
        report.categories, report.subcategories, report.warehouses
    );

    // 6. First start: create the SuperAdmin from BOOTSTRAP_ADMIN_* if nobody exists yet
    if let Some(bootstrap) = admins::bootstrap_admin_from_env() {
        if let Some(created) = access::ensure_bootstrap_admin(&db, &bootstrap).await? {
            info!("Created bootstrap admin '{}'.", created.username);
        }
    }

    // 7. Run the bot
    // DISCORD_BOT_TOKEN is loaded here, directly before use, not stored in AppConfig
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {}", e))
        .map_err(Error::EnvVar)?;

    bot::run_bot(token, BotData::new(db, app_config))
        .await
        .map_err(Error::from)?;

    Ok(())
}
