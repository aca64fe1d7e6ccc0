mod handler;

use std::sync::Arc;

use serenity::all::{Client, GatewayIntents};
use tokio::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use rustls::crypto::ring::default_provider;
use sqlx::postgres::PgPoolOptions;

use thaw_core::Config;
use thaw_database::{Database, MIGRATOR};

use crate::handler::Handler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(filter_fn(|metadata| {
        let target = metadata.target();

        let within_info_level = *metadata.level() <= tracing::Level::INFO;
        if !within_info_level {
            return false;
        }

        !(target.starts_with("serenity::gateway::bridge::shard_manager")
            || target.starts_with("serenity::gateway::bridge::shard_runner"))
    }));

    tracing_subscriber::registry().with(fmt_layer).init();

    default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls ring provider"))?;

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let db_pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    info!("PostgreSQL connection established.");

    let db = Database::new(db_pool);

    if config.auto_run_migrations {
        MIGRATOR.run(db.pool()).await?;
        info!("Database migrations applied.");
    } else {
        info!("Auto migrations disabled (set AUTO_RUN_MIGRATIONS=true to run at startup).");
    }

    if !config.revocation.enabled {
        info!("Temporary action revocation disabled (set REVOCATION_ENABLED=true to enable).");
    }

    let scheduler = Arc::new(Mutex::new(None));
    let handler = Handler::new(db, config.revocation.clone(), Arc::clone(&scheduler));

    info!("Thaw is connecting...");

    let mut client = Client::builder(&config.discord_token, GatewayIntents::GUILDS)
        .event_handler(handler)
        .await?;

    let shard_manager = Arc::clone(&client.shard_manager);
    tokio::spawn(async move {
        if let Err(source) = tokio::signal::ctrl_c().await {
            error!(?source, "failed to listen for shutdown signal");
            return;
        }

        info!("Shutdown requested.");
        if let Some(handle) = scheduler.lock().await.take() {
            handle.stop().await;
        }
        shard_manager.shutdown_all().await;
    });

    client.start().await?;
    info!("Thaw has been stopped.");
    Ok(())
}
