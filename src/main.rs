use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use notion_relay::config;
use notion_relay::db::{self, SqliteStore};
use notion_relay::notion::NotionClient;
use notion_relay::server::{self, AppState};

#[derive(Debug, Parser)]
#[command(author, version, about = "Relay between the client app and the Notion API")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = config::load(Some(&args.config))
        .with_context(|| format!("failed to load {}", args.config.display()))?;

    let default_filter = if cfg.app.production {
        "notion_relay=info,tower_http=info"
    } else {
        "notion_relay=debug,tower_http=debug"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .compact()
        .init();

    let pool = db::init_pool(&cfg.app.database_url).await?;
    db::run_migrations(&pool)
        .await
        .context("failed to run database migrations")?;
    info!("database ready");

    let notion = NotionClient::from_config(&cfg)?;
    let state = AppState {
        notion,
        store: Arc::new(SqliteStore::new(pool)),
        default_database: cfg.notion.default_database.clone(),
    };
    let app = server::build_router(state, &cfg.app.cors_origins);

    let listener = tokio::net::TcpListener::bind(&cfg.app.bind)
        .await
        .with_context(|| format!("failed to bind {}", cfg.app.bind))?;
    info!(bind = %cfg.app.bind, production = cfg.app.production, "starting notion relay");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(?err, "failed to listen for shutdown signal");
    }
}
