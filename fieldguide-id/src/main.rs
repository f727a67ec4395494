//! fieldguide-id - species identification resolution service
//!
//! Resolves identification events into a single taxon, records first
//! sightings and streams updates over SSE.

use anyhow::Result;
use clap::Parser;
use fieldguide_common::events::EventBus;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fieldguide_id::services::IdentificationSlot;
use fieldguide_id::AppState;

#[derive(Debug, Parser)]
#[command(name = "fieldguide-id", version, about = "Species identification resolution service")]
struct Args {
    /// Port to listen on
    #[arg(long, env = "FIELDGUIDE_PORT", default_value_t = 5790)]
    port: u16,

    /// Root folder holding the database
    #[arg(long, env = "FIELDGUIDE_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, env = "FIELDGUIDE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args
        .config
        .clone()
        .or_else(|| fieldguide_common::config::default_config_path("fieldguide-id"));
    let toml_config = fieldguide_common::config::load_toml_config(config_path.as_deref());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fieldguide_id={}", toml_config.logging.level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting fieldguide-id (species identification) service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let root_folder =
        fieldguide_common::config::resolve_root_folder(args.root_folder.as_deref(), &toml_config);
    std::fs::create_dir_all(&root_folder)
        .map_err(|e| anyhow::anyhow!("Failed to create root folder {}: {}", root_folder.display(), e))?;

    let db_path = root_folder.join(fieldguide_id::db::DATABASE_FILE);
    info!("Database: {}", db_path.display());
    let db_pool = fieldguide_id::db::init_database_pool(&db_path).await?;

    let event_bus = EventBus::new(100);

    let vision_secret =
        match fieldguide_id::config::resolve_vision_secret(&db_pool, &toml_config).await {
            Ok(secret) => Some(secret),
            Err(e) => {
                warn!("{}", e);
                None
            }
        };

    let orchestrator = fieldguide_id::build_orchestrator(
        db_pool.clone(),
        event_bus.clone(),
        &toml_config,
        vision_secret,
    )?;
    let slot = Arc::new(IdentificationSlot::new(
        Arc::new(orchestrator),
        event_bus.clone(),
    ));

    let state = AppState::new(db_pool, event_bus, slot);
    let app = fieldguide_id::build_router(state);

    let addr = format!("127.0.0.1:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
