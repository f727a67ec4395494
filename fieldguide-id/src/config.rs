//! Configuration resolution for fieldguide-id
//!
//! Vision signing secret resolved with Database → ENV → TOML priority.

use fieldguide_common::config::TomlConfig;
use fieldguide_common::{Error, Result};
use sqlx::{Pool, Sqlite};
use tracing::{info, warn};

/// Environment variable holding the vision signing secret
pub const VISION_SECRET_ENV: &str = "FIELDGUIDE_VISION_SECRET";

/// Resolve the vision signing secret from the three configuration tiers
///
/// **Priority:** Database → ENV → TOML. Multiple sources log a warning.
pub async fn resolve_vision_secret(
    db: &Pool<Sqlite>,
    toml_config: &TomlConfig,
) -> Result<String> {
    let db_secret = crate::db::settings::get_vision_secret(db)
        .await?
        .filter(|s| is_valid_secret(s));
    let env_secret = std::env::var(VISION_SECRET_ENV)
        .ok()
        .filter(|s| is_valid_secret(s));
    let toml_secret = toml_config
        .vision
        .secret
        .clone()
        .filter(|s| is_valid_secret(s));

    let sources: Vec<&str> = [
        ("database", db_secret.is_some()),
        ("environment", env_secret.is_some()),
        ("TOML", toml_secret.is_some()),
    ]
    .iter()
    .filter(|(_, present)| *present)
    .map(|(name, _)| *name)
    .collect();

    if sources.len() > 1 {
        warn!(
            "Vision secret found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    if let Some(secret) = db_secret {
        info!("Vision secret loaded from database");
        return Ok(secret);
    }

    if let Some(secret) = env_secret {
        info!("Vision secret loaded from environment variable");
        return Ok(secret);
    }

    if let Some(secret) = toml_secret {
        info!("Vision secret loaded from TOML config");
        return Ok(secret);
    }

    Err(Error::Config(format!(
        "Vision secret not configured; online identification disabled. Configure one of:\n\
         1. Database settings key '{}'\n\
         2. Environment: {}=your-secret\n\
         3. TOML config: [vision] secret = \"your-secret\"",
        crate::db::settings::VISION_SECRET_KEY,
        VISION_SECRET_ENV
    )))
}

/// Non-empty, non-whitespace
pub fn is_valid_secret(secret: &str) -> bool {
    !secret.trim().is_empty()
}
