//! Configuration loading and root folder resolution
//!
//! Configuration lives in a single TOML file. Every field is optional: a
//! missing or unreadable file degrades to compiled defaults with a warning,
//! it never stops a service from starting.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "FIELDGUIDE_ROOT_FOLDER";

/// Default base URL for the public taxa and vision APIs
pub const DEFAULT_API_BASE_URL: &str = "https://api.inaturalist.org/v1";

/// Default bound on the remote vision scoring call (seconds)
pub const DEFAULT_VISION_TIMEOUT_SECS: u64 = 30;

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Root folder holding the database (overridden by CLI and ENV)
    pub root_folder: Option<PathBuf>,
    /// Logging settings
    pub logging: LoggingConfig,
    /// Remote taxon metadata service
    pub taxa: TaxaConfig,
    /// Remote vision scoring service
    pub vision: VisionConfig,
    /// Fixed device coordinates for hosts without a positioning source
    pub location: LocationConfig,
    /// On-device prediction handling
    pub offline: OfflineConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter when RUST_LOG is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Taxon metadata service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxaConfig {
    pub base_url: String,
}

impl Default for TaxaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

/// Vision scoring service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    pub base_url: String,
    /// Token signing secret (lowest priority source, see service config)
    pub secret: Option<String>,
    /// Upper bound on one scoring call, in seconds
    pub timeout_secs: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            secret: None,
            timeout_secs: DEFAULT_VISION_TIMEOUT_SECS,
        }
    }
}

/// Fixed device location
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub accuracy: Option<f64>,
}

/// On-device prediction settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineConfig {
    /// Derive ancestor ids from the full prediction list for species matches.
    /// Only one model family omits them from its species prediction.
    pub attach_ancestor_ids: bool,
}

/// Default location of a service's TOML file
///
/// `~/.config/fieldguide/<service>.toml` on Linux, the platform config
/// directory elsewhere.
pub fn default_config_path(service_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("fieldguide").join(format!("{}.toml", service_name)))
}

/// Read and parse a TOML configuration file
pub fn read_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}

/// Load configuration, falling back to defaults on any failure
pub fn load_toml_config(path: Option<&Path>) -> TomlConfig {
    let Some(path) = path else {
        debug!("No configuration file path available, using defaults");
        return TomlConfig::default();
    };

    if !path.exists() {
        warn!(path = %path.display(), "Configuration file not found, using defaults");
        return TomlConfig::default();
    }

    match read_toml_config(path) {
        Ok(config) => {
            debug!(path = %path.display(), "Configuration loaded");
            config
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Configuration unreadable, using defaults");
            TomlConfig::default()
        }
    }
}

/// Write configuration atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;

    Ok(())
}

/// Root folder resolution, highest priority first:
/// 1. Command-line argument
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("fieldguide"))
        .unwrap_or_else(|| PathBuf::from("./fieldguide_data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_point_at_public_api() {
        let config = TomlConfig::default();
        assert_eq!(config.taxa.base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.vision.timeout_secs, DEFAULT_VISION_TIMEOUT_SECS);
        assert!(config.vision.secret.is_none());
        assert!(!config.offline.attach_ancestor_ids);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            [vision]
            secret = "s3cret"

            [location]
            latitude = 37.77
            longitude = -122.42
            "#,
        )
        .unwrap();

        assert_eq!(config.vision.secret.as_deref(), Some("s3cret"));
        assert_eq!(config.vision.base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.location.latitude, Some(37.77));
        assert_eq!(config.location.accuracy, None);
    }

    #[test]
    fn test_cli_argument_wins() {
        let config = TomlConfig {
            root_folder: Some(PathBuf::from("/from/toml")),
            ..Default::default()
        };
        let resolved = resolve_root_folder(Some(Path::new("/from/cli")), &config);
        assert_eq!(resolved, PathBuf::from("/from/cli"));
    }

    #[test]
    fn test_missing_path_yields_defaults() {
        assert_eq!(load_toml_config(None), TomlConfig::default());
    }
}
