//! Vision secret resolution: Database → ENV → TOML

mod helpers;

use fieldguide_common::config::TomlConfig;
use fieldguide_id::config::{resolve_vision_secret, VISION_SECRET_ENV};
use fieldguide_id::db::settings;
use helpers::create_memory_db;
use serial_test::serial;

fn toml_with_secret(secret: Option<&str>) -> TomlConfig {
    let mut config = TomlConfig::default();
    config.vision.secret = secret.map(str::to_string);
    config
}

#[tokio::test]
#[serial]
async fn test_database_secret_wins() {
    let pool = create_memory_db().await.unwrap();
    settings::set_vision_secret(&pool, "db-secret".to_string())
        .await
        .unwrap();
    std::env::set_var(VISION_SECRET_ENV, "env-secret");

    let secret = resolve_vision_secret(&pool, &toml_with_secret(Some("toml-secret")))
        .await
        .unwrap();

    std::env::remove_var(VISION_SECRET_ENV);
    assert_eq!(secret, "db-secret");
}

#[tokio::test]
#[serial]
async fn test_env_beats_toml() {
    let pool = create_memory_db().await.unwrap();
    std::env::set_var(VISION_SECRET_ENV, "env-secret");

    let secret = resolve_vision_secret(&pool, &toml_with_secret(Some("toml-secret")))
        .await
        .unwrap();

    std::env::remove_var(VISION_SECRET_ENV);
    assert_eq!(secret, "env-secret");
}

#[tokio::test]
#[serial]
async fn test_toml_fallback_and_blank_values() {
    let pool = create_memory_db().await.unwrap();
    std::env::set_var(VISION_SECRET_ENV, "   ");

    let secret = resolve_vision_secret(&pool, &toml_with_secret(Some("toml-secret")))
        .await
        .unwrap();

    std::env::remove_var(VISION_SECRET_ENV);
    assert_eq!(secret, "toml-secret");
}

#[tokio::test]
#[serial]
async fn test_missing_secret_is_config_error() {
    let pool = create_memory_db().await.unwrap();
    std::env::remove_var(VISION_SECRET_ENV);

    let err = resolve_vision_secret(&pool, &toml_with_secret(None))
        .await
        .unwrap_err();

    assert!(matches!(err, fieldguide_common::Error::Config(_)));
    assert!(err.to_string().contains(VISION_SECRET_ENV));
}
