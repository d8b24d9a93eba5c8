use fidedu::config::{Config, ConfigError};
use fidedu::scanner::DEFAULT_BUFFER_SIZE;
use figment::providers::{Format, Serialized, Toml};
use figment::Figment;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_config_load_defaults() {
    // Figment without Env, so other tests' variables cannot interfere
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .extract()
        .unwrap();
    assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);
    assert!(config.progress);
    assert!(config.ignore_patterns.is_empty());
}

#[test]
fn test_config_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
workers = 3
buffer_size = 65536
min_size = 1
skip_hidden = true
ignore_patterns = ["*.tmp", "cache/"]
progress = false
"#,
    )
    .unwrap();

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&config_path))
        .extract()
        .unwrap();

    assert_eq!(config.workers, 3);
    assert_eq!(config.buffer_size, 65536);
    assert_eq!(config.min_size, Some(1));
    assert_eq!(config.max_size, None);
    assert!(config.skip_hidden);
    assert_eq!(config.ignore_patterns, vec!["*.tmp", "cache/"]);
    assert!(!config.progress);
}

#[test]
fn test_config_partial_toml_keeps_defaults() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "skip_hidden = true\n").unwrap();

    let config = Config::load(Some(config_path.as_path())).unwrap();
    assert!(config.skip_hidden);
    assert!(config.workers >= 1);
}

#[test]
fn test_config_load_from_env() {
    std::env::set_var("FIDEDU_BUFFER_SIZE", "65536");

    let config: Config = Config::figment(None).extract().unwrap();
    assert_eq!(config.buffer_size, 65536);

    std::env::remove_var("FIDEDU_BUFFER_SIZE");
}

#[test]
fn test_config_invalid_toml_is_error() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "workers = \"many\"").unwrap();

    let result = Config::load(Some(config_path.as_path()));
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_config_missing_explicit_file_is_error() {
    let temp_dir = tempdir().unwrap();
    let result = Config::load(Some(temp_dir.path().join("nope.toml").as_path()));
    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}
