/*!
 * Tests for configuration loading and validation
 */

use anyhow::Result;
use bilinguo::app_config::{Config, LogLevel, TranslationProvider};
use crate::common;

/// Test that a missing config file is created with defaults
#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = dir.path().join("conf.json");

    let config = Config::load_or_create(&path)?;

    assert!(path.exists());
    assert_eq!(config.source_language, "en");
    assert_eq!(config.target_language, "fa");
    assert_eq!(config.translation.provider, TranslationProvider::MyMemory);
    assert_eq!(config.export.default_limit, 50);
    Ok(())
}

/// Test that partial files are filled in from defaults
#[test]
fn test_loadOrCreate_withPartialFile_shouldFillDefaults() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        dir.path(),
        "conf.json",
        r#"{"target_language":"de","translation":{"provider":"libretranslate"},"log_level":"debug"}"#,
    )?;

    let config = Config::load_or_create(&path)?;

    assert_eq!(config.source_language, "en");
    assert_eq!(config.target_language, "de");
    assert_eq!(config.translation.provider, TranslationProvider::LibreTranslate);
    assert_eq!(config.translation.concurrent_requests, 4);
    assert_eq!(config.log_level, LogLevel::Debug);
    config.validate()?;
    Ok(())
}

/// Test that a malformed config file is reported rather than replaced
#[test]
fn test_loadOrCreate_withMalformedFile_shouldFail() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = common::create_test_file(dir.path(), "conf.json", "{ not json")?;

    assert!(Config::load_or_create(&path).is_err());
    assert_eq!(std::fs::read_to_string(&path)?, "{ not json");
    Ok(())
}

/// Test the saved config round-trips through disk
#[test]
fn test_save_thenLoad_shouldKeepOverrides() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = dir.path().join("conf.json");
    let mut config = Config::default();
    config.target_language = "fr".to_string();
    config.import.min_word_length = 3;

    config.save(&path)?;
    let loaded = Config::load_or_create(&path)?;

    assert_eq!(loaded.target_language, "fr");
    assert_eq!(loaded.import.min_word_length, 3);
    Ok(())
}

/// Test validation failures
#[test]
fn test_validate_withBadValues_shouldFail() {
    let mut same_languages = Config::default();
    same_languages.target_language = "eng".to_string();
    assert!(same_languages.validate().is_err());

    let mut unknown_language = Config::default();
    unknown_language.source_language = "xx".to_string();
    assert!(unknown_language.validate().is_err());

    let mut no_concurrency = Config::default();
    no_concurrency.translation.concurrent_requests = 0;
    assert!(no_concurrency.validate().is_err());

    let mut bad_endpoint = Config::default();
    bad_endpoint.translation.endpoint = "not a url".to_string();
    assert!(bad_endpoint.validate().is_err());
}

/// Test explicit database path resolution
#[test]
fn test_resolveDatabasePath_withExplicitPath_shouldUseIt() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let config = common::test_config(dir.path());

    assert_eq!(config.resolve_database_path()?, dir.path().join("vocabulary.db"));
    Ok(())
}
