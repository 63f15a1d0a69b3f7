/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use beatmerge::app_config::{Config, LogLevel};
use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.difficulty.hp_drain_rate, 5.0);
    assert_eq!(config.difficulty.circle_size, 4.0);
    assert_eq!(config.difficulty.overall_difficulty, 8.0);
    assert_eq!(config.difficulty.approach_rate, 9.0);
    assert_eq!(config.version_label, None);
    assert_eq!(config.output.beatmap_file, "merged.osu");
    assert_eq!(config.output.audio_file, "merged_audio.mp3");
    assert_eq!(config.audio.ffmpeg_path, "ffmpeg");
    assert_eq!(config.audio.concurrent_probes, 4);
    assert_eq!(config.audio.input_extensions, vec!["mp3", "wav", "ogg"]);
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();

    config.difficulty.approach_rate = 10.5;
    assert!(config.validate().is_err());
    config.difficulty.approach_rate = 10.0;
    assert!(config.validate().is_ok());

    config.difficulty.hp_drain_rate = f64::NAN;
    assert!(config.validate().is_err());
    config.difficulty.hp_drain_rate = 0.0;

    config.version_label = Some("   ".to_string());
    assert!(config.validate().is_err());
    config.version_label = Some("Marathon".to_string());
    assert!(config.validate().is_ok());

    config.output.audio_file = "merged.aac".to_string();
    assert!(config.validate().is_err());
    config.output.audio_file = "merged.ogg".to_string();

    config.output.beatmap_file = String::new();
    assert!(config.validate().is_err());
    config.output.beatmap_file = "merged.osu".to_string();

    config.audio.concurrent_probes = 0;
    assert!(config.validate().is_err());
    config.audio.concurrent_probes = 1;

    config.audio.input_extensions.clear();
    assert!(config.validate().is_err());
}

#[test]
fn test_validation_error_shouldNameOffendingKey() {
    let mut config = Config::default();
    config.difficulty.circle_size = -1.0;
    let message = config.validate().unwrap_err().to_string();
    assert!(message.contains("CircleSize"), "unexpected message: {}", message);
}

#[test]
fn test_load_or_create_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let (config, created) = Config::load_or_create(&path)?;

    assert!(created);
    assert!(path.exists());
    assert_eq!(config, Config::default());

    let (reloaded, created_again) = Config::load_or_create(&path)?;
    assert!(!created_again);
    assert_eq!(reloaded, config);
    Ok(())
}

#[test]
fn test_load_or_create_withPartialFile_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r#"{ "difficulty": { "approach_rate": 7.5 }, "version_label": "Set", "log_level": "debug" }"#,
    )?;

    let (config, created) = Config::load_or_create(&path)?;

    assert!(!created);
    assert_eq!(config.difficulty.approach_rate, 7.5);
    assert_eq!(config.difficulty.hp_drain_rate, 5.0);
    assert_eq!(config.version_label.as_deref(), Some("Set"));
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.log_level.to_level_filter(), log::LevelFilter::Debug);
    assert_eq!(config.output.audio_file, "merged_audio.mp3");
    Ok(())
}

#[test]
fn test_load_or_create_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "conf.json", "{ not json")?;
    assert!(Config::load_or_create(&path).is_err());
    Ok(())
}
