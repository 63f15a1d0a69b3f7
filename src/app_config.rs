use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::audio::AudioFormat;
use crate::merger::DifficultySettings;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Difficulty values written into the merged map
    #[serde(default)]
    pub difficulty: DifficultySettings,

    /// Optional `Version:` label for the merged map
    #[serde(default)]
    pub version_label: Option<String>,

    /// Output file names
    #[serde(default)]
    pub output: OutputConfig,

    /// Audio tool settings
    #[serde(default)]
    pub audio: AudioConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Where the merged beatmap and audio are written
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OutputConfig {
    /// Merged `.osu` file
    #[serde(default = "default_beatmap_file")]
    pub beatmap_file: String,

    /// Merged audio file; its extension selects the encoding
    #[serde(default = "default_audio_file")]
    pub audio_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            beatmap_file: default_beatmap_file(),
            audio_file: default_audio_file(),
        }
    }
}

/// External audio tool configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AudioConfig {
    // @field: ffmpeg executable
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    // @field: ffprobe executable
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: String,

    // @field: Timeout per tool invocation
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum number of audio files decoded at the same time.
    ///
    /// Durations are still applied strictly in input order.
    #[serde(default = "default_concurrent_probes")]
    pub concurrent_probes: usize,

    /// Extensions recognized as audio when scanning a directory
    #[serde(default = "default_input_extensions")]
    pub input_extensions: Vec<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            timeout_secs: default_timeout_secs(),
            concurrent_probes: default_concurrent_probes(),
            input_extensions: default_input_extensions(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_beatmap_file() -> String {
    "merged.osu".to_string()
}

fn default_audio_file() -> String {
    "merged_audio.mp3".to_string()
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe_path() -> String {
    "ffprobe".to_string()
}

fn default_timeout_secs() -> u64 {
    600 // long compilations take a while to encode
}

fn default_concurrent_probes() -> usize {
    4
}

fn default_input_extensions() -> Vec<String> {
    vec!["mp3".to_string(), "wav".to_string(), "ogg".to_string()]
}

/// Valid range for every difficulty value
pub const DIFFICULTY_RANGE: std::ops::RangeInclusive<f64> = 0.0..=10.0;

impl Config {
    /// Load a configuration file, or write and return the default one if it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<(Self, bool)> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let config: Config = serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok((config, false));
        }

        let config = Config::default();
        config.save(path)?;
        Ok((config, true))
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        for (key, value) in self.difficulty.entries() {
            if !value.is_finite() || !DIFFICULTY_RANGE.contains(&value) {
                return Err(anyhow!(
                    "{} must be between {} and {}, got {}",
                    key,
                    DIFFICULTY_RANGE.start(),
                    DIFFICULTY_RANGE.end(),
                    value
                ));
            }
        }

        if let Some(label) = &self.version_label {
            if label.trim().is_empty() {
                return Err(anyhow!("Version label must not be blank"));
            }
        }

        if self.output.beatmap_file.trim().is_empty() {
            return Err(anyhow!("Output beatmap file name is required"));
        }
        if self.output.audio_file.trim().is_empty() {
            return Err(anyhow!("Output audio file name is required"));
        }
        AudioFormat::from_path(&self.output.audio_file)?;

        if self.audio.concurrent_probes == 0 {
            return Err(anyhow!("concurrent_probes must be at least 1"));
        }
        if self.audio.input_extensions.is_empty() {
            return Err(anyhow!("At least one audio input extension is required"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            difficulty: DifficultySettings::default(),
            version_label: None,
            output: OutputConfig::default(),
            audio: AudioConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
