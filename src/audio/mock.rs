/*!
 * Mock audio backend for testing.
 *
 * Durations are looked up by file name instead of decoding real audio, and
 * "encoding" writes a small text file listing the concatenated inputs so tests
 * can check the output order:
 * - `MockAudioBackend::new()` - every decode fails unless a duration is registered
 * - `MockAudioBackend::with_default_duration(ms)` - unknown files get `ms`
 * - `failing_decode(name)` / `failing_encode()` - inject failures
 * - `with_delay(name, delay)` - hold a decode back so completions can overtake it
 */

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::audio::{AudioBackend, AudioFormat, AudioTrack};
use crate::errors::AudioError;

/// Mock backend with configured durations
#[derive(Debug, Clone, Default)]
pub struct MockAudioBackend {
    /// Durations keyed by file name
    durations: HashMap<String, u64>,
    /// Duration for files without an entry
    default_duration_ms: Option<u64>,
    /// File names whose decode fails
    failing_decodes: HashSet<String>,
    fail_encode: bool,
    /// Sleep before answering a decode, keyed by file name
    delays: HashMap<String, Duration>,
    decode_count: Arc<AtomicUsize>,
    /// File names in the order their decodes finished
    completed: Arc<Mutex<Vec<String>>>,
    /// Input paths of every concatenation, in call order
    encoded: Arc<Mutex<Vec<Vec<PathBuf>>>>,
}

impl MockAudioBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give every unregistered file the same duration
    pub fn with_default_duration(duration_ms: u64) -> Self {
        Self {
            default_duration_ms: Some(duration_ms),
            ..Self::default()
        }
    }

    /// Register the duration for a file name
    pub fn with_duration(mut self, file_name: &str, duration_ms: u64) -> Self {
        self.durations.insert(file_name.to_string(), duration_ms);
        self
    }

    /// Delay the decode of `file_name`
    pub fn with_delay(mut self, file_name: &str, delay: Duration) -> Self {
        self.delays.insert(file_name.to_string(), delay);
        self
    }

    /// Make decoding `file_name` fail
    pub fn failing_decode(mut self, file_name: &str) -> Self {
        self.failing_decodes.insert(file_name.to_string());
        self
    }

    /// Make every encode fail
    pub fn failing_encode(mut self) -> Self {
        self.fail_encode = true;
        self
    }

    /// Number of decode calls so far
    pub fn decode_count(&self) -> usize {
        self.decode_count.load(Ordering::SeqCst)
    }

    /// File names in decode completion order
    pub fn completion_order(&self) -> Vec<String> {
        self.completed.lock().map(|names| names.clone()).unwrap_or_default()
    }

    /// Inputs passed to each concatenation so far
    pub fn encoded_inputs(&self) -> Vec<Vec<PathBuf>> {
        self.encoded.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn file_name(path: &Path) -> String {
        path.file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AudioBackend for MockAudioBackend {
    async fn decode(&self, path: &Path) -> Result<AudioTrack, AudioError> {
        self.decode_count.fetch_add(1, Ordering::SeqCst);
        let name = Self::file_name(path);

        if let Some(delay) = self.delays.get(&name) {
            tokio::time::sleep(*delay).await;
        }
        if let Ok(mut names) = self.completed.lock() {
            names.push(name.clone());
        }

        if self.failing_decodes.contains(&name) {
            return Err(AudioError::Decode {
                path: path.to_path_buf(),
                reason: "simulated decode failure".to_string(),
            });
        }

        let duration_ms = self
            .durations
            .get(&name)
            .copied()
            .or(self.default_duration_ms)
            .ok_or_else(|| AudioError::Decode {
                path: path.to_path_buf(),
                reason: "no duration registered".to_string(),
            })?;

        Ok(AudioTrack {
            path: path.to_path_buf(),
            duration_ms,
        })
    }

    async fn concatenate_and_encode(
        &self,
        tracks: &[AudioTrack],
        output: &Path,
        format: AudioFormat,
    ) -> Result<(), AudioError> {
        if self.fail_encode {
            return Err(AudioError::Encode {
                path: output.to_path_buf(),
                reason: "simulated encode failure".to_string(),
            });
        }

        let inputs: Vec<PathBuf> = tracks.iter().map(|t| t.path.clone()).collect();
        let listing: Vec<String> = tracks
            .iter()
            .map(|t| format!("{} {}", Self::file_name(&t.path), t.duration_ms))
            .collect();
        std::fs::write(output, format!("{}\n{}\n", format, listing.join("\n"))).map_err(|e| {
            AudioError::Encode {
                path: output.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        if let Ok(mut calls) = self.encoded.lock() {
            calls.push(inputs);
        }
        Ok(())
    }
}
