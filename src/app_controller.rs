use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::audio::{self, AudioBackend, AudioFormat, FfmpegBackend};
use crate::beatmap::{Document, MapInfo};
use crate::errors::MergeError;
use crate::file_utils::{FileManager, FileType};
use crate::merger::{self, MergeReport, MergeSettings};

// @module: Application controller for beatmap merging

/// Ordered inputs and output targets for one merge
#[derive(Debug, Clone)]
pub struct MergeRequest {
    /// Beatmap files in playback order
    pub beatmaps: Vec<PathBuf>,
    /// Audio files, one per beatmap, same order
    pub audio: Vec<PathBuf>,
    pub output_beatmap: PathBuf,
    pub output_audio: PathBuf,
    /// Replace existing output files
    pub force_overwrite: bool,
}

/// Result of a successful merge
#[derive(Debug, Clone)]
pub struct MergeSummary {
    pub output_beatmap: PathBuf,
    pub output_audio: PathBuf,
    pub report: MergeReport,
    pub elapsed: Duration,
}

/// Main application controller for beatmap merging
#[derive(Debug)]
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Audio decode/encode capability
    audio: Arc<dyn AudioBackend>,
}

impl Controller {
    // @method: Create a controller backed by ffmpeg
    pub fn with_config(config: Config) -> Result<Self> {
        let backend = FfmpegBackend::from_config(&config.audio);
        Ok(Self::with_backend(config, Arc::new(backend)))
    }

    /// Create a controller with a specific audio backend
    pub fn with_backend(config: Config, audio: Arc<dyn AudioBackend>) -> Self {
        Self { config, audio }
    }

    /// Merge settings for an output audio path
    pub fn merge_settings(&self, output_audio: &Path) -> MergeSettings {
        let audio_filename = output_audio
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.config.output.audio_file.clone());

        MergeSettings {
            difficulty: self.config.difficulty,
            version_label: self.config.version_label.clone(),
            audio_filename,
        }
    }

    /// Merge numbered beatmap/audio pairs found in a directory
    pub async fn run_folder(&self, input_dir: &Path, force_overwrite: bool) -> Result<MergeSummary> {
        info!("Scanning {:?} for numbered beatmaps", input_dir);
        let (beatmaps, audio) =
            FileManager::discover_numbered_pairs(input_dir, &self.config.audio.input_extensions)?;

        for (index, (beatmap, track)) in beatmaps.iter().zip(&audio).enumerate() {
            debug!("#{}: {:?} + {:?}", index + 1, beatmap, track);
        }

        self.run(self.request(beatmaps, audio, force_overwrite)).await
    }

    /// Merge an explicit list of beatmaps, using the audio each one references
    pub async fn run_maps(&self, osu_paths: &[PathBuf], force_overwrite: bool) -> Result<MergeSummary> {
        if osu_paths.is_empty() {
            return Err(MergeError::EmptyInput.into());
        }

        let infos = Self::inspect(osu_paths, &self.config.audio.input_extensions)?;
        let missing: Vec<&str> = infos
            .iter()
            .filter(|info| info.audio_path.is_none())
            .map(|info| info.display_name.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(anyhow!("Could not find audio files for:\n{}", missing.join("\n")));
        }

        let beatmaps = infos.iter().map(|info| info.osu_path.clone()).collect();
        let audio = infos.into_iter().filter_map(|info| info.audio_path).collect();

        self.run(self.request(beatmaps, audio, force_overwrite)).await
    }

    /// Read display information for each beatmap
    pub fn inspect(osu_paths: &[PathBuf], audio_extensions: &[String]) -> Result<Vec<MapInfo>> {
        osu_paths
            .iter()
            .map(|path| {
                if FileManager::detect_file_type(path, audio_extensions)? != FileType::Beatmap {
                    return Err(anyhow!("Not a beatmap file: {:?}", path));
                }
                Ok(MapInfo::from_path(path)?)
            })
            .collect()
    }

    fn request(&self, beatmaps: Vec<PathBuf>, audio: Vec<PathBuf>, force_overwrite: bool) -> MergeRequest {
        MergeRequest {
            beatmaps,
            audio,
            output_beatmap: PathBuf::from(&self.config.output.beatmap_file),
            output_audio: PathBuf::from(&self.config.output.audio_file),
            force_overwrite,
        }
    }

    /// Run a merge. Nothing is written unless every input parses and decodes
    /// and the merged audio encodes successfully.
    pub async fn run(&self, request: MergeRequest) -> Result<MergeSummary> {
        let start_time = Instant::now();

        if request.beatmaps.len() != request.audio.len() {
            return Err(MergeError::InputCountMismatch {
                documents: request.beatmaps.len(),
                audio: request.audio.len(),
            }
            .into());
        }
        if request.beatmaps.is_empty() {
            return Err(MergeError::EmptyInput.into());
        }

        let format = AudioFormat::from_path(&request.output_audio)?;
        for output in [&request.output_beatmap, &request.output_audio] {
            if FileManager::file_exists(output) && !request.force_overwrite {
                return Err(anyhow!(
                    "Output file already exists: {:?}. Use -f to force overwrite.",
                    output
                ));
            }
        }

        let documents = self.load_documents(&request.beatmaps)?;

        info!("Reading durations of {} audio tracks", request.audio.len());
        let tracks = audio::decode_all(
            self.audio.as_ref(),
            &request.audio,
            self.config.audio.concurrent_probes,
        )
        .await?;
        let durations: Vec<u64> = tracks.iter().map(|track| track.duration_ms).collect();

        let outcome = merger::merge_documents(
            &documents,
            &durations,
            &self.merge_settings(&request.output_audio),
        )?;
        if outcome.report.dropped_lines() > 0 {
            warn!(
                "Dropped {} malformed timing point(s) and {} malformed hit object(s)",
                outcome.report.dropped_timing_points, outcome.report.dropped_hit_objects
            );
        }
        let beatmap_text = outcome.document.to_osu_string();

        // Stage both outputs next to their targets, then move them into place
        let audio_dir = FileManager::parent_dir(&request.output_audio);
        let beatmap_dir = FileManager::parent_dir(&request.output_beatmap);
        FileManager::ensure_dir(&audio_dir)?;
        FileManager::ensure_dir(&beatmap_dir)?;

        let staged_audio = tempfile::Builder::new()
            .prefix(".beatmerge-")
            .suffix(&format!(".{}", format.extension()))
            .tempfile_in(&audio_dir)
            .context("Failed to create temporary audio file")?;

        info!("Encoding merged audio as {}", format);
        self.audio
            .concatenate_and_encode(&tracks, staged_audio.path(), format)
            .await?;

        let mut staged_beatmap = tempfile::Builder::new()
            .prefix(".beatmerge-")
            .suffix(".osu")
            .tempfile_in(&beatmap_dir)
            .context("Failed to create temporary beatmap file")?;
        std::io::Write::write_all(&mut staged_beatmap, beatmap_text.as_bytes())
            .context("Failed to write merged beatmap")?;

        staged_audio
            .persist(&request.output_audio)
            .map_err(|e| anyhow!("Failed to write {:?}: {}", request.output_audio, e.error))?;
        if let Err(e) = staged_beatmap.persist(&request.output_beatmap) {
            // The audio already landed; take it back so no half-merge remains
            if let Err(remove_err) = std::fs::remove_file(&request.output_audio) {
                warn!("Failed to remove {:?}: {}", request.output_audio, remove_err);
            }
            return Err(anyhow!("Failed to write {:?}: {}", request.output_beatmap, e.error));
        }

        let elapsed = start_time.elapsed();
        info!("Success: {:?} + {:?}", request.output_beatmap, request.output_audio);
        info!("Merge completed in {}.", Self::format_duration(elapsed));

        Ok(MergeSummary {
            output_beatmap: request.output_beatmap,
            output_audio: request.output_audio,
            report: outcome.report,
            elapsed,
        })
    }

    /// Parse every beatmap in order, stopping at the first unreadable one
    fn load_documents(&self, paths: &[PathBuf]) -> Result<Vec<Document>> {
        let progress_bar = ProgressBar::new(paths.len() as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} maps {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("#>-"));

        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            progress_bar.set_message(
                path.file_name()
                    .map(|name| name.to_string_lossy().to_string())
                    .unwrap_or_default(),
            );
            let document = match Document::load(path) {
                Ok(document) => document,
                Err(e) => {
                    progress_bar.abandon();
                    return Err(e.into());
                }
            };
            documents.push(document);
            progress_bar.inc(1);
        }

        progress_bar.finish_and_clear();
        Ok(documents)
    }

    // Format duration in a human-readable format (HH:MM:SS)
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
