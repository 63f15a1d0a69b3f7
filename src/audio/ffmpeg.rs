use async_trait::async_trait;
use log::{debug, error, warn};
use std::future::Future;
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

use crate::app_config::AudioConfig;
use crate::audio::{AudioBackend, AudioFormat, AudioTrack};
use crate::errors::AudioError;

// @module: ffprobe/ffmpeg backed audio capability

/// Sample rate of the PCM stream decoded for length measurement
pub const MEASURE_SAMPLE_RATE: u64 = 48_000;
/// Mono signed 16-bit samples
const MEASURE_BYTES_PER_SAMPLE: u64 = 2;
/// Container estimates further off than this are logged
const CONTAINER_DRIFT_WARN_MS: u64 = 50;

/// Audio backend that runs the ffmpeg command line tools
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    ffmpeg_path: String,
    ffprobe_path: String,
    timeout: Duration,
}

impl FfmpegBackend {
    pub fn new(ffmpeg_path: impl Into<String>, ffprobe_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
            timeout,
        }
    }

    pub fn from_config(config: &AudioConfig) -> Self {
        Self::new(
            config.ffmpeg_path.clone(),
            config.ffprobe_path.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Race `future` against the configured timeout
    async fn with_timeout<T>(&self, tool: &str, future: impl Future<Output = T>) -> Result<T, AudioError> {
        tokio::select! {
            result = future => Ok(result),
            _ = tokio::time::sleep(self.timeout) => Err(AudioError::Timeout {
                tool: tool.to_string(),
                secs: self.timeout.as_secs(),
            }),
        }
    }

    /// Run a command, killing it when the timeout elapses
    async fn run(&self, tool: &str, command: &mut Command) -> Result<std::io::Result<Output>, AudioError> {
        self.with_timeout(tool, command.kill_on_drop(true).output()).await
    }

    /// Decode the first audio stream to mono PCM and count what comes out.
    ///
    /// Container headers of VBR files without a Xing/VBRI frame can be off by
    /// seconds; the decoded sample count cannot.
    async fn measure_decoded_ms(&self, path: &Path) -> Result<u64, AudioError> {
        let decode_error = |reason: String| AudioError::Decode {
            path: path.to_path_buf(),
            reason,
        };

        let mut command = Command::new(&self.ffmpeg_path);
        command
            .args(["-v", "error", "-nostdin", "-i"])
            .arg(path)
            .args(["-map", "0:a:0", "-ac", "1", "-ar"])
            .arg(MEASURE_SAMPLE_RATE.to_string())
            .args(["-f", "s16le", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command
            .spawn()
            .map_err(|e| decode_error(format!("failed to execute {}: {}", self.ffmpeg_path, e)))?;
        let (Some(mut stdout), Some(mut stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(decode_error("ffmpeg output pipes unavailable".to_string()));
        };

        let decoding = async {
            let mut discard = tokio::io::sink();
            let mut stderr_bytes = Vec::new();
            let (pcm_bytes, stderr_read) = tokio::join!(
                tokio::io::copy(&mut stdout, &mut discard),
                stderr.read_to_end(&mut stderr_bytes)
            );
            stderr_read?;
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((pcm_bytes?, stderr_bytes, status))
        };

        let (pcm_bytes, stderr_bytes, status) = self
            .with_timeout("ffmpeg", decoding)
            .await?
            .map_err(|e| decode_error(format!("failed to read decoded audio: {}", e)))?;

        if !status.success() {
            return Err(decode_error(Self::summarize_stderr(&stderr_bytes)));
        }
        if pcm_bytes < MEASURE_BYTES_PER_SAMPLE {
            return Err(decode_error("no audio samples decoded".to_string()));
        }

        Ok(Self::pcm_bytes_to_ms(pcm_bytes))
    }

    /// Container-level duration estimate from ffprobe
    async fn probe_container_ms(&self, path: &Path) -> Result<u64, AudioError> {
        let mut command = Command::new(&self.ffprobe_path);
        command.args([
            "-v", "error",
            "-show_entries", "format=duration",
            "-of", "default=noprint_wrappers=1:nokey=1",
        ]);
        command.arg(path);

        let output = self.run("ffprobe", &mut command).await?.map_err(|e| AudioError::Decode {
            path: path.to_path_buf(),
            reason: format!("failed to execute {}: {}", self.ffprobe_path, e),
        })?;

        if !output.status.success() {
            return Err(AudioError::Decode {
                path: path.to_path_buf(),
                reason: Self::summarize_stderr(&output.stderr),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::parse_duration_ms(&stdout).ok_or_else(|| AudioError::Decode {
            path: path.to_path_buf(),
            reason: format!("ffprobe reported no usable duration: '{}'", stdout.trim()),
        })
    }

    /// Length of a mono s16le stream at `MEASURE_SAMPLE_RATE`, rounded to the nearest millisecond
    pub fn pcm_bytes_to_ms(bytes: u64) -> u64 {
        let samples = u128::from(bytes / MEASURE_BYTES_PER_SAMPLE);
        let rate = u128::from(MEASURE_SAMPLE_RATE);
        ((samples * 1000 + rate / 2) / rate) as u64
    }

    /// Build the concat filter graph for `inputs` audio streams
    pub fn concat_filter(inputs: usize) -> String {
        let mut filter: String = (0..inputs).map(|i| format!("[{}:a]", i)).collect();
        filter.push_str(&format!("concat=n={}:v=0:a=1[out]", inputs));
        filter
    }

    /// Parse ffprobe's `format=duration` output (seconds) into milliseconds
    pub fn parse_duration_ms(stdout: &str) -> Option<u64> {
        stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .and_then(|line| line.parse::<f64>().ok())
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .map(|secs| (secs * 1000.0).round() as u64)
    }

    /// Keep only the meaningful lines of ffmpeg stderr
    fn summarize_stderr(stderr: &[u8]) -> String {
        let stderr = String::from_utf8_lossy(stderr);
        let lines: Vec<&str> = stderr
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        if lines.is_empty() {
            "unknown error (stderr was empty)".to_string()
        } else {
            lines.join("\n")
        }
    }
}

#[async_trait]
impl AudioBackend for FfmpegBackend {
    async fn decode(&self, path: &Path) -> Result<AudioTrack, AudioError> {
        if !path.is_file() {
            return Err(AudioError::Decode {
                path: path.to_path_buf(),
                reason: "file does not exist".to_string(),
            });
        }

        let duration_ms = self.measure_decoded_ms(path).await?;

        match self.probe_container_ms(path).await {
            Ok(estimate_ms) if estimate_ms.abs_diff(duration_ms) > CONTAINER_DRIFT_WARN_MS => warn!(
                "{:?}: container reports {} ms but {} ms decoded; using the decoded length",
                path, estimate_ms, duration_ms
            ),
            Ok(_) => {}
            Err(e) => debug!("No container duration for {:?}: {}", path, e),
        }

        debug!("Decoded {:?}: {} ms", path, duration_ms);
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
        if tracks.is_empty() {
            return Err(AudioError::Encode {
                path: output.to_path_buf(),
                reason: "no input tracks".to_string(),
            });
        }

        let mut command = Command::new(&self.ffmpeg_path);
        command.args(["-y", "-hide_banner", "-loglevel", "error"]);
        for track in tracks {
            command.arg("-i").arg(&track.path);
        }
        command
            .arg("-filter_complex")
            .arg(Self::concat_filter(tracks.len()))
            .args(["-map", "[out]", "-c:a", format.codec(), "-f", format.muxer()])
            .arg(output);

        let result = self.run("ffmpeg", &mut command).await?.map_err(|e| AudioError::Encode {
            path: output.to_path_buf(),
            reason: format!("failed to execute {}: {}", self.ffmpeg_path, e),
        })?;

        if !result.status.success() {
            let reason = Self::summarize_stderr(&result.stderr);
            error!("Audio encoding failed: {}", reason);
            return Err(AudioError::Encode {
                path: output.to_path_buf(),
                reason,
            });
        }

        debug!("Encoded {} tracks to {:?} as {}", tracks.len(), output, format);
        Ok(())
    }
}
