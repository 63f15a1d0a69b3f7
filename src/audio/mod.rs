/*!
 * Audio capability used by the merge.
 *
 * The merge depends on two things only: an accurate duration for every input
 * track, and an order-preserving concatenation of all inputs into one encoded
 * file. Implementations:
 * - `ffmpeg`: shells out to ffprobe/ffmpeg
 * - `mock`: in-memory durations for tests
 */

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::fmt::{self, Debug};
use std::path::{Path, PathBuf};

use crate::errors::AudioError;

pub mod ffmpeg;
pub mod mock;

pub use ffmpeg::FfmpegBackend;
pub use mock::MockAudioBackend;

/// A decoded input track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioTrack {
    /// Source file
    pub path: PathBuf,
    /// Duration in whole milliseconds
    pub duration_ms: u64,
}

/// Encodings the merged track can be written in, chosen by output extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Wav,
    Ogg,
    Flac,
}

impl AudioFormat {
    /// Every supported output format
    pub const ALL: [AudioFormat; 4] = [Self::Mp3, Self::Wav, Self::Ogg, Self::Flac];

    /// Match a file extension, case-insensitively
    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.trim_start_matches('.');
        Self::ALL
            .into_iter()
            .find(|format| format.extension().eq_ignore_ascii_case(extension))
    }

    /// Format implied by an output path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, AudioError> {
        let path = path.as_ref();
        path.extension()
            .and_then(|ext| Self::from_extension(&ext.to_string_lossy()))
            .ok_or_else(|| AudioError::UnsupportedFormat(path.display().to_string()))
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Ogg => "ogg",
            Self::Flac => "flac",
        }
    }

    // @returns: ffmpeg audio codec name
    pub fn codec(&self) -> &'static str {
        match self {
            Self::Mp3 => "libmp3lame",
            Self::Wav => "pcm_s16le",
            Self::Ogg => "libvorbis",
            Self::Flac => "flac",
        }
    }

    // @returns: ffmpeg muxer name
    pub fn muxer(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Ogg => "ogg",
            Self::Flac => "flac",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Decode, concatenate and encode audio tracks
#[async_trait]
pub trait AudioBackend: Send + Sync + Debug {
    /// Decode one input and report its duration
    async fn decode(&self, path: &Path) -> Result<AudioTrack, AudioError>;

    /// Concatenate `tracks` in the given order and encode them to `output`
    async fn concatenate_and_encode(
        &self,
        tracks: &[AudioTrack],
        output: &Path,
        format: AudioFormat,
    ) -> Result<(), AudioError>;
}

/// Decode every path, at most `concurrency` at a time.
///
/// Results come back in the same order as `paths` regardless of which decode
/// finishes first; the first failure aborts the whole batch.
pub async fn decode_all(
    backend: &dyn AudioBackend,
    paths: &[PathBuf],
    concurrency: usize,
) -> Result<Vec<AudioTrack>, AudioError> {
    stream::iter(paths.iter())
        .map(|path| backend.decode(path))
        .buffered(concurrency.max(1))
        .try_collect()
        .await
}
