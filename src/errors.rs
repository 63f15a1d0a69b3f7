/*!
 * Error types for the beatmerge application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading a beatmap document
#[derive(Error, Debug)]
pub enum BeatmapError {
    /// The file could not be read from disk
    #[error("Failed to read beatmap {path:?}: {source}")]
    Read {
        /// Offending file
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The file content is not decodable text
    #[error("Failed to parse beatmap {path:?}: {reason}")]
    Parse {
        /// Offending file
        path: PathBuf,
        /// Why decoding failed
        reason: String,
    },
}

/// Errors that abort a merge before any processing begins
#[derive(Error, Debug, PartialEq, Eq)]
pub enum MergeError {
    /// No inputs were supplied
    #[error("No beatmaps to merge")]
    EmptyInput,

    /// Beatmap and audio lists have different lengths
    #[error("Number of beatmaps ({documents}) and audio files ({audio}) do not match")]
    InputCountMismatch {
        /// Number of beatmap documents
        documents: usize,
        /// Number of audio tracks
        audio: usize,
    },
}

/// Errors surfaced by the audio capability
#[derive(Error, Debug)]
pub enum AudioError {
    /// An input track could not be decoded or measured
    #[error("Failed to decode audio {path:?}: {reason}")]
    Decode {
        /// Offending input
        path: PathBuf,
        /// Tool output or description
        reason: String,
    },

    /// The combined track could not be encoded
    #[error("Failed to encode audio {path:?}: {reason}")]
    Encode {
        /// Output being written
        path: PathBuf,
        /// Tool output or description
        reason: String,
    },

    /// Output extension has no known encoder
    #[error("Unsupported audio output format: {0}")]
    UnsupportedFormat(String),

    /// An external tool did not finish in time
    #[error("{tool} timed out after {secs} seconds")]
    Timeout {
        /// Tool name
        tool: String,
        /// Configured timeout
        secs: u64,
    },
}
