/*!
 * # beatmerge - rhythm game beatmap compilation builder
 *
 * A Rust library for concatenating several `.osu` beatmaps and their audio
 * tracks into a single compilation map with one continuous audio track.
 *
 * ## Features
 *
 * - Parse the sectioned beatmap text format
 * - Shift every timing point and hit-object (including held-object end times)
 *   onto the shared timeline
 * - Override difficulty values and the version label of the compilation
 * - Concatenate and re-encode audio through ffmpeg
 * - Discover numbered beatmap/audio pairs in a directory
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `beatmap`: Beatmap text format:
 *   - `beatmap::document`: Section parser and canonical writer
 *   - `beatmap::records`: Timing-point and hit-object records
 *   - `beatmap::timeline`: Timeline offsetting
 *   - `beatmap::info`: Display info and audio resolution
 * - `merger`: Merges parsed beatmaps onto one timeline
 * - `audio`: Audio decode/concatenate/encode capability
 * - `app_config`: Configuration management
 * - `app_controller`: Main application controller
 * - `file_utils`: File system operations and input discovery
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod audio;
pub mod beatmap;
pub mod errors;
pub mod file_utils;
pub mod merger;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, MergeRequest, MergeSummary};
pub use audio::{AudioBackend, AudioFormat, AudioTrack};
pub use beatmap::{Document, MapInfo, SectionKind};
pub use errors::{AudioError, BeatmapError, MergeError};
pub use merger::{merge_documents, DifficultySettings, MergeReport, MergeSettings};
