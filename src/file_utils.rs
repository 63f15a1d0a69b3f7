use anyhow::{Context, Result};
use log::warn;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::beatmap::document::FORMAT_PREFIX;
use crate::errors::MergeError;

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    /// Directory a file will be written into, `.` for bare file names
    pub fn parent_dir<P: AsRef<Path>>(path: P) -> PathBuf {
        match path.as_ref().parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Find files directly inside `dir` whose extension is one of `extensions`
    pub fn find_files<P: AsRef<Path>>(dir: P, extensions: &[String]) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).min_depth(1).max_depth(1).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() && Self::has_extension(path, extensions) {
                result.push(path.to_path_buf());
            }
        }

        Ok(result)
    }

    /// Case-insensitive extension check
    pub fn has_extension<P: AsRef<Path>>(path: P, extensions: &[String]) -> bool {
        path.as_ref().extension().is_some_and(|ext| {
            let ext = ext.to_string_lossy();
            extensions
                .iter()
                .any(|wanted| ext.eq_ignore_ascii_case(wanted.trim_start_matches('.')))
        })
    }

    /// Integer value of a file stem (`3` for `3.osu`)
    pub fn numeric_stem<P: AsRef<Path>>(path: P) -> Option<u64> {
        path.as_ref()
            .file_stem()
            .and_then(|stem| stem.to_string_lossy().trim().parse().ok())
    }

    /// Keep numbered files only and sort them by number
    pub fn sort_numbered(paths: Vec<PathBuf>) -> Vec<PathBuf> {
        let mut numbered: Vec<(u64, PathBuf)> = paths
            .into_iter()
            .filter_map(|path| match Self::numeric_stem(&path) {
                Some(number) => Some((number, path)),
                None => {
                    warn!("Skipping {:?}: file name is not a number", path);
                    None
                }
            })
            .collect();
        numbered.sort_by_key(|(number, _)| *number);
        numbered.into_iter().map(|(_, path)| path).collect()
    }

    /// Collect numbered `.osu` files and their numbered audio files from a directory.
    ///
    /// Both lists are sorted by the number in the file name and paired by
    /// position; the counts must match.
    pub fn discover_numbered_pairs<P: AsRef<Path>>(
        dir: P,
        audio_extensions: &[String],
    ) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
        let dir = dir.as_ref();
        if !Self::dir_exists(dir) {
            return Err(anyhow::anyhow!("Input directory does not exist: {:?}", dir));
        }

        let beatmaps = Self::sort_numbered(Self::find_files(dir, &["osu".to_string()])?);
        let audio = Self::sort_numbered(Self::find_files(dir, audio_extensions)?);

        if beatmaps.len() != audio.len() {
            return Err(MergeError::InputCountMismatch {
                documents: beatmaps.len(),
                audio: audio.len(),
            }
            .into());
        }
        if beatmaps.is_empty() {
            return Err(MergeError::EmptyInput.into());
        }

        Ok((beatmaps, audio))
    }

    /// Detect if a file is a beatmap or an audio file
    pub fn detect_file_type<P: AsRef<Path>>(path: P, audio_extensions: &[String]) -> Result<FileType> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(anyhow::anyhow!("File does not exist: {:?}", path));
        }

        if Self::has_extension(path, &["osu".to_string()]) {
            return Ok(FileType::Beatmap);
        }
        if Self::has_extension(path, audio_extensions) {
            return Ok(FileType::Audio);
        }

        // Fall back to examining file contents
        if let Ok(content) = fs::read_to_string(path) {
            let content = content.trim_start_matches('\u{feff}').trim_start();
            if content.starts_with(FORMAT_PREFIX) {
                return Ok(FileType::Beatmap);
            }
        }

        Ok(FileType::Unknown)
    }
}

/// Enum representing different file types
#[derive(Debug, PartialEq, Eq)]
pub enum FileType {
    /// Beatmap text file (.osu)
    Beatmap,
    /// Audio track
    Audio,
    /// Unknown file type
    Unknown,
}
