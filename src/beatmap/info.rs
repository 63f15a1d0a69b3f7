use std::path::{Path, PathBuf};

use crate::beatmap::document::{Document, SectionKind};
use crate::errors::BeatmapError;

// @module: Display information for a single beatmap

/// What a user needs to see about one beatmap before merging it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapInfo {
    /// Path of the `.osu` file
    pub osu_path: PathBuf,
    /// `AudioFilename` value from `[General]`
    pub audio_filename: Option<String>,
    /// Audio file next to the beatmap, only set when it exists
    pub audio_path: Option<PathBuf>,
    pub artist: String,
    pub title: String,
    /// `Artist - Title`, or the file name when both are empty
    pub display_name: String,
}

impl MapInfo {
    /// Read a beatmap and resolve its audio file
    pub fn from_path<P: AsRef<Path>>(osu_path: P) -> Result<Self, BeatmapError> {
        let osu_path = osu_path.as_ref();
        let document = Document::load(osu_path)?;
        Ok(Self::from_document(osu_path, &document))
    }

    /// Build map info from an already parsed document
    pub fn from_document<P: AsRef<Path>>(osu_path: P, document: &Document) -> Self {
        let osu_path = osu_path.as_ref();
        let osu_dir = osu_path.parent().unwrap_or(Path::new(""));

        let audio_filename = document
            .value_of(SectionKind::General, "AudioFilename")
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        let audio_path = audio_filename
            .as_ref()
            .map(|name| osu_dir.join(name))
            .filter(|candidate| candidate.is_file());

        let artist = document
            .value_of(SectionKind::Metadata, "Artist")
            .unwrap_or_default()
            .to_string();
        let title = document
            .value_of(SectionKind::Metadata, "Title")
            .unwrap_or_default()
            .to_string();

        let display_name = if artist.is_empty() && title.is_empty() {
            osu_path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_else(|| osu_path.display().to_string())
        } else {
            format!("{} - {}", artist, title)
        };

        Self {
            osu_path: osu_path.to_path_buf(),
            audio_filename,
            audio_path,
            artist,
            title,
            display_name,
        }
    }

    /// Audio column text, flagging unresolved files
    pub fn audio_label(&self) -> String {
        let name = self.audio_filename.as_deref().unwrap_or("(not found)");
        if self.audio_path.is_some() {
            name.to_string()
        } else {
            format!("{}  [MISSING]", name)
        }
    }
}
