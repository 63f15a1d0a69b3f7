use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::BeatmapError;

// @module: Section parsing and canonical serialization of beatmap text

/// Prefix of the format declaration line
pub const FORMAT_PREFIX: &str = "osu file format";

/// Format declaration used when a document has none
pub const DEFAULT_FORMAT_VERSION: &str = "osu file format v14";

// @const: Format declaration with its version number
static FORMAT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^osu file format v(\d+)").unwrap()
});

/// The sections the merge reads and writes by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    General,
    Metadata,
    Difficulty,
    Events,
    TimingPoints,
    HitObjects,
}

impl SectionKind {
    /// Canonical output order
    pub const WRITE_ORDER: [SectionKind; 6] = [
        SectionKind::General,
        SectionKind::Metadata,
        SectionKind::Difficulty,
        SectionKind::Events,
        SectionKind::TimingPoints,
        SectionKind::HitObjects,
    ];

    // @returns: Header name without brackets
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "General",
            Self::Metadata => "Metadata",
            Self::Difficulty => "Difficulty",
            Self::Events => "Events",
            Self::TimingPoints => "TimingPoints",
            Self::HitObjects => "HitObjects",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Split a `Key: value` line into its trimmed key and trimmed value
pub fn key_value(line: &str) -> Option<(&str, &str)> {
    line.split_once(':').map(|(key, value)| (key.trim(), value.trim()))
}

/// Whether `line` is a `key:` entry for exactly `key`
pub fn has_key(line: &str, key: &str) -> bool {
    key_value(line).is_some_and(|(k, _)| k == key)
}

/// One parsed beatmap: a format declaration plus named sections of raw lines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    format_version: Option<String>,
    sections: HashMap<String, Vec<String>>,
}

impl Document {
    /// Create an empty document
    pub fn new(format_version: Option<String>) -> Self {
        Self {
            format_version,
            sections: HashMap::new(),
        }
    }

    /// Read and parse a beatmap file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, BeatmapError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| BeatmapError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(path, bytes)
    }

    /// Decode raw bytes as UTF-8 text and parse them; `path` is only used for errors
    pub fn from_bytes<P: AsRef<Path>>(path: P, bytes: Vec<u8>) -> Result<Self, BeatmapError> {
        let content = String::from_utf8(bytes).map_err(|e| BeatmapError::Parse {
            path: path.as_ref().to_path_buf(),
            reason: format!("content is not valid UTF-8 text ({})", e.utf8_error()),
        })?;
        Ok(Self::parse(&content))
    }

    /// Parse beatmap text into sections.
    ///
    /// A line that starts with `[` and ends with `]` opens a section; a repeated
    /// section name replaces the earlier one. Before the first header only the
    /// format declaration is kept.
    pub fn parse(content: &str) -> Self {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut document = Self::default();
        let mut current: Option<String> = None;

        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with('[') && trimmed.ends_with(']') && trimmed.len() >= 2 {
                let name = trimmed[1..trimmed.len() - 1].to_string();
                document.sections.insert(name.clone(), Vec::new());
                current = Some(name);
                continue;
            }

            match &current {
                Some(name) => {
                    if let Some(lines) = document.sections.get_mut(name) {
                        lines.push(line.to_string());
                    }
                }
                None => {
                    if document.format_version.is_none() && trimmed.starts_with(FORMAT_PREFIX) {
                        document.format_version = Some(trimmed.to_string());
                    }
                }
            }
        }

        document
    }

    /// Format declaration as authored, if any
    pub fn format_version(&self) -> Option<&str> {
        self.format_version.as_deref()
    }

    /// Format declaration, falling back to the current default
    pub fn format_version_or_default(&self) -> &str {
        self.format_version().unwrap_or(DEFAULT_FORMAT_VERSION)
    }

    /// Numeric version from the format declaration (`14` for `v14`)
    pub fn format_number(&self) -> Option<u32> {
        FORMAT_REGEX
            .captures(self.format_version_or_default())
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    /// Lines of a recognized section; empty when the section is absent
    pub fn section(&self, kind: SectionKind) -> &[String] {
        self.sections
            .get(kind.name())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn set_section(&mut self, kind: SectionKind, lines: Vec<String>) {
        self.sections.insert(kind.name().to_string(), lines);
    }

    /// Value of the first `key:` line in a section
    pub fn value_of(&self, kind: SectionKind, key: &str) -> Option<&str> {
        self.section(kind)
            .iter()
            .filter_map(|line| key_value(line))
            .find(|(k, _)| *k == key)
            .map(|(_, value)| value)
    }

    /// Serialize in canonical section order
    pub fn to_osu_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.format_version_or_default())?;
        writeln!(f)?;
        for kind in SectionKind::WRITE_ORDER {
            let lines = self.section(kind);
            if lines.is_empty() {
                continue;
            }
            writeln!(f, "[{}]", kind)?;
            for line in lines {
                writeln!(f, "{}", line)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
