/*!
 * Merges several beatmaps onto one continuous timeline.
 *
 * Inputs are processed strictly in the order given. Each input's timing points
 * and hit-objects are shifted by the summed audio duration of every input before
 * it. `General`, `Metadata`, `Difficulty`, `Events` and the format declaration
 * are taken from the first input, with the audio file name, version label and
 * difficulty values overridden.
 */

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::beatmap::document::{has_key, Document, SectionKind};
use crate::beatmap::records::{HitObject, TimingPoint};
use crate::beatmap::timeline::apply_offset;
use crate::errors::MergeError;

/// Difficulty values written into the merged `[Difficulty]` section
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultySettings {
    /// HP drain rate
    #[serde(default = "default_hp_drain_rate")]
    pub hp_drain_rate: f64,

    /// Circle size
    #[serde(default = "default_circle_size")]
    pub circle_size: f64,

    /// Overall difficulty
    #[serde(default = "default_overall_difficulty")]
    pub overall_difficulty: f64,

    /// Approach rate
    #[serde(default = "default_approach_rate")]
    pub approach_rate: f64,
}

impl DifficultySettings {
    /// Difficulty lines in output order
    pub fn lines(&self) -> Vec<String> {
        self.entries()
            .iter()
            .map(|(key, value)| format!("{}: {}", key, format_difficulty_value(*value)))
            .collect()
    }

    /// Keys and values in output order
    pub fn entries(&self) -> [(&'static str, f64); 4] {
        [
            ("HPDrainRate", self.hp_drain_rate),
            ("CircleSize", self.circle_size),
            ("OverallDifficulty", self.overall_difficulty),
            ("ApproachRate", self.approach_rate),
        ]
    }
}

impl Default for DifficultySettings {
    fn default() -> Self {
        Self {
            hp_drain_rate: default_hp_drain_rate(),
            circle_size: default_circle_size(),
            overall_difficulty: default_overall_difficulty(),
            approach_rate: default_approach_rate(),
        }
    }
}

fn default_hp_drain_rate() -> f64 {
    5.0
}

fn default_circle_size() -> f64 {
    4.0
}

fn default_overall_difficulty() -> f64 {
    8.0
}

fn default_approach_rate() -> f64 {
    9.0
}

/// Whole numbers keep one decimal place (`6.0`), others print as-is (`3.5`)
pub fn format_difficulty_value(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Caller-supplied overrides for one merge
#[derive(Debug, Clone, PartialEq)]
pub struct MergeSettings {
    pub difficulty: DifficultySettings,
    /// Replaces `Version:` in `[Metadata]` when set
    pub version_label: Option<String>,
    /// Base file name of the merged audio track
    pub audio_filename: String,
}

/// Counts describing a finished merge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub inputs: usize,
    pub timing_points: usize,
    pub hit_objects: usize,
    pub dropped_timing_points: usize,
    pub dropped_hit_objects: usize,
    /// Later inputs declaring a different format version than the first
    pub format_mismatches: usize,
    /// Sum of all input durations
    pub total_duration_ms: u64,
}

impl MergeReport {
    pub fn dropped_lines(&self) -> usize {
        self.dropped_timing_points + self.dropped_hit_objects
    }

    pub fn summary(&self) -> String {
        format!(
            "{} maps, {} timing points, {} hit objects, {} dropped lines, total length {}",
            self.inputs,
            self.timing_points,
            self.hit_objects,
            self.dropped_lines(),
            format_millis(self.total_duration_ms)
        )
    }
}

fn describe_format(format: Option<u32>) -> String {
    format.map_or_else(|| "unknown".to_string(), |v| format!("v{}", v))
}

/// Format milliseconds as `M:SS.mmm`
pub fn format_millis(ms: u64) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;
    format!("{}:{:02}.{:03}", minutes, seconds, millis)
}

/// The merged document together with its report
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub document: Document,
    pub report: MergeReport,
}

/// Merge `documents` in order, each followed by its audio duration in `durations_ms`.
pub fn merge_documents(
    documents: &[Document],
    durations_ms: &[u64],
    settings: &MergeSettings,
) -> Result<MergeOutcome, MergeError> {
    if documents.len() != durations_ms.len() {
        return Err(MergeError::InputCountMismatch {
            documents: documents.len(),
            audio: durations_ms.len(),
        });
    }
    let Some(first) = documents.first() else {
        return Err(MergeError::EmptyInput);
    };

    let mut merged = seed_from_first(first, settings);
    let mut report = MergeReport {
        inputs: documents.len(),
        ..MergeReport::default()
    };

    let mut timing_points: Vec<TimingPoint> = Vec::new();
    let mut hit_objects: Vec<HitObject> = Vec::new();
    let mut cumulative_offset: i64 = 0;

    let first_format = first.format_number();

    for (index, (document, &duration_ms)) in documents.iter().zip(durations_ms).enumerate() {
        let format = document.format_number();
        if index > 0 && format != first_format {
            warn!(
                "Input {} declares format {} but the merged map keeps {}",
                index + 1,
                describe_format(format),
                describe_format(first_format)
            );
            report.format_mismatches += 1;
        }

        let timeline = apply_offset(
            document.section(SectionKind::TimingPoints),
            document.section(SectionKind::HitObjects),
            cumulative_offset,
        );
        debug!(
            "Input {} placed at {} ms ({} timing points, {} hit objects)",
            index + 1,
            cumulative_offset,
            timeline.timing_points.len(),
            timeline.hit_objects.len()
        );

        report.dropped_timing_points += timeline.dropped_timing_points;
        report.dropped_hit_objects += timeline.dropped_hit_objects;
        timing_points.extend(timeline.timing_points);
        hit_objects.extend(timeline.hit_objects);

        cumulative_offset = cumulative_offset.saturating_add(i64::try_from(duration_ms).unwrap_or(i64::MAX));
        report.total_duration_ms = report.total_duration_ms.saturating_add(duration_ms);
    }

    // Stable sorts: simultaneous records keep input-then-line order
    timing_points.sort_by_key(TimingPoint::start_time);
    hit_objects.sort_by_key(|object| object.time);

    report.timing_points = timing_points.len();
    report.hit_objects = hit_objects.len();

    merged.set_section(
        SectionKind::TimingPoints,
        timing_points.iter().map(ToString::to_string).collect(),
    );
    merged.set_section(
        SectionKind::HitObjects,
        hit_objects.iter().map(ToString::to_string).collect(),
    );

    info!("Merged {}", report.summary());

    Ok(MergeOutcome {
        document: merged,
        report,
    })
}

fn seed_from_first(first: &Document, settings: &MergeSettings) -> Document {
    let mut merged = Document::new(Some(first.format_version_or_default().to_string()));

    merged.set_section(
        SectionKind::General,
        seed_general(first.section(SectionKind::General), &settings.audio_filename),
    );
    merged.set_section(
        SectionKind::Metadata,
        seed_metadata(first.section(SectionKind::Metadata), settings.version_label.as_deref()),
    );
    merged.set_section(
        SectionKind::Difficulty,
        seed_difficulty(first.section(SectionKind::Difficulty), &settings.difficulty),
    );
    merged.set_section(
        SectionKind::Events,
        trim_trailing_blank(first.section(SectionKind::Events).to_vec()),
    );

    merged
}

/// Copy `[General]`, pointing `AudioFilename` at the merged track
pub fn seed_general(lines: &[String], audio_filename: &str) -> Vec<String> {
    let mut general = without_keys(lines, &["AudioFilename"]);
    general.push(format!("AudioFilename: {}", audio_filename));
    general
}

/// Copy `[Metadata]`, replacing `Version:` when a label is given
pub fn seed_metadata(lines: &[String], version_label: Option<&str>) -> Vec<String> {
    match version_label {
        Some(label) => {
            let mut metadata = without_keys(lines, &["Version"]);
            metadata.push(format!("Version:{}", label));
            metadata
        }
        None => trim_trailing_blank(lines.to_vec()),
    }
}

/// Copy `[Difficulty]` with HP, CS, OD and AR replaced by `difficulty`
pub fn seed_difficulty(lines: &[String], difficulty: &DifficultySettings) -> Vec<String> {
    let keys: Vec<&str> = difficulty.entries().iter().map(|(key, _)| *key).collect();
    let mut section = without_keys(lines, &keys);
    section.extend(difficulty.lines());
    section
}

fn without_keys(lines: &[String], keys: &[&str]) -> Vec<String> {
    let kept = lines
        .iter()
        .filter(|line| !keys.iter().any(|key| has_key(line, key)))
        .cloned()
        .collect();
    trim_trailing_blank(kept)
}

// Trailing blank lines are section separators from the source file
fn trim_trailing_blank(mut lines: Vec<String>) -> Vec<String> {
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }
    lines
}
