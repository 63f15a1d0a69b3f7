/*!
 * Tests for merging several beatmaps onto one timeline
 */

use beatmerge::beatmap::document::{Document, SectionKind};
use beatmerge::errors::MergeError;
use beatmerge::merger::{merge_documents, seed_difficulty, seed_metadata, DifficultySettings, MergeSettings};
use crate::common;

fn settings() -> MergeSettings {
    MergeSettings {
        difficulty: DifficultySettings::default(),
        version_label: None,
        audio_filename: "merged_audio.mp3".to_string(),
    }
}

fn doc(title: &str, timing_points: &[&str], hit_objects: &[&str]) -> Document {
    Document::parse(&common::beatmap_text(title, &format!("{}.mp3", title), timing_points, hit_objects))
}

fn section(document: &Document, kind: SectionKind) -> Vec<String> {
    document.section(kind).to_vec()
}

/// Two maps, first one a minute long
#[test]
fn test_merge_withTwoMaps_shouldShiftSecondByFirstDuration() {
    let first = doc("A", &["0,500,4,2,0,30,1,0"], &["100,100,1000,1,0"]);
    let second = doc("B", &["0,400,4,2,0,30,1,0"], &["200,200,500,1,0"]);

    let outcome = merge_documents(&[first, second], &[60000, 30000], &settings()).unwrap();
    let merged = outcome.document;

    assert_eq!(
        section(&merged, SectionKind::HitObjects),
        vec!["100,100,1000,1,0".to_string(), "200,200,60500,1,0".to_string()]
    );
    assert_eq!(
        section(&merged, SectionKind::TimingPoints),
        vec!["0,500,4,2,0,30,1,0".to_string(), "60000,400,4,2,0,30,1,0".to_string()]
    );
    assert_eq!(outcome.report.total_duration_ms, 90000);
    assert_eq!(outcome.report.inputs, 2);
}

#[test]
fn test_merge_withSingleMap_shouldLeaveTimelineUnchanged() {
    let only = doc("A", &["0,500,4,2,0,30,1,0", "1234.0,-100,4,2,0,30,0,0"], &["1,1,10,1,0", "2,2,20,1,0"]);

    let merged = merge_documents(&[only.clone()], &[5000], &settings()).unwrap().document;

    assert_eq!(section(&merged, SectionKind::HitObjects), section(&only, SectionKind::HitObjects));
    assert_eq!(
        section(&merged, SectionKind::TimingPoints),
        vec!["0,500,4,2,0,30,1,0".to_string(), "1234,-100,4,2,0,30,0,0".to_string()]
    );
}

#[test]
fn test_merge_withVersionLabel_shouldReplaceVersionLine() {
    let mut settings = settings();
    settings.version_label = Some("Compilation".to_string());

    let merged = merge_documents(&[doc("A", &[], &[])], &[1000], &settings).unwrap().document;
    let metadata = section(&merged, SectionKind::Metadata);

    assert_eq!(metadata.iter().filter(|l| l.starts_with("Version")).count(), 1);
    assert_eq!(metadata.last().map(String::as_str), Some("Version:Compilation"));
    assert!(metadata.contains(&"Title:A".to_string()));
}

#[test]
fn test_merge_withoutVersionLabel_shouldKeepFirstVersion() {
    let merged = merge_documents(&[doc("A", &[], &[])], &[1000], &settings()).unwrap().document;
    assert_eq!(merged.value_of(SectionKind::Metadata, "Version"), Some("Normal"));
}

#[test]
fn test_merge_withDifficultyOverrides_shouldWriteOneDecimalForWholeNumbers() {
    let mut settings = settings();
    settings.difficulty = DifficultySettings {
        hp_drain_rate: 6.0,
        circle_size: 3.5,
        overall_difficulty: 7.0,
        approach_rate: 9.5,
    };

    let merged = merge_documents(&[doc("A", &[], &[])], &[1000], &settings).unwrap().document;
    let difficulty = section(&merged, SectionKind::Difficulty);

    for expected in ["HPDrainRate: 6.0", "CircleSize: 3.5", "OverallDifficulty: 7.0", "ApproachRate: 9.5"] {
        assert!(difficulty.contains(&expected.to_string()), "missing {}", expected);
    }
    assert_eq!(difficulty.iter().filter(|l| l.starts_with("HPDrainRate")).count(), 1);
    assert!(difficulty.contains(&"SliderMultiplier:1.4".to_string()));
}

#[test]
fn test_merge_shouldPointAudioFilenameAtMergedTrack() {
    let merged = merge_documents(&[doc("A", &[], &[]), doc("B", &[], &[])], &[1, 1], &settings())
        .unwrap()
        .document;

    let general = section(&merged, SectionKind::General);
    assert_eq!(general.iter().filter(|l| l.starts_with("AudioFilename")).count(), 1);
    assert_eq!(merged.value_of(SectionKind::General, "AudioFilename"), Some("merged_audio.mp3"));
    assert_eq!(merged.value_of(SectionKind::General, "Mode"), Some("0"));
}

#[test]
fn test_merge_shouldTakeEventsAndFormatFromFirstMap() {
    let mut second = Document::parse(&doc("B", &[], &[]).to_osu_string().replace("v14", "v9"));
    assert_eq!(second.format_number(), Some(9));
    second.set_section(SectionKind::Events, vec!["0,0,\"other.jpg\",0,0".to_string()]);

    let merged = merge_documents(&[doc("A", &[], &[]), second], &[1, 1], &settings()).unwrap().document;

    assert_eq!(merged.format_version(), Some("osu file format v14"));
    assert_eq!(
        section(&merged, SectionKind::Events),
        vec!["//Background and Video events".to_string(), "0,0,\"bg.jpg\",0,0".to_string()]
    );
}

#[test]
fn test_merge_withFirstMapMissingFormat_shouldUseDefault() {
    let first = Document::parse("[HitObjects]\n1,1,1,1,0\n");
    let merged = merge_documents(&[first], &[1], &settings()).unwrap().document;
    assert!(merged.to_osu_string().starts_with("osu file format v14\n"));
}

#[test]
fn test_merge_withSimultaneousObjects_shouldKeepInputOrder() {
    let first = doc("A", &[], &["1,1,1000,1,0", "2,2,1000,1,0"]);
    let second = doc("B", &[], &["3,3,0,1,0"]);

    let merged = merge_documents(&[first, second], &[1000, 1000], &settings()).unwrap().document;

    assert_eq!(
        section(&merged, SectionKind::HitObjects),
        vec!["1,1,1000,1,0".to_string(), "2,2,1000,1,0".to_string(), "3,3,1000,1,0".to_string()]
    );
}

#[test]
fn test_merge_withSimultaneousTimingPoints_shouldKeepInputOrder() {
    let first = doc("A", &["0,500,4,2,0,30,1,0", "1000,-50,4,2,0,30,0,0"], &[]);
    let second = doc("B", &["0,400,4,2,0,30,1,0", "0,-25,4,2,0,30,0,0"], &[]);

    let merged = merge_documents(&[first, second], &[1000, 1000], &settings()).unwrap().document;

    assert_eq!(
        section(&merged, SectionKind::TimingPoints),
        vec![
            "0,500,4,2,0,30,1,0".to_string(),
            "1000,-50,4,2,0,30,0,0".to_string(),
            "1000,400,4,2,0,30,1,0".to_string(),
            "1000,-25,4,2,0,30,0,0".to_string(),
        ]
    );
}

#[test]
fn test_merge_withObjectNearI64Max_shouldDropItInsteadOfOverflowing() {
    let first = doc("A", &[], &["1,1,500,1,0"]);
    let second = doc("B", &[], &["1,1,9223372036854775000,1,0", "2,2,0,1,0"]);

    let outcome = merge_documents(&[first, second], &[60000, 1], &settings()).unwrap();

    assert_eq!(outcome.report.dropped_hit_objects, 1);
    assert_eq!(
        section(&outcome.document, SectionKind::HitObjects),
        vec!["1,1,500,1,0".to_string(), "2,2,60000,1,0".to_string()]
    );
}

#[test]
fn test_merge_withDifferentFormatVersions_shouldCountMismatches() {
    let older = Document::parse(&doc("B", &[], &[]).to_osu_string().replace("v14", "v9"));
    let docs = vec![doc("A", &[], &[]), older, doc("C", &[], &[])];

    let outcome = merge_documents(&docs, &[1, 1, 1], &settings()).unwrap();

    assert_eq!(outcome.report.format_mismatches, 1);
    assert_eq!(outcome.document.format_number(), Some(14));
}

#[test]
fn test_merge_withMatchingFormatVersions_shouldReportNoMismatch() {
    let outcome = merge_documents(&[doc("A", &[], &[]), doc("B", &[], &[])], &[1, 1], &settings()).unwrap();
    assert_eq!(outcome.report.format_mismatches, 0);
}

#[test]
fn test_merge_withUnsortedInput_shouldSortAscending() {
    let first = doc("A", &[], &["1,1,900,1,0", "2,2,100,1,0"]);
    let merged = merge_documents(&[first], &[1000], &settings()).unwrap().document;

    let times: Vec<i64> = section(&merged, SectionKind::HitObjects)
        .iter()
        .map(|l| l.split(',').nth(2).unwrap().parse().unwrap())
        .collect();
    assert_eq!(times, vec![100, 900]);
}

#[test]
fn test_merge_shouldPreserveRecordCounts() {
    let docs = vec![
        doc("A", &["0,500,4,2,0,30,1,0"], &["1,1,1,1,0", "1,1,2,1,0"]),
        doc("B", &["0,500,4,2,0,30,1,0", "10,-100,4,2,0,30,0,0"], &["1,1,3,1,0"]),
        doc("C", &[], &["1,1,4,1,0", "1,1,5,1,0", "1,1,6,1,0"]),
    ];

    let outcome = merge_documents(&docs, &[100, 200, 300], &settings()).unwrap();

    assert_eq!(outcome.report.timing_points, 3);
    assert_eq!(outcome.report.hit_objects, 6);
    assert_eq!(section(&outcome.document, SectionKind::HitObjects).len(), 6);
    assert_eq!(outcome.report.dropped_lines(), 0);
}

#[test]
fn test_merge_withMalformedLines_shouldCountDroppedLines() {
    let first = doc("A", &["bpm,500"], &["1,1,oops,1,0", "1,1,5,1,0"]);

    let outcome = merge_documents(&[first], &[10], &settings()).unwrap();

    assert_eq!(outcome.report.dropped_timing_points, 1);
    assert_eq!(outcome.report.dropped_hit_objects, 1);
    assert_eq!(section(&outcome.document, SectionKind::HitObjects), vec!["1,1,5,1,0".to_string()]);
}

#[test]
fn test_merge_withLengthMismatch_shouldFail() {
    let err = merge_documents(&[doc("A", &[], &[])], &[1, 2], &settings()).unwrap_err();
    assert_eq!(err, MergeError::InputCountMismatch { documents: 1, audio: 2 });
}

#[test]
fn test_merge_withNoInputs_shouldFail() {
    let err = merge_documents(&[], &[], &settings()).unwrap_err();
    assert_eq!(err, MergeError::EmptyInput);
}

#[test]
fn test_merge_output_shouldReparseToSameSections() {
    let docs = vec![doc("A", &["0,500,4,2,0,30,1,0"], &["1,1,1,1,0"]), doc("B", &[], &["2,2,2,1,0"])];
    let merged = merge_documents(&docs, &[1000, 1000], &settings()).unwrap().document;

    let reparsed = Document::parse(&merged.to_osu_string());

    for kind in SectionKind::WRITE_ORDER {
        let mut lines = reparsed.section(kind).to_vec();
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        assert_eq!(lines, section(&merged, kind), "section {} differs", kind);
    }
}

#[test]
fn test_seed_metadata_withLabel_shouldAddSingleVersionLine() {
    let lines = vec!["Artist:A".to_string(), "Title:T".to_string()];

    let metadata = seed_metadata(&lines, Some("Compilation"));

    assert_eq!(
        metadata,
        vec!["Artist:A".to_string(), "Title:T".to_string(), "Version:Compilation".to_string()]
    );
}

#[test]
fn test_seed_difficulty_shouldReplaceEveryOverriddenKey() {
    let lines: Vec<String> = ["HPDrainRate:2", "CircleSize : 7", "OverallDifficulty:1", "ApproachRate:3", "SliderTickRate:1"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let difficulty = DifficultySettings {
        hp_drain_rate: 6.0,
        circle_size: 3.5,
        overall_difficulty: 7.0,
        approach_rate: 9.5,
    };

    let section = seed_difficulty(&lines, &difficulty);

    assert_eq!(
        section,
        vec![
            "SliderTickRate:1".to_string(),
            "HPDrainRate: 6.0".to_string(),
            "CircleSize: 3.5".to_string(),
            "OverallDifficulty: 7.0".to_string(),
            "ApproachRate: 9.5".to_string(),
        ]
    );
}
