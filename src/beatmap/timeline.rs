use log::{debug, warn};

use crate::beatmap::records::{HitObject, RecordError, TimingPoint};

// @module: Shifts one beatmap's timeline onto the merged timeline

/// Offset-applied records from one input
#[derive(Debug, Clone, Default)]
pub struct OffsetTimeline {
    pub timing_points: Vec<TimingPoint>,
    pub hit_objects: Vec<HitObject>,
    /// Timing lines dropped because their time field was not numeric
    pub dropped_timing_points: usize,
    /// Hit-object lines dropped because a time field was not numeric or overflowed
    pub dropped_hit_objects: usize,
}

impl OffsetTimeline {
    /// Total number of lines that failed to parse
    pub fn dropped(&self) -> usize {
        self.dropped_timing_points + self.dropped_hit_objects
    }
}

/// Blank and `//` comment lines never take part in the timeline
pub fn is_passthrough_line(line: &str) -> bool {
    line.trim().is_empty() || line.starts_with("//")
}

/// Apply `offset_ms` to every timing point and hit-object line.
///
/// Blank and comment lines are skipped. Lines that fail to parse are logged
/// and counted, never fatal.
pub fn apply_offset<S: AsRef<str>>(
    timing_lines: &[S],
    hit_object_lines: &[S],
    offset_ms: i64,
) -> OffsetTimeline {
    let (timing_points, dropped_timing_points) =
        shift_lines(timing_lines, "timing point", |line| {
            line.parse::<TimingPoint>().map(|tp| tp.shifted(offset_ms))
        });
    let (hit_objects, dropped_hit_objects) =
        shift_lines(hit_object_lines, "hit object", |line| {
            line.parse::<HitObject>().and_then(|ho| ho.shifted(offset_ms))
        });

    let timeline = OffsetTimeline {
        timing_points,
        hit_objects,
        dropped_timing_points,
        dropped_hit_objects,
    };
    debug!(
        "Offset {} ms: {} timing points, {} hit objects, {} dropped",
        offset_ms,
        timeline.timing_points.len(),
        timeline.hit_objects.len(),
        timeline.dropped()
    );

    timeline
}

fn shift_lines<S, T, F>(lines: &[S], kind: &str, shift: F) -> (Vec<T>, usize)
where
    S: AsRef<str>,
    F: Fn(&str) -> Result<T, RecordError>,
{
    let mut shifted = Vec::with_capacity(lines.len());
    let mut dropped = 0;

    for line in lines {
        let line: &str = line.as_ref();
        if is_passthrough_line(line) {
            continue;
        }
        match shift(line) {
            Ok(record) => shifted.push(record),
            Err(e) => {
                warn!("Skipping malformed {} '{}': {}", kind, line, e);
                dropped += 1;
            }
        }
    }

    (shifted, dropped)
}
