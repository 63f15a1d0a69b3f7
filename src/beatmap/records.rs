/*!
 * Typed records for the two timeline-bearing line kinds.
 *
 * Timing points and hit-objects are comma-separated lines. Only the time
 * fields are interpreted; every other field is carried as the raw text it
 * was authored with so an unshifted record serializes byte-identically.
 */

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Type bit marking an object whose field 5 is a plain end time
pub const HELD_OBJECT_BIT: u32 = 8;

/// Type bit marking a mania hold note whose field 5 is `endTime:hitSample`.
/// Its end time is shifted as well when it parses; otherwise the field is
/// carried verbatim.
pub const HOLD_NOTE_BIT: u32 = 128;

/// A line that could not be read as a timed record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// The record has fewer fields than its kind requires
    #[error("expected at least {expected} fields, found {found}")]
    MissingField {
        /// Minimum field count
        expected: usize,
        /// Actual field count
        found: usize,
    },

    /// A field that must be numeric is not
    #[error("field '{field}' is not a valid number: '{value}'")]
    InvalidNumber {
        /// Name of the field
        field: &'static str,
        /// Raw text that failed to parse
        value: String,
    },

    /// Applying the offset would leave the 64-bit millisecond range
    #[error("field '{field}' overflows when shifted: {value} + {offset_ms} ms")]
    OffsetOverflow {
        /// Name of the field
        field: &'static str,
        /// Time before the shift
        value: i64,
        /// Offset that was applied
        offset_ms: i64,
    },
}

fn parse_int(field: &'static str, value: &str) -> Result<i64, RecordError> {
    value.trim().parse::<i64>().map_err(|_| RecordError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

/// A tempo or inherited timing line: `<time>,<params...>`
#[derive(Debug, Clone, PartialEq)]
pub struct TimingPoint {
    /// Start time in milliseconds, possibly fractional as authored
    pub time: f64,
    /// Everything after the first comma, untouched
    pub params: Option<String>,
}

impl TimingPoint {
    /// Integer start time used for ordering and output
    pub fn start_time(&self) -> i64 {
        self.time.trunc() as i64
    }

    /// Move the record by `offset_ms`, truncating the sum to whole milliseconds
    pub fn shifted(&self, offset_ms: i64) -> Self {
        Self {
            time: (self.time + offset_ms as f64).trunc(),
            params: self.params.clone(),
        }
    }
}

impl FromStr for TimingPoint {
    type Err = RecordError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (time_field, params) = match line.split_once(',') {
            Some((time, rest)) => (time, Some(rest.to_string())),
            None => (line, None),
        };

        let time = time_field
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|t| t.is_finite())
            .ok_or_else(|| RecordError::InvalidNumber {
                field: "time",
                value: time_field.to_string(),
            })?;

        Ok(Self { time, params })
    }
}

impl fmt::Display for TimingPoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.start_time())?;
        if let Some(params) = &self.params {
            write!(f, ",{}", params)?;
        }
        Ok(())
    }
}

/// End time carried in field 5 of a held object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndTime {
    /// End time in milliseconds
    pub time: i64,
    /// Text following the end time inside the same field (`:hitSample` for hold notes)
    pub suffix: String,
}

/// A playable event: `x,y,time,type,hitSound[,payload...]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitObject {
    pub x: String,
    pub y: String,
    /// Start time in milliseconds
    pub time: i64,
    /// Raw type bitmask field
    pub object_type: Option<String>,
    pub hit_sound: Option<String>,
    /// Parsed field 5 when the type marks a held object
    pub end_time: Option<EndTime>,
    /// Remaining payload fields (field 5 onward, minus `end_time` if present)
    pub payload: Vec<String>,
}

impl HitObject {
    /// Parsed type bitmask, zero when the field is absent
    pub fn type_bits(&self) -> Result<u32, RecordError> {
        match &self.object_type {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| RecordError::InvalidNumber {
                field: "type",
                value: raw.clone(),
            }),
            None => Ok(0),
        }
    }

    /// Move start and end time by `offset_ms`
    pub fn shifted(&self, offset_ms: i64) -> Result<Self, RecordError> {
        let mut shifted = self.clone();
        shifted.time = shift_time("time", self.time, offset_ms)?;
        if let Some(end) = shifted.end_time.as_mut() {
            end.time = shift_time("endTime", end.time, offset_ms)?;
        }
        Ok(shifted)
    }
}

fn shift_time(field: &'static str, value: i64, offset_ms: i64) -> Result<i64, RecordError> {
    value
        .checked_add(offset_ms)
        .ok_or(RecordError::OffsetOverflow {
            field,
            value,
            offset_ms,
        })
}

impl FromStr for HitObject {
    type Err = RecordError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < 3 {
            return Err(RecordError::MissingField {
                expected: 3,
                found: fields.len(),
            });
        }

        let mut object = HitObject {
            x: fields[0].to_string(),
            y: fields[1].to_string(),
            time: parse_int("time", fields[2])?,
            object_type: fields.get(3).map(|s| s.to_string()),
            hit_sound: fields.get(4).map(|s| s.to_string()),
            end_time: None,
            payload: fields.iter().skip(5).map(|s| s.to_string()).collect(),
        };

        if object.payload.is_empty() {
            return Ok(object);
        }

        let bits = object.type_bits()?;
        if bits & HELD_OBJECT_BIT != 0 {
            let raw = object.payload.remove(0);
            object.end_time = Some(EndTime {
                time: parse_int("endTime", &raw)?,
                suffix: String::new(),
            });
        } else if bits & HOLD_NOTE_BIT != 0 {
            // An end that is not a leading integer stays opaque payload
            let raw = &object.payload[0];
            let (end, suffix) = match raw.find(':') {
                Some(idx) => raw.split_at(idx),
                None => (raw.as_str(), ""),
            };
            if let Ok(time) = end.trim().parse::<i64>() {
                let suffix = suffix.to_string();
                object.payload.remove(0);
                object.end_time = Some(EndTime { time, suffix });
            }
        }

        Ok(object)
    }
}

impl fmt::Display for HitObject {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.time)?;
        if let Some(object_type) = &self.object_type {
            write!(f, ",{}", object_type)?;
        }
        if let Some(hit_sound) = &self.hit_sound {
            write!(f, ",{}", hit_sound)?;
        }
        if let Some(end) = &self.end_time {
            write!(f, ",{}{}", end.time, end.suffix)?;
        }
        for field in &self.payload {
            write!(f, ",{}", field)?;
        }
        Ok(())
    }
}
