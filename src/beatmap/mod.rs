/*!
 * Beatmap text format handling.
 *
 * - `document`: section parser and canonical writer
 * - `records`: typed timing-point and hit-object records
 * - `timeline`: applies a millisecond offset to one beatmap's timeline
 * - `info`: display name and audio resolution for a beatmap file
 */

pub mod document;
pub mod info;
pub mod records;
pub mod timeline;

pub use document::{Document, SectionKind, DEFAULT_FORMAT_VERSION};
pub use info::MapInfo;
pub use records::{EndTime, HitObject, RecordError, TimingPoint};
pub use timeline::{apply_offset, OffsetTimeline};
