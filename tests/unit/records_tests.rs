/*!
 * Tests for timing point and hit-object records
 */

use beatmerge::beatmap::records::{HitObject, RecordError, TimingPoint};

#[test]
fn test_timing_point_withIntegerTime_shouldRoundTripExactly() {
    let line = "0,500,4,2,0,30,1,0";
    let tp: TimingPoint = line.parse().unwrap();
    assert_eq!(tp.start_time(), 0);
    assert_eq!(tp.shifted(0).to_string(), line);
}

#[test]
fn test_timing_point_withFloatTime_shouldWriteInteger() {
    let tp: TimingPoint = "1234.0,-100,4,2,0,30,0,0".parse().unwrap();
    assert_eq!(tp.shifted(1000).to_string(), "2234,-100,4,2,0,30,0,0");
}

#[test]
fn test_timing_point_withNegativeTime_shouldShiftAlgebraically() {
    let tp: TimingPoint = "-30,500,4,2,0,30,1,0".parse().unwrap();
    assert_eq!(tp.shifted(60000).start_time(), 59970);
}

#[test]
fn test_timing_point_withNonNumericTime_shouldReportField() {
    let err = "//comment,500".parse::<TimingPoint>().unwrap_err();
    assert_eq!(
        err,
        RecordError::InvalidNumber { field: "time", value: "//comment".to_string() }
    );
}

#[test]
fn test_timing_point_withInfiniteTime_shouldFail() {
    assert!("inf,500".parse::<TimingPoint>().is_err());
}

#[test]
fn test_hit_object_withCircle_shouldExposeNamedFields() {
    let object: HitObject = "100,200,1000,1,0,0:0:0:0:".parse().unwrap();
    assert_eq!(object.x, "100");
    assert_eq!(object.y, "200");
    assert_eq!(object.time, 1000);
    assert_eq!(object.type_bits().unwrap(), 1);
    assert_eq!(object.hit_sound.as_deref(), Some("0"));
    assert_eq!(object.payload, vec!["0:0:0:0:".to_string()]);
    assert_eq!(object.end_time, None);
}

#[test]
fn test_hit_object_withHeldBit_shouldShiftEndTime() {
    let object: HitObject = "256,192,1000,12,0,3000,0:0:0:0:".parse().unwrap();
    assert_eq!(object.end_time.as_ref().map(|end| end.time), Some(3000));
    assert_eq!(object.shifted(500).unwrap().to_string(), "256,192,1500,12,0,3500,0:0:0:0:");
}

#[test]
fn test_hit_object_withHeldBitButNoPayload_shouldOnlyShiftStart() {
    let object: HitObject = "256,192,1000,12,0".parse().unwrap();
    assert_eq!(object.end_time, None);
    assert_eq!(object.shifted(500).unwrap().to_string(), "256,192,1500,12,0");
}

#[test]
fn test_hit_object_withMinimalFields_shouldRoundTrip() {
    let object: HitObject = "1,2,3".parse().unwrap();
    assert_eq!(object.object_type, None);
    assert_eq!(object.to_string(), "1,2,3");
}

#[test]
fn test_hit_object_withNonNumericStart_shouldFail() {
    let err = "100,100,abc,1,0".parse::<HitObject>().unwrap_err();
    assert!(matches!(err, RecordError::InvalidNumber { field: "time", .. }));
}

#[test]
fn test_hit_object_withNonNumericHeldEnd_shouldFail() {
    let err = "256,192,1000,8,0,end".parse::<HitObject>().unwrap_err();
    assert!(matches!(err, RecordError::InvalidNumber { field: "endTime", .. }));
}

#[test]
fn test_hit_object_withHeldEndNearMax_shouldReportEndOverflow() {
    let object: HitObject = "256,192,1000,8,0,9223372036854775000".parse().unwrap();
    let err = object.shifted(1_000_000).unwrap_err();
    assert_eq!(
        err,
        RecordError::OffsetOverflow { field: "endTime", value: 9223372036854775000, offset_ms: 1_000_000 }
    );
}

#[test]
fn test_hit_object_withNegativeStartNearMin_shouldReportOverflow() {
    let object: HitObject = "1,1,-9223372036854775000,1,0".parse().unwrap();
    assert!(object.shifted(-1_000_000).is_err());
    assert_eq!(object.shifted(0).unwrap().time, -9223372036854775000);
}

#[test]
fn test_hit_object_withHoldNoteTextEnd_shouldKeepFieldVerbatim() {
    let object: HitObject = "64,192,1000,128,0,x:0:0:0:0:".parse().unwrap();
    assert_eq!(object.end_time, None);
    assert_eq!(object.payload, vec!["x:0:0:0:0:".to_string()]);
    assert_eq!(object.shifted(60000).unwrap().to_string(), "64,192,61000,128,0,x:0:0:0:0:");
}

#[test]
fn test_record_error_display_shouldDescribeProblem() {
    let err = RecordError::MissingField { expected: 3, found: 1 };
    assert_eq!(err.to_string(), "expected at least 3 fields, found 1");
}
