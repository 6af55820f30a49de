//! Sanity checks on decoded upload frames.
//!
//! Runs between the codec and persistence. Individual bad measurements are
//! skipped without sinking the rest of the frame; everything questionable
//! is reported as a flag so the raw-upload row records what happened.

use chrono::{DateTime, Duration, Utc};
use protocol::{MeasurementRecord, UploadFrame};

/// Weights below 1 kg or above 400 kg are sensor noise, not people.
pub const MIN_WEIGHT_GRAMS: u32 = 1_000;
pub const MAX_WEIGHT_GRAMS: u32 = 400_000;

/// 2015-01-01T00:00:00Z; the scale predates nothing earlier.
pub const MIN_PLAUSIBLE_TIMESTAMP: u32 = 1_420_070_400;

/// Everything worth noting about a frame, with a stable snake_case code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationFlag {
    CrcMismatch,
    BadMac,
    TruncatedMeasurements,
    WeightOutOfRange,
    TimestampSuspect,
}

impl ValidationFlag {
    pub fn code(self) -> &'static str {
        match self {
            ValidationFlag::CrcMismatch => "crc_mismatch",
            ValidationFlag::BadMac => "bad_mac",
            ValidationFlag::TruncatedMeasurements => "truncated_measurements",
            ValidationFlag::WeightOutOfRange => "weight_out_of_range",
            ValidationFlag::TimestampSuspect => "timestamp_suspect",
        }
    }
}

/// Outcome of validating one decoded frame.
#[derive(Debug, Clone)]
pub struct FrameAssessment {
    /// False when the MAC is a placeholder (all-zero / all-0xFF); nothing
    /// from such a frame can be attributed to a device.
    pub mac_ok: bool,
    /// Battery percent clamped to [0, 100].
    pub battery_percent: u8,
    pub battery_clamped: bool,
    /// Measurements that passed the weight bounds, in wire order.
    pub accepted: Vec<MeasurementRecord>,
    pub rejected: usize,
    pub flags: Vec<ValidationFlag>,
}

impl FrameAssessment {
    /// Flags joined for the raw-upload error column, `None` when clean.
    pub fn flags_csv(&self) -> Option<String> {
        if self.flags.is_empty() {
            None
        } else {
            Some(
                self.flags
                    .iter()
                    .map(|f| f.code())
                    .collect::<Vec<_>>()
                    .join(","),
            )
        }
    }
}

/// Validate a decoded frame against bounds and the server clock.
pub fn assess_frame(frame: &UploadFrame, now: DateTime<Utc>) -> FrameAssessment {
    let mut flags = Vec::new();
    let push = |flags: &mut Vec<ValidationFlag>, flag: ValidationFlag| {
        if !flags.contains(&flag) {
            flags.push(flag);
        }
    };

    if !frame.crc_ok {
        push(&mut flags, ValidationFlag::CrcMismatch);
    }

    let mac_ok = frame.mac.is_plausible();
    if !mac_ok {
        push(&mut flags, ValidationFlag::BadMac);
    }

    if frame.payload_size_mismatch {
        push(&mut flags, ValidationFlag::TruncatedMeasurements);
    }

    let battery_clamped = frame.battery_percent > 100;
    let battery_percent = frame.battery_percent.min(100);

    let max_plausible = (now + Duration::hours(24)).timestamp();
    let mut accepted = Vec::with_capacity(frame.measurements.len());
    let mut rejected = 0;
    for m in &frame.measurements {
        if m.weight_grams < MIN_WEIGHT_GRAMS || m.weight_grams > MAX_WEIGHT_GRAMS {
            push(&mut flags, ValidationFlag::WeightOutOfRange);
            rejected += 1;
            continue;
        }
        if m.timestamp < MIN_PLAUSIBLE_TIMESTAMP || i64::from(m.timestamp) > max_plausible {
            push(&mut flags, ValidationFlag::TimestampSuspect);
        }
        accepted.push(*m);
    }

    FrameAssessment {
        mac_ok,
        battery_percent,
        battery_clamped,
        accepted,
        rejected,
        flags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use protocol::{MacAddress, PROTOCOL_VERSION};

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_705_316_000, 0).unwrap()
    }

    fn record(id: u32, weight_grams: u32) -> MeasurementRecord {
        MeasurementRecord {
            measurement_id: id,
            impedance: 520,
            weight_grams,
            timestamp: 1_705_315_840,
            user_slot: 1,
            fat_raw_1: 370,
            fat_raw_2: 370,
            covariance: 12,
        }
    }

    fn frame(measurements: Vec<MeasurementRecord>) -> UploadFrame {
        UploadFrame {
            protocol_version: PROTOCOL_VERSION,
            firmware_version: 39,
            battery_percent: 85,
            mac: MacAddress::new([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]),
            auth_code: [0x5A; 16],
            scale_timestamp: 1_705_315_900,
            declared_count: measurements.len() as u16,
            measurements,
            crc_ok: true,
            payload_size_mismatch: false,
        }
    }

    #[test]
    fn clean_frame_has_no_flags() {
        let a = assess_frame(&frame(vec![record(1, 75_300)]), now());
        assert!(a.mac_ok);
        assert!(a.flags.is_empty());
        assert_eq!(a.flags_csv(), None);
        assert_eq!(a.accepted.len(), 1);
        assert_eq!(a.rejected, 0);
    }

    #[test]
    fn weight_bounds_are_inclusive() {
        let a = assess_frame(
            &frame(vec![record(1, 1_000), record(2, 400_000)]),
            now(),
        );
        assert_eq!(a.accepted.len(), 2);
        assert_eq!(a.rejected, 0);
    }

    #[test]
    fn out_of_range_weight_skips_only_that_measurement() {
        let a = assess_frame(
            &frame(vec![record(1, 999), record(2, 80_000), record(3, 400_001)]),
            now(),
        );
        assert_eq!(a.accepted.len(), 1);
        assert_eq!(a.accepted[0].measurement_id, 2);
        assert_eq!(a.rejected, 2);
        assert_eq!(a.flags, vec![ValidationFlag::WeightOutOfRange]);
        assert_eq!(a.flags_csv().as_deref(), Some("weight_out_of_range"));
    }

    #[test]
    fn suspect_timestamps_are_kept_but_flagged() {
        let mut old = record(1, 75_000);
        old.timestamp = MIN_PLAUSIBLE_TIMESTAMP - 1;
        let mut future = record(2, 75_000);
        future.timestamp = (now().timestamp() + 25 * 3600) as u32;

        let a = assess_frame(&frame(vec![old, future]), now());
        assert_eq!(a.accepted.len(), 2);
        assert_eq!(a.flags, vec![ValidationFlag::TimestampSuspect]);
    }

    #[test]
    fn battery_is_clamped() {
        let mut f = frame(vec![]);
        f.battery_percent = 130;
        let a = assess_frame(&f, now());
        assert_eq!(a.battery_percent, 100);
        assert!(a.battery_clamped);
    }

    #[test]
    fn placeholder_mac_is_flagged() {
        let mut f = frame(vec![record(1, 75_000)]);
        f.mac = MacAddress::new([0x00; 6]);
        let a = assess_frame(&f, now());
        assert!(!a.mac_ok);
        assert!(a.flags.contains(&ValidationFlag::BadMac));
    }

    #[test]
    fn codec_flags_carry_over() {
        let mut f = frame(vec![record(1, 75_000)]);
        f.crc_ok = false;
        f.payload_size_mismatch = true;
        let a = assess_frame(&f, now());
        assert_eq!(
            a.flags,
            vec![
                ValidationFlag::CrcMismatch,
                ValidationFlag::TruncatedMeasurements
            ]
        );
        assert_eq!(
            a.flags_csv().as_deref(),
            Some("crc_mismatch,truncated_measurements")
        );
    }
}
