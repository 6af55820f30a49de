//! Upload frame: the packed big-endian request the scale posts after each
//! weigh-in. Layout (protocol version 3):
//!
//! ```text
//! [Header: 30 bytes]
//!   [0]      protocol version (0x03)
//!   [1..8]   reserved preamble; byte 2 mirrors the firmware version
//!   [8]      battery percent
//!   [9..15]  MAC address, network byte order
//!   [14..30] 16-byte authorization code (first byte shared with the last
//!            MAC byte; the code straddles the header boundary on some
//!            firmwares, so only the start offset 14 is authoritative)
//! [Metadata: 16 bytes]
//!   [30]     firmware version
//!   [31..35] u32 scale timestamp, Unix seconds
//!   [35..37] u16 measurement count
//!   [37..46] reserved
//! [Measurements: 32 bytes each]
//!   [0..4]   u32 measurement id     [4..6]   u16 impedance (ohms)
//!   [6..10]  u32 weight (grams)     [10..14] u32 timestamp
//!   [14]     u8 user slot           [15..17] u16 fat raw 1 (tenths of %)
//!   [17..19] u16 fat raw 2          [19..21] u16 covariance
//!   [21..32] reserved, may be nonzero
//! [CRC: 2 bytes] CRC-16/XMODEM over everything above, big-endian
//! ```

use thiserror::Error;

use crate::crc::{append_crc, verify_trailing_crc};
use crate::mac::MacAddress;

pub const PROTOCOL_VERSION: u8 = 3;
pub const HEADER_LEN: usize = 30;
pub const METADATA_LEN: usize = 16;
pub const MEASUREMENT_LEN: usize = 32;
pub const CRC_LEN: usize = 2;
/// Header + metadata + CRC: the smallest frame the scale can send.
pub const MIN_UPLOAD_LEN: usize = HEADER_LEN + METADATA_LEN + CRC_LEN;
/// A frame declaring more than this many measurements is garbage, not data.
pub const MAX_MEASUREMENTS: u16 = 64;

const AUTH_CODE_OFFSET: usize = 14;
const AUTH_CODE_LEN: usize = 16;

/// Fatal upload decode failures. CRC mismatch and payload-size mismatch are
/// deliberately *not* here: firmware variance makes both survivable, so they
/// surface as flags on the decoded frame instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("frame too short: {len} bytes")]
    ShortFrame { len: usize },

    #[error("unsupported protocol version {0}")]
    BadProtocolVersion(u8),

    #[error("implausible measurement count {0}")]
    BadMeasurementCount(u16),

    #[error("response trailer missing or malformed")]
    BadTrailer,

    #[error("unknown unit byte {0}")]
    BadUnit(u8),

    #[error("response checksum mismatch")]
    CrcMismatch,
}

impl DecodeError {
    /// Stable snake_case code, persisted on raw-upload rows.
    pub fn code(&self) -> &'static str {
        match self {
            DecodeError::ShortFrame { .. } => "short_frame",
            DecodeError::BadProtocolVersion(_) => "bad_protocol_version",
            DecodeError::BadMeasurementCount(_) => "bad_measurement_count",
            DecodeError::BadTrailer => "bad_trailer",
            DecodeError::BadUnit(_) => "bad_unit",
            DecodeError::CrcMismatch => "crc_mismatch",
        }
    }
}

/// One weigh-in as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasurementRecord {
    pub measurement_id: u32,
    pub impedance: u16,
    pub weight_grams: u32,
    pub timestamp: u32,
    pub user_slot: u8,
    pub fat_raw_1: u16,
    pub fat_raw_2: u16,
    pub covariance: u16,
}

impl MeasurementRecord {
    /// Average of the two raw readings, in percent. `None` only when the
    /// scale took no body-composition estimate at all: a raw reading is
    /// missing and the impedance is zero too.
    pub fn body_fat_percent(&self) -> Option<f32> {
        if (self.fat_raw_1 == 0 || self.fat_raw_2 == 0) && self.impedance == 0 {
            return None;
        }
        Some((self.fat_raw_1 as f32 + self.fat_raw_2 as f32) / 2.0 / 10.0)
    }

    /// Slot 0 is the guest slot: history, but no profile.
    pub fn is_guest(&self) -> bool {
        self.user_slot == 0
    }
}

/// A decoded upload frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFrame {
    pub protocol_version: u8,
    pub firmware_version: u8,
    pub battery_percent: u8,
    pub mac: MacAddress,
    pub auth_code: [u8; AUTH_CODE_LEN],
    pub scale_timestamp: u32,
    pub declared_count: u16,
    pub measurements: Vec<MeasurementRecord>,
    /// The trailing CRC matched the payload. Mismatches are processed anyway.
    pub crc_ok: bool,
    /// The measurement region was shorter or longer than `declared_count`
    /// records. Only the records that fully fit are in `measurements`.
    pub payload_size_mismatch: bool,
}

/// Best-effort MAC extraction before a full decode, for tagging the raw
/// upload row even when the frame turns out to be unparseable.
pub fn peek_mac(data: &[u8]) -> Option<MacAddress> {
    if data.len() < 15 {
        return None;
    }
    let mut bytes = [0u8; 6];
    bytes.copy_from_slice(&data[9..15]);
    Some(MacAddress::new(bytes))
}

/// Decode an upload frame.
///
/// CRC mismatch and a truncated/overlong measurement region do not fail the
/// decode; they are reported through `crc_ok` / `payload_size_mismatch`.
pub fn decode_upload(data: &[u8]) -> Result<UploadFrame, DecodeError> {
    if data.len() < MIN_UPLOAD_LEN {
        return Err(DecodeError::ShortFrame { len: data.len() });
    }

    let protocol_version = data[0];
    if protocol_version != PROTOCOL_VERSION {
        return Err(DecodeError::BadProtocolVersion(protocol_version));
    }

    let crc_ok = verify_trailing_crc(data);

    let battery_percent = data[8];
    let mut mac_bytes = [0u8; 6];
    mac_bytes.copy_from_slice(&data[9..15]);
    let mac = MacAddress::new(mac_bytes);

    let mut auth_code = [0u8; AUTH_CODE_LEN];
    auth_code.copy_from_slice(&data[AUTH_CODE_OFFSET..AUTH_CODE_OFFSET + AUTH_CODE_LEN]);

    let firmware_version = data[HEADER_LEN];
    let scale_timestamp = u32::from_be_bytes([data[31], data[32], data[33], data[34]]);
    let declared_count = u16::from_be_bytes([data[35], data[36]]);

    if declared_count > MAX_MEASUREMENTS {
        return Err(DecodeError::BadMeasurementCount(declared_count));
    }

    let body = &data[HEADER_LEN + METADATA_LEN..data.len() - CRC_LEN];
    let expected_body_len = declared_count as usize * MEASUREMENT_LEN;
    let payload_size_mismatch = body.len() != expected_body_len;

    let parseable = (body.len() / MEASUREMENT_LEN).min(declared_count as usize);
    let mut measurements = Vec::with_capacity(parseable);
    for i in 0..parseable {
        let rec = &body[i * MEASUREMENT_LEN..(i + 1) * MEASUREMENT_LEN];
        measurements.push(MeasurementRecord {
            measurement_id: u32::from_be_bytes([rec[0], rec[1], rec[2], rec[3]]),
            impedance: u16::from_be_bytes([rec[4], rec[5]]),
            weight_grams: u32::from_be_bytes([rec[6], rec[7], rec[8], rec[9]]),
            timestamp: u32::from_be_bytes([rec[10], rec[11], rec[12], rec[13]]),
            user_slot: rec[14],
            fat_raw_1: u16::from_be_bytes([rec[15], rec[16]]),
            fat_raw_2: u16::from_be_bytes([rec[17], rec[18]]),
            covariance: u16::from_be_bytes([rec[19], rec[20]]),
        });
    }

    Ok(UploadFrame {
        protocol_version,
        firmware_version,
        battery_percent,
        mac,
        auth_code,
        scale_timestamp,
        declared_count,
        measurements,
        crc_ok,
        payload_size_mismatch,
    })
}

/// Encode an upload frame, CRC appended. Reserved regions are zero-filled.
///
/// Byte 14 is shared between the MAC and the authorization code; the MAC
/// wins and `auth_code[0]` is not written separately, matching what decode
/// reads back. Used by the round-trip tests and for driving the ingestion
/// pipeline without captured traffic.
pub fn encode_upload(frame: &UploadFrame) -> Vec<u8> {
    let mut buf =
        Vec::with_capacity(HEADER_LEN + METADATA_LEN + frame.measurements.len() * MEASUREMENT_LEN + CRC_LEN);

    buf.push(frame.protocol_version);
    buf.extend_from_slice(&[0u8; 7]);
    buf[2] = frame.firmware_version;
    buf.push(frame.battery_percent);
    buf.extend_from_slice(frame.mac.as_bytes());
    // Auth code bytes 1.. land after the MAC; byte 0 is the shared byte 14.
    buf.extend_from_slice(&frame.auth_code[1..]);
    debug_assert_eq!(buf.len(), HEADER_LEN);

    buf.push(frame.firmware_version);
    buf.extend_from_slice(&frame.scale_timestamp.to_be_bytes());
    buf.extend_from_slice(&frame.declared_count.to_be_bytes());
    buf.extend_from_slice(&[0u8; 9]);
    debug_assert_eq!(buf.len(), HEADER_LEN + METADATA_LEN);

    for m in &frame.measurements {
        buf.extend_from_slice(&m.measurement_id.to_be_bytes());
        buf.extend_from_slice(&m.impedance.to_be_bytes());
        buf.extend_from_slice(&m.weight_grams.to_be_bytes());
        buf.extend_from_slice(&m.timestamp.to_be_bytes());
        buf.push(m.user_slot);
        buf.extend_from_slice(&m.fat_raw_1.to_be_bytes());
        buf.extend_from_slice(&m.fat_raw_2.to_be_bytes());
        buf.extend_from_slice(&m.covariance.to_be_bytes());
        buf.extend_from_slice(&[0u8; 11]);
    }

    append_crc(&mut buf);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_measurement(id: u32) -> MeasurementRecord {
        MeasurementRecord {
            measurement_id: id,
            impedance: 520,
            weight_grams: 75_300,
            timestamp: 1_705_315_840,
            user_slot: 1,
            fat_raw_1: 370,
            fat_raw_2: 370,
            covariance: 12,
        }
    }

    fn sample_frame(measurements: Vec<MeasurementRecord>) -> UploadFrame {
        let mac = MacAddress::new([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
        let mut auth_code = [0x5A; 16];
        auth_code[0] = mac.as_bytes()[5]; // shared byte
        UploadFrame {
            protocol_version: PROTOCOL_VERSION,
            firmware_version: 39,
            battery_percent: 85,
            mac,
            auth_code,
            scale_timestamp: 1_705_315_900,
            declared_count: measurements.len() as u16,
            measurements,
            crc_ok: true,
            payload_size_mismatch: false,
        }
    }

    #[test]
    fn single_measurement_frame_is_80_bytes() {
        let encoded = encode_upload(&sample_frame(vec![sample_measurement(1)]));
        assert_eq!(encoded.len(), 80);
    }

    #[test]
    fn round_trip_empty_frame() {
        let frame = sample_frame(vec![]);
        let decoded = decode_upload(&encode_upload(&frame)).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn round_trip_multiple_measurements() {
        let frame = sample_frame(vec![
            sample_measurement(1),
            sample_measurement(2),
            sample_measurement(3),
        ]);
        let decoded = decode_upload(&encode_upload(&frame)).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn header_fields_land_where_the_scale_puts_them() {
        let encoded = encode_upload(&sample_frame(vec![sample_measurement(7)]));
        assert_eq!(encoded[0], 0x03);
        assert_eq!(encoded[8], 85);
        assert_eq!(&encoded[9..15], &[0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
        assert_eq!(encoded[30], 39);
        assert_eq!(u16::from_be_bytes([encoded[35], encoded[36]]), 1);
    }

    #[test]
    fn short_frame_rejected() {
        let err = decode_upload(&[0x03; 47]).unwrap_err();
        assert_eq!(err, DecodeError::ShortFrame { len: 47 });
        assert_eq!(err.code(), "short_frame");
    }

    #[test]
    fn wrong_protocol_version_rejected() {
        let mut encoded = encode_upload(&sample_frame(vec![]));
        encoded[0] = 0x02;
        let err = decode_upload(&encoded).unwrap_err();
        assert_eq!(err, DecodeError::BadProtocolVersion(2));
    }

    #[test]
    fn absurd_measurement_count_rejected() {
        let mut encoded = encode_upload(&sample_frame(vec![]));
        encoded[35..37].copy_from_slice(&65u16.to_be_bytes());
        let err = decode_upload(&encoded).unwrap_err();
        assert_eq!(err, DecodeError::BadMeasurementCount(65));
    }

    #[test]
    fn crc_mismatch_is_flagged_not_fatal() {
        let mut encoded = encode_upload(&sample_frame(vec![sample_measurement(1)]));
        let last = encoded.len() - 1;
        encoded[last] ^= 0xFF;
        let decoded = decode_upload(&encoded).unwrap();
        assert!(!decoded.crc_ok);
        assert_eq!(decoded.measurements.len(), 1);
    }

    #[test]
    fn truncated_measurement_region_keeps_complete_records() {
        let frame = sample_frame(vec![sample_measurement(1), sample_measurement(2)]);
        let mut encoded = encode_upload(&frame);
        // Drop the CRC and the second record's tail, then re-checksum.
        encoded.truncate(encoded.len() - CRC_LEN - 16);
        append_crc(&mut encoded);
        let decoded = decode_upload(&encoded).unwrap();
        assert!(decoded.payload_size_mismatch);
        assert_eq!(decoded.declared_count, 2);
        assert_eq!(decoded.measurements.len(), 1);
        assert_eq!(decoded.measurements[0].measurement_id, 1);
    }

    #[test]
    fn nonzero_reserved_tail_bytes_are_tolerated() {
        let frame = sample_frame(vec![sample_measurement(1)]);
        let mut encoded = encode_upload(&frame);
        // Scribble over the record's reserved tail, then re-checksum.
        let tail = HEADER_LEN + METADATA_LEN + 21;
        for b in &mut encoded[tail..tail + 11] {
            *b = 0xEE;
        }
        let len = encoded.len();
        encoded.truncate(len - CRC_LEN);
        append_crc(&mut encoded);
        let decoded = decode_upload(&encoded).unwrap();
        assert_eq!(decoded.measurements[0], sample_measurement(1));
    }

    #[test]
    fn auth_code_starts_at_the_shared_mac_byte() {
        let frame = sample_frame(vec![]);
        let decoded = decode_upload(&encode_upload(&frame)).unwrap();
        assert_eq!(decoded.auth_code[0], decoded.mac.as_bytes()[5]);
        assert_eq!(&decoded.auth_code[1..], &frame.auth_code[1..]);
    }

    #[test]
    fn peek_mac_matches_full_decode() {
        let frame = sample_frame(vec![sample_measurement(1)]);
        let encoded = encode_upload(&frame);
        assert_eq!(peek_mac(&encoded), Some(frame.mac));
        assert_eq!(peek_mac(&encoded[..14]), None);
    }

    #[test]
    fn body_fat_derivation() {
        let m = sample_measurement(1);
        assert_eq!(m.body_fat_percent(), Some(37.0));

        // Zero impedance alone does not null the estimate; both raws are
        // present, so the average still stands.
        let no_impedance = MeasurementRecord { impedance: 0, ..m };
        assert_eq!(no_impedance.body_fat_percent(), Some(37.0));

        // A missing raw with impedance present still averages.
        let one_raw = MeasurementRecord { fat_raw_1: 0, ..m };
        assert_eq!(one_raw.body_fat_percent(), Some(18.5));

        // Only a missing raw plus zero impedance means no estimate.
        let no_estimate = MeasurementRecord {
            impedance: 0,
            fat_raw_2: 0,
            ..m
        };
        assert_eq!(no_estimate.body_fat_percent(), None);

        let nothing = MeasurementRecord {
            impedance: 0,
            fat_raw_1: 0,
            fat_raw_2: 0,
            ..m
        };
        assert_eq!(nothing.body_fat_percent(), None);
    }

    #[test]
    fn guest_slot_is_zero() {
        let mut m = sample_measurement(1);
        assert!(!m.is_guest());
        m.user_slot = 0;
        assert!(m.is_guest());
    }
}
