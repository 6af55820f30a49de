//! Response frame: the acknowledgment the scale validates after an upload.
//!
//! A single contiguous buffer, CRC-appended, then the `0x66 0x00` trailer:
//!
//! ```text
//! [0..4]    u32 server timestamp, Unix seconds
//! [4]       u8 unit preference (0 = kg, 1 = lbs, 2 = stones)
//! [5]       u8 status (0 = OK; nonzero values are undocumented, never sent)
//! [6..110]  8 user profile blocks, 13 bytes each, slot order 0..7:
//!             u8 slot, u16 height mm, u8 age, u8 gender,
//!             u32 min weight grams, u32 max weight grams
//!           (empty slots are zero-filled)
//! [110..112] u16 CRC-16/XMODEM over bytes 0..110, big-endian
//! [112..114] trailer 0x66 0x00
//! ```
//!
//! The scale checks this byte-for-byte; a malformed response puts it into an
//! endless retry loop.

use std::str::FromStr;

use crate::crc::{append_crc, verify_trailing_crc};
use crate::upload::DecodeError;

pub const USER_SLOTS: usize = 8;
pub const USER_BLOCK_LEN: usize = 13;
pub const RESPONSE_TRAILER: [u8; 2] = [0x66, 0x00];
/// Fixed total length: 6-byte head + 8 blocks + CRC + trailer.
pub const RESPONSE_LEN: usize = 6 + USER_SLOTS * USER_BLOCK_LEN + 2 + 2;

/// Weight display unit pushed down to the scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeightUnit {
    #[default]
    Kilograms,
    Pounds,
    Stones,
}

impl WeightUnit {
    pub fn as_byte(self) -> u8 {
        match self {
            WeightUnit::Kilograms => 0,
            WeightUnit::Pounds => 1,
            WeightUnit::Stones => 2,
        }
    }

    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(WeightUnit::Kilograms),
            1 => Some(WeightUnit::Pounds),
            2 => Some(WeightUnit::Stones),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WeightUnit::Kilograms => "kg",
            WeightUnit::Pounds => "lbs",
            WeightUnit::Stones => "stones",
        }
    }
}

impl FromStr for WeightUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "kg" => Ok(WeightUnit::Kilograms),
            "lbs" => Ok(WeightUnit::Pounds),
            "stones" => Ok(WeightUnit::Stones),
            _ => Err(format!("invalid weight unit: {}", s)),
        }
    }
}

/// One 13-byte profile block. The all-zero value is an empty slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UserSlot {
    pub slot: u8,
    pub height_mm: u16,
    pub age: u8,
    pub gender: u8,
    pub min_weight_grams: u32,
    pub max_weight_grams: u32,
}

impl UserSlot {
    pub fn is_empty(&self) -> bool {
        *self == UserSlot::default()
    }
}

/// A response frame ready for encoding, or recovered by [`decode_response`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    pub timestamp: u32,
    pub unit: WeightUnit,
    pub status: u8,
    pub slots: [UserSlot; USER_SLOTS],
}

impl ResponseFrame {
    /// The acknowledgment sent when nothing useful can be said: current
    /// time, configured unit, status OK, no profiles. Also what the scale
    /// gets back after an unparseable upload.
    pub fn empty(timestamp: u32, unit: WeightUnit) -> Self {
        Self {
            timestamp,
            unit,
            status: 0,
            slots: [UserSlot::default(); USER_SLOTS],
        }
    }
}

/// Encode a response frame: payload, CRC, trailer. Always [`RESPONSE_LEN`]
/// bytes.
pub fn encode_response(frame: &ResponseFrame) -> Vec<u8> {
    let mut buf = Vec::with_capacity(RESPONSE_LEN);
    buf.extend_from_slice(&frame.timestamp.to_be_bytes());
    buf.push(frame.unit.as_byte());
    buf.push(frame.status);

    for slot in &frame.slots {
        buf.push(slot.slot);
        buf.extend_from_slice(&slot.height_mm.to_be_bytes());
        buf.push(slot.age);
        buf.push(slot.gender);
        buf.extend_from_slice(&slot.min_weight_grams.to_be_bytes());
        buf.extend_from_slice(&slot.max_weight_grams.to_be_bytes());
    }

    append_crc(&mut buf);
    buf.extend_from_slice(&RESPONSE_TRAILER);
    debug_assert_eq!(buf.len(), RESPONSE_LEN);
    buf
}

/// Decode a response frame, verifying length, trailer, and CRC. Unlike the
/// upload path this is strict: responses are our own output, so any
/// deviation is a bug, not firmware variance.
pub fn decode_response(data: &[u8]) -> Result<ResponseFrame, DecodeError> {
    if data.len() != RESPONSE_LEN {
        return Err(DecodeError::ShortFrame { len: data.len() });
    }
    if data[RESPONSE_LEN - 2..] != RESPONSE_TRAILER {
        return Err(DecodeError::BadTrailer);
    }
    if !verify_trailing_crc(&data[..RESPONSE_LEN - 2]) {
        return Err(DecodeError::CrcMismatch);
    }

    let timestamp = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
    let unit = WeightUnit::from_byte(data[4]).ok_or(DecodeError::BadUnit(data[4]))?;
    let status = data[5];

    let mut slots = [UserSlot::default(); USER_SLOTS];
    for (i, slot) in slots.iter_mut().enumerate() {
        let b = &data[6 + i * USER_BLOCK_LEN..6 + (i + 1) * USER_BLOCK_LEN];
        *slot = UserSlot {
            slot: b[0],
            height_mm: u16::from_be_bytes([b[1], b[2]]),
            age: b[3],
            gender: b[4],
            min_weight_grams: u32::from_be_bytes([b[5], b[6], b[7], b[8]]),
            max_weight_grams: u32::from_be_bytes([b[9], b[10], b[11], b[12]]),
        };
    }

    Ok(ResponseFrame {
        timestamp,
        unit,
        status,
        slots,
    })
}
