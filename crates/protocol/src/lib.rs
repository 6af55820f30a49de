//! Wire protocol spoken by the scale over plain HTTP.
//!
//! The scale posts a packed big-endian upload frame and expects a bit-exact
//! binary response; anything else makes it retry forever. This crate owns
//! both directions: [`upload`] decodes (and, for tests and tooling, encodes)
//! the measurement frame, [`response`] builds the acknowledgment carrying
//! the user-profile slot table, and [`crc`] implements the CRC-16/XMODEM
//! variant both frames are checksummed with.
//!
//! Everything here is pure: byte slices in, values out. No I/O, no clock.

pub mod crc;
pub mod mac;
pub mod response;
pub mod upload;

pub use crc::{append_crc, crc16_xmodem, verify_trailing_crc};
pub use mac::MacAddress;
pub use response::{
    decode_response, encode_response, ResponseFrame, UserSlot, WeightUnit, RESPONSE_LEN,
    RESPONSE_TRAILER, USER_BLOCK_LEN, USER_SLOTS,
};
pub use upload::{
    decode_upload, encode_upload, peek_mac, DecodeError, MeasurementRecord, UploadFrame,
    HEADER_LEN, MAX_MEASUREMENTS, MEASUREMENT_LEN, METADATA_LEN, MIN_UPLOAD_LEN, PROTOCOL_VERSION,
};
