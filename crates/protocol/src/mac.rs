//! The scale's 6-byte hardware address, used as its identity everywhere.

use std::fmt;
use std::str::FromStr;

/// A 6-byte MAC address in network byte order.
///
/// Canonical display form is uppercase colon-separated hex
/// (`AA:BB:CC:DD:EE:FF`); the scale's serial number is the same bytes as
/// lowercase hex with no separators (`aabbccddeeff`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// Serial-number form: lowercase hex, no separators.
    pub fn serial(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// A MAC of all zeros or all 0xFF is a placeholder, not a device.
    pub fn is_plausible(&self) -> bool {
        self.0 != [0x00; 6] && self.0 != [0xFF; 6]
    }

    /// Parse the 12-hex-character serial-number form.
    pub fn from_serial(serial: &str) -> Option<Self> {
        if serial.len() != 12 || !serial.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let mut bytes = [0u8; 6];
        for (i, chunk) in serial.as_bytes().chunks(2).enumerate() {
            let hi = (chunk[0] as char).to_digit(16)?;
            let lo = (chunk[1] as char).to_digit(16)?;
            bytes[i] = ((hi << 4) | lo) as u8;
        }
        Some(Self(bytes))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for MacAddress {
    type Err = String;

    /// Accepts the colon-separated form, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 6 {
            return Err(format!("invalid MAC address: {}", s));
        }
        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            bytes[i] =
                u8::from_str_radix(part, 16).map_err(|_| format!("invalid MAC address: {}", s))?;
        }
        Ok(Self(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAC: MacAddress = MacAddress([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);

    #[test]
    fn display_is_uppercase_colon_separated() {
        assert_eq!(MAC.to_string(), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn serial_is_lowercase_unseparated() {
        assert_eq!(MAC.serial(), "aabbccddeeff");
    }

    #[test]
    fn parse_round_trip() {
        assert_eq!("AA:BB:CC:DD:EE:FF".parse::<MacAddress>().unwrap(), MAC);
        assert_eq!("aa:bb:cc:dd:ee:ff".parse::<MacAddress>().unwrap(), MAC);
        assert_eq!(MacAddress::from_serial("aabbccddeeff").unwrap(), MAC);
        assert_eq!(MacAddress::from_serial("AABBCCDDEEFF").unwrap(), MAC);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!("AA:BB:CC:DD:EE".parse::<MacAddress>().is_err());
        assert!("AA:BB:CC:DD:EE:GG".parse::<MacAddress>().is_err());
        assert!(MacAddress::from_serial("aabbccddee").is_none());
        assert!(MacAddress::from_serial("aabbccddeefg").is_none());
    }

    #[test]
    fn placeholder_addresses_are_implausible() {
        assert!(!MacAddress([0x00; 6]).is_plausible());
        assert!(!MacAddress([0xFF; 6]).is_plausible());
        assert!(MAC.is_plausible());
    }
}
