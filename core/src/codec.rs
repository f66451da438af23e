//! Conversion between octets and their uppercase hexadecimal representation.
//!
//! The dispatcher itself works on raw octets. This module is for the text boundaries around it:
//! logging, configuration and command input typed by a human.

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    #[error("Invalid hex input: {0}")]
    InvalidHexInput(#[from] hex::FromHexError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Renders the octets as an uppercase hex string, two digits per octet, high nibble first.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    hex::encode_upper(bytes)
}

/// Parses a hex string into octets.
/// Both cases are accepted. Odd lengths and non-hex digits are rejected.
pub fn hex_to_bytes(hex: &str) -> Result<Vec<u8>> {
    Ok(hex::decode(hex)?)
}

/// Compares two octet sequences without exiting early on the first differing octet.
///
/// Sequences of different lengths are rejected up front, so the length itself is not hidden.
pub fn constant_byte_equals(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }

    diff == 0
}
