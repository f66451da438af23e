//! Typed access to the fields of a received command APDU.

/// Class of an interindustry command without secure messaging or chaining.
pub const CLA_DEFAULT: u8 = 0x00;

/// `SELECT` instruction.
pub const INS_SELECT: u8 = 0xA4;

/// Octets a command must carry before any field is read: CLA, INS, P1, P2, Lc and one data octet.
pub const MIN_LENGTH: usize = 6;

/// Offset of the command data, right after Lc.
const DATA_OFFSET: usize = 5;

/// A command APDU borrowed from the reader's buffer.
/// Only lives for a single dispatch.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CommandApdu<'a> {
    bytes: &'a [u8],
}

impl<'a> CommandApdu<'a> {
    /// Wraps the octets, or returns `None` if they are too short to read the header from.
    pub fn new(bytes: &'a [u8]) -> Option<Self> {
        match bytes.len() >= MIN_LENGTH {
            true => Some(Self { bytes }),
            _ => None,
        }
    }

    pub fn cla(&self) -> u8 {
        self.bytes[0]
    }

    pub fn ins(&self) -> u8 {
        self.bytes[1]
    }

    pub fn p1(&self) -> u8 {
        self.bytes[2]
    }

    pub fn p2(&self) -> u8 {
        self.bytes[3]
    }

    pub fn lc(&self) -> u8 {
        self.bytes[4]
    }

    /// Reads `len` octets of command data, or `None` if the command ends before them.
    /// Lc is not consulted.
    pub fn data(&self, len: usize) -> Option<&'a [u8]> {
        self.bytes.get(DATA_OFFSET..DATA_OFFSET + len)
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }
}
