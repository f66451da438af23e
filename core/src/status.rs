//! Status words (SW1 SW2) returned to the reader.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::codec;

/// A 2-octet status word trailing every response APDU.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct StatusWord(pub u16);

impl StatusWord {
    pub const SUCCESS: Self = Self(0x9000);
    pub const FAILED: Self = Self(0x6F00);
    pub const INS_NOT_SUPPORTED: Self = Self(0x6D00);

    /// Some deployments answer `6D00` here as well.
    /// Override it through [`StatusWords`] when a reader expects that.
    pub const CLA_NOT_SUPPORTED: Self = Self(0x6E00);

    pub fn sw1(&self) -> u8 {
        self.to_bytes()[0]
    }

    pub fn sw2(&self) -> u8 {
        self.to_bytes()[1]
    }

    /// Converts the status word into octets, SW1 first.
    pub fn to_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    /// Determines whether the status word indicates success or not.
    pub fn is_ok(&self) -> bool {
        matches!((self.sw1(), self.sw2()), (0x90, 0x00) | (0x91, 0x00))
    }
}

impl From<(u8, u8)> for StatusWord {
    fn from((sw1, sw2): (u8, u8)) -> Self {
        Self(u16::from_be_bytes([sw1, sw2]))
    }
}

impl From<StatusWord> for Vec<u8> {
    fn from(sw: StatusWord) -> Self {
        sw.to_bytes().to_vec()
    }
}

impl Display for StatusWord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Codec(#[from] codec::Error),

    #[error("A status word must be 2 octets, got {0}")]
    InvalidLength(usize),
}

impl FromStr for StatusWord {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match codec::hex_to_bytes(s)?.as_slice() {
            &[sw1, sw2] => Ok((sw1, sw2).into()),
            bytes => Err(Error::InvalidLength(bytes.len())),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for StatusWord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for StatusWord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The status words a dispatcher answers with, one per outcome.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct StatusWords {
    pub success: StatusWord,
    pub failed: StatusWord,
    pub cla_not_supported: StatusWord,
    pub ins_not_supported: StatusWord,
}

impl Default for StatusWords {
    fn default() -> Self {
        Self {
            success: StatusWord::SUCCESS,
            failed: StatusWord::FAILED,
            cla_not_supported: StatusWord::CLA_NOT_SUPPORTED,
            ins_not_supported: StatusWord::INS_NOT_SUPPORTED,
        }
    }
}
