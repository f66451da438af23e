//! Configuration of an emulated application.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::codec;
use crate::status::{StatusWord, StatusWords};

/// The AID answered by default.
pub const DEFAULT_AID: [u8; 7] = [0xA0, 0x00, 0x00, 0x02, 0x47, 0x10, 0x01];

const AID_MIN_LENGTH: usize = 5;
const AID_MAX_LENGTH: usize = 16;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    #[error("Invalid AID: {0}")]
    InvalidHex(#[from] codec::Error),

    #[error("An AID must be 5 to 16 octets, got {0}")]
    InvalidAidLength(usize),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Application identifier selected by the reader with `SELECT`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Aid(Vec<u8>);

impl Aid {
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        match bytes.len() {
            AID_MIN_LENGTH..=AID_MAX_LENGTH => Ok(Self(bytes)),
            len => Err(Error::InvalidAidLength(len)),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl Default for Aid {
    fn default() -> Self {
        Self(DEFAULT_AID.to_vec())
    }
}

impl FromStr for Aid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(codec::hex_to_bytes(s)?)
    }
}

impl Display for Aid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&codec::bytes_to_hex(&self.0))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Aid {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Aid {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Everything a dispatcher needs to answer for one application.
/// Fixed once the dispatcher is constructed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Config {
    pub aid: Aid,
    #[cfg_attr(feature = "serde", serde(default))]
    pub status_words: StatusWords,
}

impl Config {
    pub fn new(aid: Aid) -> Self {
        Self {
            aid,
            status_words: Default::default(),
        }
    }

    pub fn with_aid(self, aid: Aid) -> Self {
        Self { aid, ..self }
    }

    pub fn with_status_words(self, status_words: StatusWords) -> Self {
        Self {
            status_words,
            ..self
        }
    }

    pub fn with_cla_not_supported(self, sw: StatusWord) -> Self {
        let status_words = StatusWords {
            cla_not_supported: sw,
            ..self.status_words
        };

        self.with_status_words(status_words)
    }
}
