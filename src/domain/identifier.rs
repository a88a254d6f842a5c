//! The issued identifier type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A 128-bit unsigned identifier.
///
/// Identifiers travel on the wire as canonical base-10 strings: ASCII digits
/// only, no sign, and no leading zeros except for the value zero itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier(u128);

impl Identifier {
    /// Smallest identifier value.
    pub const MIN: Self = Self(u128::MIN);

    /// Largest identifier value (2^128 - 1).
    pub const MAX: Self = Self(u128::MAX);

    /// Width of the identifier space in bytes.
    pub const BYTES: usize = 16;

    /// Create an identifier from its integer value.
    #[must_use]
    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    /// Create an identifier from 16 big-endian bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; Self::BYTES]) -> Self {
        Self(u128::from_be_bytes(bytes))
    }

    /// Get the integer value.
    #[must_use]
    pub const fn as_u128(self) -> u128 {
        self.0
    }
}

impl From<u128> for Identifier {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

impl From<Identifier> for u128 {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when a string is not a canonical identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseIdentifierError {
    /// The input was empty.
    #[error("identifier is empty")]
    Empty,

    /// The input contained something other than ASCII digits.
    #[error("identifier contains a non-digit character: {0:?}")]
    InvalidDigit(char),

    /// The input had a leading zero.
    #[error("identifier has a leading zero")]
    LeadingZero,

    /// The value does not fit in 128 bits.
    #[error("identifier exceeds 128 bits")]
    Overflow,
}

impl FromStr for Identifier {
    type Err = ParseIdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseIdentifierError::Empty);
        }
        if let Some(c) = s.chars().find(|c| !c.is_ascii_digit()) {
            return Err(ParseIdentifierError::InvalidDigit(c));
        }
        if s.len() > 1 && s.starts_with('0') {
            return Err(ParseIdentifierError::LeadingZero);
        }

        // Only digits remain, so overflow is the sole failure left.
        s.parse::<u128>()
            .map(Self)
            .map_err(|_| ParseIdentifierError::Overflow)
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
