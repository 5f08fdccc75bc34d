use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::validation::ValidationError;

/// One whole unit expressed in basis points.
pub const BIPS_DENOMINATOR: u16 = 10_000;

/// Unsigned fixed-precision amount in raw base units.
///
/// Serialized as a minimal decimal string (`"0"`, `"1500"`, never `"007"`)
/// so the canonical encoding does not depend on JSON number precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(u128);

impl Amount {
    /// Wraps a raw base-unit value.
    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// Raw base-unit value.
    pub const fn raw(self) -> u128 {
        self.0
    }

    /// Parses a minimal decimal string.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        if !is_minimal_unsigned(value) {
            return Err(ValidationError::PatternMismatch {
                field: "amount",
                value: value.to_string(),
            });
        }
        value
            .parse::<u128>()
            .map(Self)
            .map_err(|_| ValidationError::OutOfBounds {
                field: "amount",
                value: value.to_string(),
            })
    }
}

impl From<u128> for Amount {
    fn from(raw: u128) -> Self {
        Self(raw)
    }
}

impl TryFrom<String> for Amount {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Amount> for String {
    fn from(value: Amount) -> Self {
        value.0.to_string()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fee or royalty rate in basis points (1/100 of a percent).
///
/// Any `u16` is representable; range limits are a provisioner precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bips(u16);

impl Bips {
    /// Wraps a raw basis-point value.
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Raw basis-point value.
    pub const fn get(self) -> u16 {
        self.0
    }

    /// Whether the rate is at most 100%.
    pub const fn is_whole_or_less(self) -> bool {
        self.0 <= BIPS_DENOMINATOR
    }
}

impl From<u16> for Bips {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl fmt::Display for Bips {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}bps", self.0)
    }
}

fn is_minimal_unsigned(value: &str) -> bool {
    if value == "0" {
        return true;
    }
    let re = Regex::new(r"^[1-9][0-9]*$").expect("invalid regex");
    re.is_match(value)
}
