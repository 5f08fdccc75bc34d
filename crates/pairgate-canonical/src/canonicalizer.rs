use canonical_json::to_string;
use serde_json::Value;

use crate::identifiers::ProfileId;
use std::fmt;

/// Error returned when canonicalization fails.
#[derive(thiserror::Error, Debug)]
pub enum CanonicalizationError {
    /// Raw JSON number found where the profile requires a decimal string.
    #[error("raw number at {0}; quantities must be encoded as strings")]
    RawNumber(String),
    /// Non-finite number (NaN/Infinity) detected.
    #[error("non-finite number detected at {0}")]
    NonFiniteNumber(String),
    /// RFC 8785 encoding failed.
    #[error("canonical encoding failed: {0}")]
    Encoding(String),
}

#[derive(Debug, Clone)]
struct Path {
    segments: Vec<String>,
}

impl Path {
    fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    fn push(&self, segment: String) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            write!(f, "root")
        } else {
            write!(f, "{}", self.segments.join("."))
        }
    }
}

/// Canonicalizer that emits deterministic RFC 8785 bytes.
///
/// The pairgate profile is stricter than plain JCS: every number must already
/// be a decimal string. Call [`stringify_numbers`](crate::hashing::stringify_numbers) first when
/// encoding a typed record; this keeps `u128` amounts and `u64` handles exact.
#[derive(Debug, Clone)]
pub struct Canonicalizer {
    profile: ProfileId,
}

impl Canonicalizer {
    /// Creates a new canonicalizer for the provided profile.
    pub fn new(profile: ProfileId) -> Self {
        Self { profile }
    }

    /// The profile this canonicalizer encodes under.
    pub fn profile(&self) -> &ProfileId {
        &self.profile
    }

    /// Produces canonical bytes for `value`.
    pub fn canonicalize(&self, value: &Value) -> Result<Vec<u8>, CanonicalizationError> {
        check_numbers(value, Path::root())?;
        let canonical =
            to_string(value).map_err(|err| CanonicalizationError::Encoding(err.to_string()))?;
        Ok(canonical.into_bytes())
    }
}

fn check_numbers(value: &Value, path: Path) -> Result<(), CanonicalizationError> {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                check_numbers(child, path.push(key.clone()))?;
            }
            Ok(())
        }
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                check_numbers(item, path.push(format!("[{}]", idx)))?;
            }
            Ok(())
        }
        Value::Number(num) => match num.as_f64() {
            Some(f) if !f.is_finite() => Err(CanonicalizationError::NonFiniteNumber(
                path.to_string(),
            )),
            _ => Err(CanonicalizationError::RawNumber(path.to_string())),
        },
        Value::String(_) | Value::Bool(_) | Value::Null => Ok(()),
    }
}
