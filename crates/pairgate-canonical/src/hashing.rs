//! Domain-separated content hashing.
//!
//! Digests are computed as `sha256(domain_separator || canonical_bytes(value))`.
//! Fields named in `exclude` are removed from the top-level object before
//! encoding, so a record can carry its own identifier without hashing it.

use crate::{CanonicalizationError, Canonicalizer, Digest};
use serde::Serialize;
use serde_json::Value;

/// Error during content digest computation.
#[derive(thiserror::Error, Debug)]
pub enum HashingError {
    /// Serialization failed.
    #[error("serialization failed: {0}")]
    Serialization(String),
    /// Canonicalization failed.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

/// Computes the domain-separated digest of a serializable value.
///
/// # Example
///
/// ```rust
/// use pairgate_canonical::{content_digest, Canonicalizer, ProfileId};
/// use serde_json::json;
///
/// let canonicalizer = Canonicalizer::new(ProfileId::parse("pairgate-canonical-v1")?);
/// let record = json!({"event_id": "ignored", "n": 1});
/// let digest = content_digest(&record, b"example:v1\0", &["event_id"], &canonicalizer)?;
/// assert_eq!(digest.b64.len(), 43);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn content_digest<T: Serialize>(
    value: &T,
    domain: &[u8],
    exclude: &[&str],
    canonicalizer: &Canonicalizer,
) -> Result<Digest, HashingError> {
    let mut value: Value =
        serde_json::to_value(value).map_err(|e| HashingError::Serialization(e.to_string()))?;

    if let Value::Object(map) = &mut value {
        for field in exclude {
            map.remove(*field);
        }
    }

    stringify_numbers(&mut value);
    let bytes = canonicalizer.canonicalize(&value)?;
    Ok(Digest::sha256_domain(domain, &bytes))
}

/// Recursively converts all JSON numbers into strings.
pub fn stringify_numbers(value: &mut Value) {
    match value {
        Value::Number(n) => {
            let s = n.to_string();
            *value = Value::String(s);
        }
        Value::Array(arr) => {
            for v in arr {
                stringify_numbers(v);
            }
        }
        Value::Object(map) => {
            for v in map.values_mut() {
                stringify_numbers(v);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProfileId;
    use serde_json::json;

    fn canonicalizer() -> Canonicalizer {
        Canonicalizer::new(ProfileId::parse("pairgate-canonical-v1").unwrap())
    }

    #[test]
    fn excluded_fields_do_not_affect_digest() {
        let c = canonicalizer();
        let a = content_digest(&json!({"id": "x", "v": 1}), b"t\0", &["id"], &c).unwrap();
        let b = content_digest(&json!({"id": "y", "v": 1}), b"t\0", &["id"], &c).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn number_and_string_encode_identically() {
        let c = canonicalizer();
        let a = content_digest(&json!({"v": 1}), b"t\0", &[], &c).unwrap();
        let b = content_digest(&json!({"v": "1"}), b"t\0", &[], &c).unwrap();
        assert_eq!(a, b);
    }
}
