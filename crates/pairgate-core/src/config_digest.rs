//! Versioned canonical digest of a [`ConfigurationValue`].
//!
//! Attestations bind to this digest, so the encoding is frozen per version:
//!
//! - V1: camelCase JSON of every field, numbers stringified, RFC 8785 canonical
//!   bytes under profile `pairgate-canonical-v1`, then
//!   `sha256(b"pairgate:config:v1\0" || bytes)`.
//!
//! Adding a field or changing the encoding requires a new version.

use pairgate_canonical::{content_digest, Canonicalizer, Digest, HashingError, ProfileId};
use serde::{Deserialize, Serialize};

use crate::config::ConfigurationValue;

/// Domain separator for V1 configuration digests.
pub const CONFIG_DOMAIN_V1: &[u8] = b"pairgate:config:v1\0";

/// Configuration encoding versions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigEncoding {
    /// Canonical JSON, SHA-256, domain `pairgate:config:v1`.
    #[default]
    V1,
}

/// Canonical bytes for `config` under `encoding`, before hashing.
pub fn canonical_config_bytes(
    config: &ConfigurationValue,
    encoding: ConfigEncoding,
) -> Result<Vec<u8>, HashingError> {
    match encoding {
        ConfigEncoding::V1 => {
            let mut value = serde_json::to_value(config)
                .map_err(|e| HashingError::Serialization(e.to_string()))?;
            pairgate_canonical::hashing::stringify_numbers(&mut value);
            Ok(Canonicalizer::new(ProfileId::v1()).canonicalize(&value)?)
        }
    }
}

/// Digest of `config` under `encoding`.
pub fn config_digest(
    config: &ConfigurationValue,
    encoding: ConfigEncoding,
) -> Result<Digest, HashingError> {
    match encoding {
        ConfigEncoding::V1 => content_digest(
            config,
            CONFIG_DOMAIN_V1,
            &[],
            &Canonicalizer::new(ProfileId::v1()),
        ),
    }
}
