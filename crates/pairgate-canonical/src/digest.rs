use base64::Engine;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest as Sha2Digest, Sha256};
use std::fmt;

use crate::validation::ValidationError;

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigestAlg {
    /// SHA-256, the only algorithm pairgate emits.
    #[serde(rename = "sha-256")]
    Sha256,
}

/// Algorithm + bytes digest, encoded as base64url without padding.
///
/// Deserialization goes through [`Digest::new`], so a malformed digest in an
/// attestation or journal record fails to parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "DigestRepr")]
pub struct Digest {
    /// Digest algorithm (currently always `sha-256`).
    pub alg: DigestAlg,
    /// Base64URL (no padding) digest bytes.
    #[serde(rename = "b64")]
    pub b64: String,
}

#[derive(Deserialize)]
struct DigestRepr {
    alg: DigestAlg,
    b64: String,
}

impl TryFrom<DigestRepr> for Digest {
    type Error = ValidationError;

    fn try_from(repr: DigestRepr) -> Result<Self, Self::Error> {
        Digest::new(repr.alg, repr.b64)
    }
}

impl Digest {
    /// Constructs a validated digest.
    pub fn new(alg: DigestAlg, b64: impl Into<String>) -> Result<Self, ValidationError> {
        let b64 = b64.into();
        let re = Regex::new(r"^[A-Za-z0-9_-]{43,44}$").expect("invalid regex");
        if !re.is_match(&b64) {
            return Err(ValidationError::PatternMismatch {
                field: "digest",
                value: b64,
            });
        }
        Ok(Digest { alg, b64 })
    }

    /// Hashes `domain || bytes` with SHA-256.
    ///
    /// The domain separator keeps digests of different record kinds from
    /// colliding even when their canonical bytes are identical.
    pub fn sha256_domain(domain: &[u8], bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        hasher.update(bytes);
        Self::from_sha256_bytes(&hasher.finalize())
    }

    /// Wraps raw SHA-256 output.
    pub fn from_sha256_bytes(bytes: &[u8]) -> Self {
        Digest {
            alg: DigestAlg::Sha256,
            b64: base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes),
        }
    }

    /// Decodes the digest bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ValidationError> {
        base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(&self.b64)
            .map_err(|_| ValidationError::PatternMismatch {
                field: "digest",
                value: self.b64.clone(),
            })
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.alg {
            DigestAlg::Sha256 => write!(f, "sha-256:{}", self.b64),
        }
    }
}
