//! Attestations approving a specific configuration, and their verification.
//!
//! An attestation is `(issuer, attested_digest, signature)`. The verifier only
//! answers "is this a valid statement by a trusted issuer, and what digest does
//! it attest to"; comparing that digest with the configuration being deployed
//! is the authorization gate's job.

use std::collections::BTreeMap;
use std::fmt;

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use pairgate_canonical::Digest;
use serde::{Deserialize, Serialize};
use sha2::{Digest as Sha2Digest, Sha256};
use thiserror::Error;

/// Domain separator for attestation signatures: `b"pairgate:attestation:v1\0"`.
pub const ATTESTATION_DOMAIN_V1: &[u8] = b"pairgate:attestation:v1\0";

/// A signed claim that an issuer approved the configuration with `attested_digest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    /// Key identifier of the issuing verifier.
    pub issuer: String,
    /// Digest of the approved configuration.
    pub attested_digest: Digest,
    /// Hex-encoded Ed25519 signature over [`attestation_message`].
    pub signature: String,
}

/// Outcome of checking an attestation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierReport {
    /// Whether the attestation is authentic and from a trusted issuer.
    pub valid: bool,
    /// The digest the attestation speaks for.
    pub attested_digest: Digest,
}

/// Verify-and-extract interface for attestations.
pub trait AttestationVerifier {
    /// Checks `attestation` and reports the digest it attests to.
    fn verify(&self, attestation: &Attestation) -> VerifierReport;
}

/// Errors building a verifier.
#[derive(Debug, Error)]
pub enum VerifierError {
    /// A trusted key could not be decoded.
    #[error("invalid verifying key for {key_id}: {reason}")]
    InvalidKey {
        /// Key identifier from the whitelist.
        key_id: String,
        /// Decoding failure.
        reason: String,
    },
}

/// Message signed by an issuer: `sha256(domain || digest.b64)`.
pub fn attestation_message(digest: &Digest) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(ATTESTATION_DOMAIN_V1);
    hasher.update(digest.b64.as_bytes());
    hasher.finalize().into()
}

/// Issues an attestation over `digest` with `signing_key`.
pub fn sign_attestation(
    signing_key: &SigningKey,
    issuer: impl Into<String>,
    digest: Digest,
) -> Attestation {
    let signature = signing_key.sign(&attestation_message(&digest));
    Attestation {
        issuer: issuer.into(),
        attested_digest: digest,
        signature: hex::encode(signature.to_bytes()),
    }
}

/// Ed25519 verifier over a whitelist of trusted issuer keys.
#[derive(Clone, Default)]
pub struct Ed25519AttestationVerifier {
    trusted: BTreeMap<String, VerifyingKey>,
}

impl Ed25519AttestationVerifier {
    /// Creates a verifier with no trusted issuers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `key` to the whitelist under `key_id`.
    pub fn trust(mut self, key_id: impl Into<String>, key: VerifyingKey) -> Self {
        self.trusted.insert(key_id.into(), key);
        self
    }

    /// Builds a verifier from hex-encoded 32-byte public keys.
    pub fn from_hex_keys<'a, I>(keys: I) -> Result<Self, VerifierError>
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut verifier = Self::new();
        for (key_id, key_hex) in keys {
            let invalid = |reason: String| VerifierError::InvalidKey {
                key_id: key_id.clone(),
                reason,
            };
            let bytes = hex::decode(key_hex).map_err(|e| invalid(e.to_string()))?;
            let key_arr: [u8; 32] = bytes
                .as_slice()
                .try_into()
                .map_err(|_| invalid(format!("expected 32 bytes, got {}", bytes.len())))?;
            let key = VerifyingKey::from_bytes(&key_arr).map_err(|e| invalid(e.to_string()))?;
            verifier.trusted.insert(key_id.clone(), key);
        }
        Ok(verifier)
    }

    /// Whitelisted key identifiers.
    pub fn trusted_issuers(&self) -> impl Iterator<Item = &str> {
        self.trusted.keys().map(String::as_str)
    }

    fn check(&self, attestation: &Attestation) -> Result<(), &'static str> {
        let key = self
            .trusted
            .get(&attestation.issuer)
            .ok_or("issuer is not whitelisted")?;
        let sig_bytes = hex::decode(&attestation.signature).map_err(|_| "signature is not hex")?;
        let signature =
            Signature::from_slice(&sig_bytes).map_err(|_| "signature has wrong length")?;
        key.verify_strict(&attestation_message(&attestation.attested_digest), &signature)
            .map_err(|_| "signature does not verify")
    }
}

impl AttestationVerifier for Ed25519AttestationVerifier {
    fn verify(&self, attestation: &Attestation) -> VerifierReport {
        let valid = match self.check(attestation) {
            Ok(()) => true,
            Err(reason) => {
                tracing::debug!(issuer = %attestation.issuer, reason, "attestation rejected");
                false
            }
        };
        VerifierReport {
            valid,
            attested_digest: attestation.attested_digest.clone(),
        }
    }
}

impl fmt::Debug for Ed25519AttestationVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ed25519AttestationVerifier")
            .field("trusted", &self.trusted.keys().collect::<Vec<_>>())
            .finish()
    }
}
