//! File-based factory settings.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use pairgate_canonical::{PrincipalId, ValidationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::arena::ArenaLimits;
use crate::attestation::{Ed25519AttestationVerifier, VerifierError};
use crate::authorization::AuthorizationPolicy;

/// Environment variable that overrides the configured owner.
pub const OWNER_ENV: &str = "PAIRGATE_OWNER";

/// Errors loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Settings file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// Settings file is not valid JSON for [`FactorySettings`].
    #[error("invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Owner override is not a principal.
    #[error("invalid PAIRGATE_OWNER: {0}")]
    Owner(#[from] ValidationError),
    /// Attestation policy requested without any trusted verifier.
    #[error("policy owner_plus_attestation needs at least one trusted verifier")]
    NoTrustedVerifiers,
    /// Arena limits exceed 100%.
    #[error("invalid arena limits: {0}")]
    Limits(ValidationError),
    /// A trusted verifier key is malformed.
    #[error(transparent)]
    Verifier(#[from] VerifierError),
}

/// Which deploy policy to install.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Owner only.
    #[default]
    OwnerOnly,
    /// Owner plus a trusted attestation.
    OwnerPlusAttestation,
}

/// Settings for building a factory.
///
/// ```json
/// {
///   "owner": "org:launchpad",
///   "policy": "owner_plus_attestation",
///   "trusted_verifiers": { "auditor-1": "<64 hex chars>" },
///   "journal": "pairs.pgj",
///   "arena": { "max_fee_bips": 1000 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FactorySettings {
    /// Initial owner.
    pub owner: PrincipalId,
    /// Deploy policy.
    #[serde(default)]
    pub policy: PolicyKind,
    /// Trusted verifier keys: key id to hex Ed25519 public key.
    #[serde(default)]
    pub trusted_verifiers: BTreeMap<String, String>,
    /// Journal receiving audit events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<PathBuf>,
    /// Limits for the reference arena.
    #[serde(default)]
    pub arena: ArenaLimits,
}

impl FactorySettings {
    /// Settings with defaults for `owner`.
    pub fn new(owner: PrincipalId) -> Self {
        Self {
            owner,
            policy: PolicyKind::default(),
            trusted_verifiers: BTreeMap::new(),
            journal: None,
            arena: ArenaLimits::default(),
        }
    }

    /// Reads settings from `path` and applies the `PAIRGATE_OWNER` override.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let payload = fs::read(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut settings: FactorySettings = serde_json::from_slice(&payload)?;
        if let Ok(owner) = std::env::var(OWNER_ENV) {
            settings = settings.with_owner_override(&owner)?;
        }
        settings.arena.validate().map_err(SettingsError::Limits)?;
        Ok(settings)
    }

    /// Replaces the owner with the principal in `owner`.
    pub fn with_owner_override(mut self, owner: &str) -> Result<Self, SettingsError> {
        self.owner = PrincipalId::parse(owner)?;
        Ok(self)
    }

    /// Builds the configured authorization policy.
    pub fn authorization_policy(&self) -> Result<AuthorizationPolicy, SettingsError> {
        match self.policy {
            PolicyKind::OwnerOnly => Ok(AuthorizationPolicy::OwnerOnly),
            PolicyKind::OwnerPlusAttestation => {
                if self.trusted_verifiers.is_empty() {
                    return Err(SettingsError::NoTrustedVerifiers);
                }
                let verifier = Ed25519AttestationVerifier::from_hex_keys(&self.trusted_verifiers)?;
                Ok(AuthorizationPolicy::with_verifier(verifier))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pairgate_canonical::Bips;
    use serde_json::json;

    #[test]
    fn minimal_settings_use_defaults() {
        let settings: FactorySettings =
            serde_json::from_value(json!({ "owner": "org:launchpad" })).unwrap();
        assert_eq!(settings.owner.as_str(), "org:launchpad");
        assert_eq!(settings.policy, PolicyKind::OwnerOnly);
        assert!(settings.journal.is_none());
        assert_eq!(settings.arena, ArenaLimits::default());
        assert!(matches!(
            settings.authorization_policy().unwrap(),
            AuthorizationPolicy::OwnerOnly
        ));
    }

    #[test]
    fn attestation_policy_requires_verifiers() {
        let settings: FactorySettings = serde_json::from_value(json!({
            "owner": "org:launchpad",
            "policy": "owner_plus_attestation"
        }))
        .unwrap();
        assert!(matches!(
            settings.authorization_policy(),
            Err(SettingsError::NoTrustedVerifiers)
        ));
    }

    #[test]
    fn malformed_verifier_key_is_rejected() {
        let settings: FactorySettings = serde_json::from_value(json!({
            "owner": "org:launchpad",
            "policy": "owner_plus_attestation",
            "trusted_verifiers": { "auditor-1": "abcd" }
        }))
        .unwrap();
        assert!(matches!(
            settings.authorization_policy(),
            Err(SettingsError::Verifier(_))
        ));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<FactorySettings, _> =
            serde_json::from_value(json!({ "owner": "org:launchpad", "admins": [] }));
        assert!(result.is_err());
    }

    #[test]
    fn owner_override_validates() {
        let settings = FactorySettings::new(PrincipalId::parse("org:launchpad").unwrap());
        let moved = settings.clone().with_owner_override("human:alice").unwrap();
        assert_eq!(moved.owner.as_str(), "human:alice");
        assert!(matches!(
            settings.with_owner_override("nobody"),
            Err(SettingsError::Owner(_))
        ));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"owner":"org:launchpad","arena":{"max_fee_bips":1000},"journal":"pairs.pgj"}"#,
        )
        .unwrap();
        let settings = FactorySettings::load(&path).unwrap();
        assert_eq!(settings.arena.max_fee_bips, Bips::new(1000));
        assert_eq!(settings.journal, Some(PathBuf::from("pairs.pgj")));
    }

    #[test]
    fn load_rejects_limits_above_whole() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"owner":"org:launchpad","arena":{"max_royalty_bips":10001}}"#,
        )
        .unwrap();
        match FactorySettings::load(&path) {
            Err(SettingsError::Limits(ValidationError::OutOfBounds { field, .. })) => {
                assert_eq!(field, "max_royalty_bips")
            }
            other => panic!("expected limits error, got {other:?}"),
        }
    }
}
