use pairgate_canonical::{
    content_digest, Canonicalizer, Digest, HashingError, PrincipalId, ProfileId, Timestamp,
};
use serde::{Deserialize, Serialize};

use crate::config::ConfigurationValue;
use crate::config_digest::{config_digest, ConfigEncoding};
use crate::handles::{CurveHandle, TokenHandle};

/// Domain separator for event ID computation: `b"pairgate:event:v1\0"`.
pub const EVENT_DOMAIN_SEPARATOR: &[u8] = b"pairgate:event:v1\0";

/// `event_type` of [`PairProvisionedEvent`].
pub const PAIR_PROVISIONED: &str = "pair_provisioned";

/// Audit record of one completed provisioning.
///
/// `token` and `curve` are the searchable fields; `config` is the full value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairProvisionedEvent {
    /// Event ID (computed from canonical bytes).
    pub event_id: Digest,
    /// Event type: "pair_provisioned".
    pub event_type: String,
    /// Event version: "1".
    pub event_version: String,
    /// When the pair was provisioned.
    pub occurred_at: Timestamp,
    /// Caller that deployed the pair.
    pub principal_id: PrincipalId,
    /// Canonicalization profile ID.
    pub canonical_profile_id: ProfileId,
    /// Token handle.
    pub token: TokenHandle,
    /// Curve handle.
    pub curve: CurveHandle,
    /// V1 digest of `config`.
    pub config_digest: Digest,
    /// The configuration, field for field.
    pub config: ConfigurationValue,
}

impl PairProvisionedEvent {
    /// Builds the event and computes its `config_digest` and `event_id`.
    pub fn new(
        principal_id: PrincipalId,
        token: TokenHandle,
        curve: CurveHandle,
        config: ConfigurationValue,
        occurred_at: Timestamp,
        canonicalizer: &Canonicalizer,
    ) -> Result<Self, HashingError> {
        let mut event = Self {
            event_id: Digest::sha256_domain(EVENT_DOMAIN_SEPARATOR, b""),
            event_type: PAIR_PROVISIONED.to_string(),
            event_version: "1".to_string(),
            occurred_at,
            principal_id,
            canonical_profile_id: canonicalizer.profile().clone(),
            token,
            curve,
            config_digest: config_digest(&config, ConfigEncoding::V1)?,
            config,
        };
        event.event_id = compute_event_id(&event, canonicalizer)?;
        Ok(event)
    }

    /// Whether `event_id` matches the event's content.
    pub fn verify_event_id(&self, canonicalizer: &Canonicalizer) -> Result<bool, HashingError> {
        Ok(compute_event_id(self, canonicalizer)? == self.event_id)
    }

    /// Whether `config_digest` matches `config`.
    pub fn verify_config_digest(&self) -> Result<bool, HashingError> {
        Ok(config_digest(&self.config, ConfigEncoding::V1)? == self.config_digest)
    }
}

/// Computes the event ID for an audit record.
///
/// Formula: `sha256(domain_separator || canonical_bytes(event))`, where the
/// `event_id` field is excluded from the hash input.
pub fn compute_event_id<T: Serialize>(
    event: &T,
    canonicalizer: &Canonicalizer,
) -> Result<Digest, HashingError> {
    content_digest(event, EVENT_DOMAIN_SEPARATOR, &["event_id"], canonicalizer)
}

/// Record of an ownership change, returned by `transfer_ownership`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipTransferred {
    /// Owner before the call.
    pub previous_owner: PrincipalId,
    /// Owner after the call.
    pub new_owner: PrincipalId,
}
