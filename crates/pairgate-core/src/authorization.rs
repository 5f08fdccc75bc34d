//! The authorization gate.
//!
//! Callers identify themselves through an explicit [`AuthorizationContext`]
//! passed into every operation. The gate compares that caller with the owner
//! snapshot taken at the start of the call and, under
//! [`AuthorizationPolicy::OwnerPlusAttestation`], additionally binds the
//! configuration to a verifier-approved digest.

use std::fmt;

use pairgate_canonical::PrincipalId;

use crate::attestation::{Attestation, AttestationVerifier};
use crate::config::ConfigurationValue;
use crate::config_digest::{config_digest, ConfigEncoding};
use crate::errors::FactoryError;

/// Who is calling, and with what proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationContext {
    caller: PrincipalId,
    attestation: Option<Attestation>,
}

impl AuthorizationContext {
    /// Context for `caller` with no attestation.
    pub fn new(caller: PrincipalId) -> Self {
        Self {
            caller,
            attestation: None,
        }
    }

    /// Attaches an attestation for the configuration being deployed.
    pub fn with_attestation(mut self, attestation: Attestation) -> Self {
        self.attestation = Some(attestation);
        self
    }

    /// The calling principal.
    pub fn caller(&self) -> &PrincipalId {
        &self.caller
    }

    /// The supplied attestation, if any.
    pub fn attestation(&self) -> Option<&Attestation> {
        self.attestation.as_ref()
    }
}

/// How `deploy` is authorized. `transfer_ownership` is always owner-only.
#[derive(Default)]
pub enum AuthorizationPolicy {
    /// Only the owner may deploy.
    #[default]
    OwnerOnly,
    /// The owner may deploy a configuration a trusted verifier attested to.
    OwnerPlusAttestation(Box<dyn AttestationVerifier + Send>),
}

impl AuthorizationPolicy {
    /// Owner-plus-attestation policy over `verifier`.
    pub fn with_verifier<V>(verifier: V) -> Self
    where
        V: AttestationVerifier + Send + 'static,
    {
        AuthorizationPolicy::OwnerPlusAttestation(Box::new(verifier))
    }

    /// Authorizes a deploy of `config`. No side effects.
    pub fn authorize_deploy(
        &self,
        owner: &PrincipalId,
        ctx: &AuthorizationContext,
        config: &ConfigurationValue,
    ) -> Result<(), FactoryError> {
        require_owner(owner, ctx)?;
        match self {
            AuthorizationPolicy::OwnerOnly => Ok(()),
            AuthorizationPolicy::OwnerPlusAttestation(verifier) => {
                verify_attestation(verifier.as_ref(), ctx.attestation(), config)
            }
        }
    }
}

impl fmt::Debug for AuthorizationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthorizationPolicy::OwnerOnly => write!(f, "OwnerOnly"),
            AuthorizationPolicy::OwnerPlusAttestation(_) => write!(f, "OwnerPlusAttestation"),
        }
    }
}

/// Fails with `Unauthorized` unless the caller is `owner`.
pub fn require_owner(owner: &PrincipalId, ctx: &AuthorizationContext) -> Result<(), FactoryError> {
    if ctx.caller() == owner {
        Ok(())
    } else {
        Err(FactoryError::Unauthorized {
            caller: ctx.caller().clone(),
        })
    }
}

/// Checks that `attestation` is valid and approves exactly `config`.
///
/// The verifier is consulted once. A missing or invalid attestation is
/// `DeploymentNotVerified`; a valid one for another digest is `InvalidAttestation`.
pub fn verify_attestation(
    verifier: &dyn AttestationVerifier,
    attestation: Option<&Attestation>,
    config: &ConfigurationValue,
) -> Result<(), FactoryError> {
    let attestation = attestation.ok_or_else(|| {
        FactoryError::DeploymentNotVerified("no attestation supplied".to_string())
    })?;

    let report = verifier.verify(attestation);
    if !report.valid {
        return Err(FactoryError::DeploymentNotVerified(format!(
            "verifier rejected attestation from {}",
            attestation.issuer
        )));
    }

    let expected = config_digest(config, ConfigEncoding::V1)?;
    if report.attested_digest != expected {
        return Err(FactoryError::InvalidAttestation {
            expected,
            attested: report.attested_digest,
        });
    }
    Ok(())
}
