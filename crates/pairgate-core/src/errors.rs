use pairgate_canonical::{Digest, HashingError, PrincipalId};
use thiserror::Error;

use crate::audit::AuditError;
use crate::provisioner::{ProvisionError, ProvisionStage};

/// Errors returned by factory operations. Every variant is terminal for the call.
#[derive(Error, Debug)]
pub enum FactoryError {
    /// Caller is not the current owner. Raised before any side effect.
    #[error("caller {caller} is not the factory owner")]
    Unauthorized {
        /// The rejected caller.
        caller: PrincipalId,
    },
    /// The attestation was missing or the verifier rejected it.
    #[error("deployment not verified: {0}")]
    DeploymentNotVerified(String),
    /// The attestation is authentic but approves a different configuration.
    #[error("attestation approves {attested}, configuration digest is {expected}")]
    InvalidAttestation {
        /// Digest of the configuration being deployed.
        expected: Digest,
        /// Digest the attestation speaks for.
        attested: Digest,
    },
    /// A provisioner rejected its parameters; `source` is its error unchanged.
    #[error("{stage} provisioner rejected: {source}")]
    ProvisionerRejected {
        /// Step that failed.
        stage: ProvisionStage,
        /// The provisioner's own error.
        source: ProvisionError,
    },
    /// The audit event could not be recorded.
    #[error("audit emission failed: {0}")]
    Audit(#[from] AuditError),
    /// Configuration or event digest computation failed.
    #[error("digest computation failed: {0}")]
    Digest(#[from] HashingError),
    /// A shared factory's lock was poisoned by a panicking holder.
    #[error("factory lock poisoned")]
    Poisoned,
}
