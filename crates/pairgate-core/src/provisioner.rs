//! Contracts for the external resource provisioners.
//!
//! The factory owns no resource logic: it hands each provisioner exactly its
//! parameter set, and `revoke` is only ever called on a handle the same
//! provisioner returned during the current `deploy` call.

use std::fmt;
use thiserror::Error;

use crate::config::{CurveParams, TokenParams};
use crate::handles::{CurveHandle, TokenHandle};

/// Error reported by a provisioner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProvisionError {
    /// Parameters violate the provisioner's preconditions.
    #[error("{0}")]
    Rejected(String),
    /// The handle does not name a resource this provisioner created.
    #[error("unknown handle {0}")]
    UnknownHandle(String),
    /// The provisioner could not be reached or its state is unusable.
    #[error("provisioner unavailable: {0}")]
    Unavailable(String),
}

/// Which construction step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionStage {
    /// Pricing-curve construction.
    Curve,
    /// Token construction.
    Token,
}

impl fmt::Display for ProvisionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisionStage::Curve => write!(f, "pricing-curve"),
            ProvisionStage::Token => write!(f, "token"),
        }
    }
}

/// Constructs pricing-curve resources.
pub trait PricingCurveProvisioner {
    /// Constructs a curve from exactly `base_price, linear_slope, inflection_price, inflection_point`.
    fn construct(&mut self, params: &CurveParams) -> Result<CurveHandle, ProvisionError>;

    /// Withdraws a curve whose pair never completed.
    fn revoke(&mut self, handle: CurveHandle) -> Result<(), ProvisionError>;
}

/// Constructs token resources bound to an existing curve.
pub trait TokenProvisioner {
    /// Constructs a token that references `curve`.
    fn construct(
        &mut self,
        params: &TokenParams,
        curve: CurveHandle,
    ) -> Result<TokenHandle, ProvisionError>;

    /// Withdraws a token whose pair never completed.
    fn revoke(&mut self, handle: TokenHandle) -> Result<(), ProvisionError>;
}
