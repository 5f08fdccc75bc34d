//! In-memory reference provisioner for curves and tokens.
//!
//! Resources live in one arena addressed by index handles. Every resource gets
//! a sequence number from a counter shared by both kinds, so a token's curve
//! reference can be checked to point at a live curve constructed before it.
//! [`ResourceArena`] is a cheap clonable handle; clones share the same state,
//! which lets one arena serve as both provisioners of a factory while a test or
//! tool keeps a clone for inspection.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use pairgate_canonical::{Bips, ValidationError, BIPS_DENOMINATOR};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{CurveParams, TokenParams};
use crate::handles::{CurveHandle, TokenHandle};
use crate::provisioner::{PricingCurveProvisioner, ProvisionError, TokenProvisioner};

/// Token preconditions enforced by the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaLimits {
    /// Upper bound on `creator_fee_bips + admin_fee_bips`.
    pub max_fee_bips: Bips,
    /// Upper bound on `creator_royalty_bips`.
    pub max_royalty_bips: Bips,
}

impl ArenaLimits {
    /// Rejects limits above 100%.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, bips) in [
            ("max_fee_bips", self.max_fee_bips),
            ("max_royalty_bips", self.max_royalty_bips),
        ] {
            if !bips.is_whole_or_less() {
                return Err(ValidationError::OutOfBounds {
                    field,
                    value: bips.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Default for ArenaLimits {
    fn default() -> Self {
        Self {
            max_fee_bips: Bips::new(BIPS_DENOMINATOR),
            max_royalty_bips: Bips::new(BIPS_DENOMINATOR),
        }
    }
}

/// Lifecycle of an arena slot. Slots are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceStatus {
    /// Constructed and not withdrawn.
    Live,
    /// Withdrawn by a rollback; no longer attributable as provisioned.
    Revoked,
}

/// A constructed pricing curve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurveResource {
    /// Handle returned at construction.
    pub handle: CurveHandle,
    /// Arena-wide construction order.
    pub seq: u64,
    /// Constructor parameters.
    pub params: CurveParams,
    /// Current status.
    pub status: ResourceStatus,
}

/// A constructed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenResource {
    /// Handle returned at construction.
    pub handle: TokenHandle,
    /// Arena-wide construction order.
    pub seq: u64,
    /// Constructor parameters.
    pub params: TokenParams,
    /// The curve this token prices against.
    pub curve: CurveHandle,
    /// Current status.
    pub status: ResourceStatus,
}

/// Pair-consistency violations found by [`ResourceArena::check_consistency`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsistencyError {
    /// A live token references a curve the arena never created.
    #[error("{token} references unknown {curve}")]
    UnknownCurve {
        /// Offending token.
        token: TokenHandle,
        /// Dangling reference.
        curve: CurveHandle,
    },
    /// A live token references a revoked curve.
    #[error("{token} references revoked {curve}")]
    RevokedCurve {
        /// Offending token.
        token: TokenHandle,
        /// Revoked curve.
        curve: CurveHandle,
    },
    /// A token was constructed before the curve it references.
    #[error("{token} predates its {curve}")]
    OutOfOrder {
        /// Offending token.
        token: TokenHandle,
        /// Later curve.
        curve: CurveHandle,
    },
    /// Two live tokens share one curve.
    #[error("{curve} is shared by {first} and {second}")]
    SharedCurve {
        /// Shared curve.
        curve: CurveHandle,
        /// First token.
        first: TokenHandle,
        /// Second token.
        second: TokenHandle,
    },
    /// A live curve has no live token: a half-provisioned pair.
    #[error("{0} has no token")]
    OrphanCurve(CurveHandle),
}

#[derive(Debug, Default)]
struct ArenaState {
    next_seq: u64,
    curves: Vec<CurveResource>,
    tokens: Vec<TokenResource>,
}

/// Shared in-memory store of curve and token resources.
#[derive(Debug, Clone, Default)]
pub struct ResourceArena {
    limits: ArenaLimits,
    state: Arc<Mutex<ArenaState>>,
}

impl ResourceArena {
    /// Creates an empty arena with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty arena with `limits`.
    pub fn with_limits(limits: ArenaLimits) -> Self {
        Self {
            limits,
            state: Arc::default(),
        }
    }

    /// Limits enforced on token construction.
    pub fn limits(&self) -> ArenaLimits {
        self.limits
    }

    // Slots are only pushed or flagged, so a poisoned lock still holds whole resources.
    fn read(&self) -> MutexGuard<'_, ArenaState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> Result<MutexGuard<'_, ArenaState>, ProvisionError> {
        self.state
            .lock()
            .map_err(|_| ProvisionError::Unavailable("arena lock poisoned".to_string()))
    }

    /// Looks up a curve, live or revoked.
    pub fn curve(&self, handle: CurveHandle) -> Option<CurveResource> {
        self.read().curves.get(handle.index() as usize).cloned()
    }

    /// Looks up a token, live or revoked.
    pub fn token(&self, handle: TokenHandle) -> Option<TokenResource> {
        self.read().tokens.get(handle.index() as usize).cloned()
    }

    /// Whether `handle` names a live curve.
    pub fn is_curve_provisioned(&self, handle: CurveHandle) -> bool {
        self.curve(handle)
            .is_some_and(|c| c.status == ResourceStatus::Live)
    }

    /// Whether `handle` names a live token.
    pub fn is_token_provisioned(&self, handle: TokenHandle) -> bool {
        self.token(handle)
            .is_some_and(|t| t.status == ResourceStatus::Live)
    }

    /// Number of live curves.
    pub fn live_curves(&self) -> usize {
        self.read()
            .curves
            .iter()
            .filter(|c| c.status == ResourceStatus::Live)
            .count()
    }

    /// Number of live tokens.
    pub fn live_tokens(&self) -> usize {
        self.read()
            .tokens
            .iter()
            .filter(|t| t.status == ResourceStatus::Live)
            .count()
    }

    /// Total curve constructions, including revoked ones.
    pub fn curves_constructed(&self) -> usize {
        self.read().curves.len()
    }

    /// Validates every live pair and returns them as `(curve, token)` in token order.
    pub fn check_consistency(&self) -> Result<Vec<(CurveHandle, TokenHandle)>, ConsistencyError> {
        let state = self.read();
        let mut claimed: BTreeMap<CurveHandle, TokenHandle> = BTreeMap::new();
        let mut pairs = Vec::new();

        for token in state.tokens.iter().filter(|t| t.status == ResourceStatus::Live) {
            let curve = state
                .curves
                .get(token.curve.index() as usize)
                .ok_or(ConsistencyError::UnknownCurve {
                    token: token.handle,
                    curve: token.curve,
                })?;
            if curve.status != ResourceStatus::Live {
                return Err(ConsistencyError::RevokedCurve {
                    token: token.handle,
                    curve: curve.handle,
                });
            }
            if curve.seq >= token.seq {
                return Err(ConsistencyError::OutOfOrder {
                    token: token.handle,
                    curve: curve.handle,
                });
            }
            if let Some(first) = claimed.insert(curve.handle, token.handle) {
                return Err(ConsistencyError::SharedCurve {
                    curve: curve.handle,
                    first,
                    second: token.handle,
                });
            }
            pairs.push((curve.handle, token.handle));
        }

        if let Some(orphan) = state
            .curves
            .iter()
            .find(|c| c.status == ResourceStatus::Live && !claimed.contains_key(&c.handle))
        {
            return Err(ConsistencyError::OrphanCurve(orphan.handle));
        }

        Ok(pairs)
    }

    fn check_curve(params: &CurveParams) -> Result<(), ProvisionError> {
        if params.inflection_point == 0 {
            return Err(ProvisionError::Rejected(
                "inflection point must be positive".to_string(),
            ));
        }
        if params.inflection_price < params.base_price {
            return Err(ProvisionError::Rejected(format!(
                "inflection price {} is below base price {}",
                params.inflection_price, params.base_price
            )));
        }
        Ok(())
    }

    fn check_token(&self, params: &TokenParams) -> Result<(), ProvisionError> {
        let fees = u32::from(params.creator_fee_bips.get()) + u32::from(params.admin_fee_bips.get());
        if fees > u32::from(self.limits.max_fee_bips.get()) {
            return Err(ProvisionError::Rejected(format!(
                "combined fee {}bps exceeds {}",
                fees, self.limits.max_fee_bips
            )));
        }
        if params.creator_royalty_bips > self.limits.max_royalty_bips {
            return Err(ProvisionError::Rejected(format!(
                "royalty {} exceeds {}",
                params.creator_royalty_bips, self.limits.max_royalty_bips
            )));
        }
        Ok(())
    }
}

impl PricingCurveProvisioner for ResourceArena {
    fn construct(&mut self, params: &CurveParams) -> Result<CurveHandle, ProvisionError> {
        Self::check_curve(params)?;
        let mut state = self.write()?;
        let handle = CurveHandle::new(state.curves.len() as u64);
        let seq = state.next_seq;
        state.next_seq += 1;
        state.curves.push(CurveResource {
            handle,
            seq,
            params: *params,
            status: ResourceStatus::Live,
        });
        Ok(handle)
    }

    fn revoke(&mut self, handle: CurveHandle) -> Result<(), ProvisionError> {
        let mut state = self.write()?;
        let curve = state
            .curves
            .get_mut(handle.index() as usize)
            .ok_or_else(|| ProvisionError::UnknownHandle(handle.to_string()))?;
        curve.status = ResourceStatus::Revoked;
        Ok(())
    }
}

impl TokenProvisioner for ResourceArena {
    fn construct(
        &mut self,
        params: &TokenParams,
        curve: CurveHandle,
    ) -> Result<TokenHandle, ProvisionError> {
        self.check_token(params)?;
        let mut state = self.write()?;
        if state.curves.get(curve.index() as usize).map(|c| c.status) != Some(ResourceStatus::Live)
        {
            return Err(ProvisionError::UnknownHandle(curve.to_string()));
        }
        let handle = TokenHandle::new(state.tokens.len() as u64);
        let seq = state.next_seq;
        state.next_seq += 1;
        state.tokens.push(TokenResource {
            handle,
            seq,
            params: params.clone(),
            curve,
            status: ResourceStatus::Live,
        });
        Ok(handle)
    }

    fn revoke(&mut self, handle: TokenHandle) -> Result<(), ProvisionError> {
        let mut state = self.write()?;
        let token = state
            .tokens
            .get_mut(handle.index() as usize)
            .ok_or_else(|| ProvisionError::UnknownHandle(handle.to_string()))?;
        token.status = ResourceStatus::Revoked;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pairgate_canonical::{Amount, AssetId, PrincipalId};

    fn curve_params() -> CurveParams {
        CurveParams {
            base_price: Amount::new(100),
            linear_slope: Amount::new(5),
            inflection_price: Amount::new(500),
            inflection_point: 1000,
        }
    }

    fn token_params(creator_fee: u16) -> TokenParams {
        let p = |s: &str| PrincipalId::parse(s).unwrap();
        TokenParams {
            name: "Alice".into(),
            symbol: "ALC".into(),
            resource_uri: "ipfs://alice".into(),
            creator: p("human:alice"),
            creator_fee_bips: Bips::new(creator_fee),
            creator_royalty_bips: Bips::new(500),
            admin: p("org:admin"),
            admin_fee_bips: Bips::new(50),
            referrer: p("human:bob"),
            payment_asset: AssetId::parse("usdc").unwrap(),
        }
    }

    #[test]
    fn limits_above_whole_are_invalid() {
        assert!(ArenaLimits::default().validate().is_ok());
        let limits = ArenaLimits {
            max_fee_bips: Bips::new(BIPS_DENOMINATOR + 1),
            ..ArenaLimits::default()
        };
        assert!(matches!(
            limits.validate(),
            Err(ValidationError::OutOfBounds { field: "max_fee_bips", .. })
        ));
    }

    #[test]
    fn token_records_curve_reference() {
        let mut arena = ResourceArena::new();
        let curve = PricingCurveProvisioner::construct(&mut arena, &curve_params()).unwrap();
        let token = TokenProvisioner::construct(&mut arena, &token_params(100), curve).unwrap();
        assert_eq!(arena.token(token).unwrap().curve, curve);
        assert_eq!(arena.check_consistency().unwrap(), vec![(curve, token)]);
    }

    #[test]
    fn fee_limit_is_a_rejection() {
        let mut arena = ResourceArena::new();
        let curve = PricingCurveProvisioner::construct(&mut arena, &curve_params()).unwrap();
        let err = TokenProvisioner::construct(&mut arena, &token_params(9_951), curve).unwrap_err();
        assert!(matches!(err, ProvisionError::Rejected(_)));
    }

    #[test]
    fn curve_preconditions() {
        let mut arena = ResourceArena::new();
        let mut params = curve_params();
        params.inflection_point = 0;
        assert!(PricingCurveProvisioner::construct(&mut arena, &params).is_err());
        params = curve_params();
        params.inflection_price = Amount::new(99);
        assert!(PricingCurveProvisioner::construct(&mut arena, &params).is_err());
        assert_eq!(arena.curves_constructed(), 0);
    }

    #[test]
    fn orphan_curve_is_inconsistent_until_revoked() {
        let mut arena = ResourceArena::new();
        let curve = PricingCurveProvisioner::construct(&mut arena, &curve_params()).unwrap();
        assert_eq!(
            arena.check_consistency(),
            Err(ConsistencyError::OrphanCurve(curve))
        );
        PricingCurveProvisioner::revoke(&mut arena, curve).unwrap();
        assert!(!arena.is_curve_provisioned(curve));
        assert!(arena.check_consistency().unwrap().is_empty());
    }

    #[test]
    fn token_on_revoked_curve_is_refused() {
        let mut arena = ResourceArena::new();
        let curve = PricingCurveProvisioner::construct(&mut arena, &curve_params()).unwrap();
        PricingCurveProvisioner::revoke(&mut arena, curve).unwrap();
        let err = TokenProvisioner::construct(&mut arena, &token_params(100), curve).unwrap_err();
        assert!(matches!(err, ProvisionError::UnknownHandle(_)));
    }

    #[test]
    fn clones_share_state() {
        let arena = ResourceArena::new();
        let mut writer = arena.clone();
        let curve = PricingCurveProvisioner::construct(&mut writer, &curve_params()).unwrap();
        assert!(arena.is_curve_provisioned(curve));
    }
}
