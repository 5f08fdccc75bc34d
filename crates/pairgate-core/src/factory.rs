//! The provisioning factory.
//!
//! A deploy runs as one unit: authorize, construct the curve, construct the
//! token against it, record the audit event. Any failure after the curve exists
//! revokes what was built in this call before the error is returned, so a
//! caller never observes a curve without its token or a pair without its event.

use std::sync::{Arc, Mutex};

use pairgate_canonical::{Canonicalizer, PrincipalId, ProfileId, Timestamp};

use crate::audit::AuditSink;
use crate::authorization::{require_owner, AuthorizationContext, AuthorizationPolicy};
use crate::config::ConfigurationValue;
use crate::errors::FactoryError;
use crate::events::{OwnershipTransferred, PairProvisionedEvent};
use crate::handles::{CurveHandle, ProvisionedPair, TokenHandle};
use crate::provisioner::{PricingCurveProvisioner, ProvisionStage, TokenProvisioner};

/// The factory's only mutable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryState {
    owner: PrincipalId,
}

impl FactoryState {
    /// State owned by `owner`.
    pub fn new(owner: PrincipalId) -> Self {
        Self { owner }
    }

    /// Current owner.
    pub fn owner(&self) -> &PrincipalId {
        &self.owner
    }
}

/// Owner-gated provisioner of curve/token pairs.
///
/// # Example
///
/// ```rust
/// use pairgate_canonical::{AssetId, PrincipalId};
/// use pairgate_core::{
///     AuthorizationContext, ConfigurationValue, Factory, MemoryAuditLog, ResourceArena,
/// };
///
/// let owner = PrincipalId::parse("org:launchpad")?;
/// let arena = ResourceArena::new();
/// let mut factory = Factory::new(owner.clone(), arena.clone(), arena.clone(), MemoryAuditLog::new());
///
/// let config = ConfigurationValue::builder()
///     .name("Alice")
///     .symbol("ALC")
///     .resource_uri("ipfs://alice")
///     .creator(PrincipalId::parse("human:alice")?)
///     .creator_fee_bips(100u16)
///     .creator_royalty_bips(500u16)
///     .admin(owner.clone())
///     .admin_fee_bips(50u16)
///     .referrer(PrincipalId::parse("human:bob")?)
///     .payment_asset(AssetId::parse("usdc")?)
///     .base_price(100u128)
///     .linear_slope(5u128)
///     .inflection_price(500u128)
///     .inflection_point(1000)
///     .build()?;
///
/// let token = factory.deploy(&AuthorizationContext::new(owner), &config)?;
/// assert_eq!(factory.audit().events()[0].token, token);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Factory<C, T, A> {
    state: FactoryState,
    policy: AuthorizationPolicy,
    curves: C,
    tokens: T,
    audit: A,
    canonicalizer: Canonicalizer,
}

impl<C, T, A> Factory<C, T, A>
where
    C: PricingCurveProvisioner,
    T: TokenProvisioner,
    A: AuditSink,
{
    /// Creates an owner-only factory.
    pub fn new(owner: PrincipalId, curves: C, tokens: T, audit: A) -> Self {
        Self {
            state: FactoryState::new(owner),
            policy: AuthorizationPolicy::OwnerOnly,
            curves,
            tokens,
            audit,
            canonicalizer: Canonicalizer::new(ProfileId::v1()),
        }
    }

    /// Replaces the deploy authorization policy.
    pub fn with_policy(mut self, policy: AuthorizationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Current owner.
    pub fn owner(&self) -> &PrincipalId {
        self.state.owner()
    }

    /// Factory state.
    pub fn state(&self) -> &FactoryState {
        &self.state
    }

    /// Active deploy policy.
    pub fn policy(&self) -> &AuthorizationPolicy {
        &self.policy
    }

    /// Curve provisioner.
    pub fn curves(&self) -> &C {
        &self.curves
    }

    /// Token provisioner.
    pub fn tokens(&self) -> &T {
        &self.tokens
    }

    /// Audit sink.
    pub fn audit(&self) -> &A {
        &self.audit
    }

    /// Provisions the pair described by `config` and returns the token handle.
    pub fn deploy(
        &mut self,
        ctx: &AuthorizationContext,
        config: &ConfigurationValue,
    ) -> Result<TokenHandle, FactoryError> {
        self.deploy_pair(ctx, config).map(|pair| pair.token)
    }

    /// Provisions the pair described by `config` and returns both handles.
    pub fn deploy_pair(
        &mut self,
        ctx: &AuthorizationContext,
        config: &ConfigurationValue,
    ) -> Result<ProvisionedPair, FactoryError> {
        let owner = self.state.owner.clone();
        if let Err(err) = self.policy.authorize_deploy(&owner, ctx, config) {
            tracing::warn!(caller = %ctx.caller(), error = %err, "deploy rejected");
            return Err(err);
        }

        let curve = self
            .curves
            .construct(&config.curve_params())
            .map_err(|source| FactoryError::ProvisionerRejected {
                stage: ProvisionStage::Curve,
                source,
            })?;
        tracing::debug!(%curve, "curve constructed");

        let token = match self.tokens.construct(&config.token_params(), curve) {
            Ok(token) => token,
            Err(source) => {
                self.rollback(curve, None);
                return Err(FactoryError::ProvisionerRejected {
                    stage: ProvisionStage::Token,
                    source,
                });
            }
        };
        tracing::debug!(%token, %curve, "token constructed");

        let event = match PairProvisionedEvent::new(
            ctx.caller().clone(),
            token,
            curve,
            config.clone(),
            Timestamp::now(),
            &self.canonicalizer,
        ) {
            Ok(event) => event,
            Err(err) => {
                self.rollback(curve, Some(token));
                return Err(err.into());
            }
        };

        if let Err(err) = self.audit.emit(&event) {
            self.rollback(curve, Some(token));
            return Err(err.into());
        }

        tracing::info!(
            caller = %ctx.caller(),
            %token,
            %curve,
            event_id = %event.event_id,
            "pair provisioned"
        );
        Ok(ProvisionedPair {
            curve,
            token,
            config: config.clone(),
        })
    }

    /// Hands ownership to `new_owner`. Owner-only; `new_owner` is not checked further.
    pub fn transfer_ownership(
        &mut self,
        ctx: &AuthorizationContext,
        new_owner: PrincipalId,
    ) -> Result<OwnershipTransferred, FactoryError> {
        if let Err(err) = require_owner(&self.state.owner, ctx) {
            tracing::warn!(caller = %ctx.caller(), "ownership transfer rejected");
            return Err(err);
        }
        let previous_owner = std::mem::replace(&mut self.state.owner, new_owner.clone());
        tracing::info!(previous = %previous_owner, new = %new_owner, "ownership transferred");
        Ok(OwnershipTransferred {
            previous_owner,
            new_owner,
        })
    }

    // Undo in reverse construction order. The caller's error wins over a
    // failed revoke.
    fn rollback(&mut self, curve: CurveHandle, token: Option<TokenHandle>) {
        if let Some(token) = token {
            if let Err(err) = self.tokens.revoke(token) {
                tracing::error!(%token, error = %err, "token revoke failed during rollback");
            }
        }
        if let Err(err) = self.curves.revoke(curve) {
            tracing::error!(%curve, error = %err, "curve revoke failed during rollback");
        }
        tracing::debug!(%curve, "deploy rolled back");
    }
}

/// A factory shared across threads.
///
/// Each call holds the lock for its entire duration, so deploys are serialized
/// and the owner cannot change under an in-flight deploy.
pub struct SharedFactory<C, T, A> {
    inner: Arc<Mutex<Factory<C, T, A>>>,
}

impl<C, T, A> Clone for SharedFactory<C, T, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C, T, A> SharedFactory<C, T, A>
where
    C: PricingCurveProvisioner,
    T: TokenProvisioner,
    A: AuditSink,
{
    /// Wraps `factory` for shared use.
    pub fn new(factory: Factory<C, T, A>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(factory)),
        }
    }

    /// See [`Factory::deploy`].
    pub fn deploy(
        &self,
        ctx: &AuthorizationContext,
        config: &ConfigurationValue,
    ) -> Result<TokenHandle, FactoryError> {
        self.with_factory(|factory| factory.deploy(ctx, config))?
    }

    /// See [`Factory::deploy_pair`].
    pub fn deploy_pair(
        &self,
        ctx: &AuthorizationContext,
        config: &ConfigurationValue,
    ) -> Result<ProvisionedPair, FactoryError> {
        self.with_factory(|factory| factory.deploy_pair(ctx, config))?
    }

    /// See [`Factory::transfer_ownership`].
    pub fn transfer_ownership(
        &self,
        ctx: &AuthorizationContext,
        new_owner: PrincipalId,
    ) -> Result<OwnershipTransferred, FactoryError> {
        self.with_factory(|factory| factory.transfer_ownership(ctx, new_owner))?
    }

    /// Runs `f` with exclusive access to the factory.
    pub fn with_factory<R>(
        &self,
        f: impl FnOnce(&mut Factory<C, T, A>) -> R,
    ) -> Result<R, FactoryError> {
        let mut guard = self.inner.lock().map_err(|_| FactoryError::Poisoned)?;
        Ok(f(&mut guard))
    }
}
