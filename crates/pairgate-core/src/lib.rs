//! Owner-gated provisioning of pricing-curve and token pairs.
//!
//! This crate provides:
//! - `ConfigurationValue`, the immutable description of one provisioning request
//! - A versioned, domain-separated configuration digest
//! - Provisioner traits and opaque resource handles
//! - An authorization gate with optional attestation binding
//! - The `Factory`, which authorizes, provisions and audits as one unit
//! - A reference in-memory resource arena
//!
//! Core invariants:
//! - No resource is constructed and no event is emitted for an unauthorized caller
//! - A deploy either yields a curve, a token bound to it and one audit event, or nothing
//! - Only the current owner can replace the owner
//!
#![deny(missing_docs)]

/// Reference in-memory provisioner.
pub mod arena;
/// Attestations and their verifiers.
pub mod attestation;
/// Audit sinks.
pub mod audit;
/// Authorization context and policy.
pub mod authorization;
/// Provisioning configuration.
pub mod config;
/// Versioned configuration digest.
pub mod config_digest;
/// Error types for factory operations.
pub mod errors;
/// Audit event types and event ID computation.
pub mod events;
/// The provisioning factory.
pub mod factory;
/// Opaque resource handles.
pub mod handles;
/// Provisioner traits.
pub mod provisioner;
/// Factory settings.
pub mod settings;

pub use arena::{ArenaLimits, ConsistencyError, ResourceArena, ResourceStatus};
pub use attestation::{
    sign_attestation, Attestation, AttestationVerifier, Ed25519AttestationVerifier,
    VerifierError, VerifierReport,
};
pub use audit::{AuditError, AuditSink, MemoryAuditLog};
pub use authorization::{AuthorizationContext, AuthorizationPolicy};
pub use config::{ConfigurationBuilder, ConfigurationValue, CurveParams, TokenParams};
pub use config_digest::{config_digest, ConfigEncoding, CONFIG_DOMAIN_V1};
pub use errors::FactoryError;
pub use events::{compute_event_id, OwnershipTransferred, PairProvisionedEvent};
pub use factory::{Factory, FactoryState, SharedFactory};
pub use handles::{CurveHandle, ProvisionedPair, TokenHandle};
pub use provisioner::{PricingCurveProvisioner, ProvisionError, ProvisionStage, TokenProvisioner};
pub use settings::{FactorySettings, PolicyKind, SettingsError};
