//! Canonical data model primitives for pairgate provisioning records.
//!
//! Everything that participates in hashing or signature verification lives in
//! this crate: the RFC 8785 canonicalizer, domain-separated SHA-256 digests,
//! validated identifiers, and the fixed-precision quantities carried by a
//! provisioning configuration.
//!
#![deny(missing_docs)]

/// Canonicalization helpers for deterministic hashing.
pub mod canonicalizer;
/// Digest primitives.
pub mod digest;
/// Domain-separated content hashing over canonical bytes.
pub mod hashing;
/// Validated identifier newtypes.
pub mod identifiers;
/// Fixed-precision amounts and basis points.
pub mod quantities;
/// Validation errors raised by canonical types.
pub mod validation;

pub use canonicalizer::{CanonicalizationError, Canonicalizer};
pub use digest::{Digest, DigestAlg};
pub use hashing::{content_digest, HashingError};
pub use identifiers::{AssetId, PrincipalId, ProfileId, Timestamp};
pub use quantities::{Amount, Bips, BIPS_DENOMINATOR};
pub use validation::ValidationError;
