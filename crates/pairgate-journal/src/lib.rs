//! Append-only journal of pairgate provisioning events.
//!
//! This crate provides:
//! - The framed `.pgj` file format
//! - Reader/writer APIs with strict and permissive truncation handling
//! - [`JournalAuditSink`], a durable `AuditSink` for the factory
//! - Replay with handle filters and offline verification of every record
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pairgate_canonical::PrincipalId;
//! use pairgate_core::{AuthorizationContext, ConfigurationValue, Factory, ResourceArena};
//! use pairgate_journal::{replay_pairs, JournalAuditSink, ReadMode, TokenFilter, WriteOptions};
//!
//! let owner = PrincipalId::parse("org:launchpad")?;
//! let config = ConfigurationValue::from_json(&std::fs::read_to_string("alice.json")?)?;
//!
//! let arena = ResourceArena::new();
//! let sink = JournalAuditSink::open("pairs.pgj", WriteOptions::default())?;
//! let mut factory = Factory::new(owner.clone(), arena.clone(), arena, sink);
//! let token = factory.deploy(&AuthorizationContext::new(owner), &config)?;
//!
//! let events = replay_pairs("pairs.pgj", ReadMode::Strict, TokenFilter(token))?;
//! assert_eq!(events.len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(missing_docs)]

/// Error types for journal operations.
pub mod errors;
/// Event filters for replay.
pub mod filter;
/// File and frame layout.
pub mod frame;
/// Journal reader.
pub mod reader;
/// Audit sink backed by a journal.
pub mod sink;
/// Replay and verification over whole journals.
pub mod verification;
/// Journal writer.
pub mod writer;

pub use errors::JournalError;
pub use filter::{AllEvents, AndFilter, CurveFilter, EventFilter, EventTypeFilter, TokenFilter};
pub use frame::{FrameHeader, FrameKind, JournalHeader};
pub use reader::{JournalReader, ReadMode};
pub use sink::JournalAuditSink;
pub use verification::{
    replay_pairs, verify_journal, JournalReport, RecordReport, RecordVerdict,
};
pub use writer::{JournalFile, JournalWriter, WriteOptions};
