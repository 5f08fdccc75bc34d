//! Append-only sink for audit events.

use thiserror::Error;

use crate::events::PairProvisionedEvent;

/// Errors recording an audit event.
#[derive(Debug, Error)]
pub enum AuditError {
    /// I/O failure in the backing store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Any other backend failure.
    #[error("audit backend error: {0}")]
    Backend(String),
}

/// Destination for audit events.
///
/// `emit` must either durably accept the event or return an error; the
/// factory rolls the pair back when it errors.
pub trait AuditSink {
    /// Appends one event.
    fn emit(&mut self, event: &PairProvisionedEvent) -> Result<(), AuditError>;
}

/// In-memory audit log.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuditLog {
    events: Vec<PairProvisionedEvent>,
}

impl MemoryAuditLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Events in emission order.
    pub fn events(&self) -> &[PairProvisionedEvent] {
        &self.events
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl AuditSink for MemoryAuditLog {
    fn emit(&mut self, event: &PairProvisionedEvent) -> Result<(), AuditError> {
        self.events.push(event.clone());
        Ok(())
    }
}

impl<S: AuditSink + ?Sized> AuditSink for Box<S> {
    fn emit(&mut self, event: &PairProvisionedEvent) -> Result<(), AuditError> {
        (**self).emit(event)
    }
}
