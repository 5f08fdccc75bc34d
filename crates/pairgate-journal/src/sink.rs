use std::fs::File;
use std::path::Path;

use pairgate_core::{AuditError, AuditSink, PairProvisionedEvent};

use crate::errors::JournalError;
use crate::writer::{JournalFile, JournalWriter, WriteOptions};

/// Audit sink that appends every event to a journal file.
///
/// `emit` returns only after the frame is written (and synced when
/// `WriteOptions::sync` is set). A failed `emit` leaves the journal as it was,
/// so a rolled-back deploy never has an event on disk.
pub struct JournalAuditSink<F = File> {
    writer: JournalWriter<F>,
    appended: usize,
}

impl JournalAuditSink<File> {
    /// Opens or creates the journal at `path`.
    pub fn open<P: AsRef<Path>>(path: P, options: WriteOptions) -> Result<Self, JournalError> {
        Ok(Self::new(JournalWriter::open(path, options)?))
    }
}

impl<F: JournalFile> JournalAuditSink<F> {
    /// Wraps an open writer.
    pub fn new(writer: JournalWriter<F>) -> Self {
        Self {
            writer,
            appended: 0,
        }
    }

    /// Events appended through this sink.
    pub fn appended(&self) -> usize {
        self.appended
    }

    /// Flushes and closes the journal.
    pub fn finish(self) -> Result<(), JournalError> {
        self.writer.finish()
    }
}

impl<F: JournalFile> AuditSink for JournalAuditSink<F> {
    fn emit(&mut self, event: &PairProvisionedEvent) -> Result<(), AuditError> {
        self.writer.append_event(event).map_err(|err| match err {
            JournalError::Io(io) => AuditError::Io(io),
            other => AuditError::Backend(other.to_string()),
        })?;
        self.appended += 1;
        tracing::debug!(event_id = %event.event_id, "event journaled");
        Ok(())
    }
}
