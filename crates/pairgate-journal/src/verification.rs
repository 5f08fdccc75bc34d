//! Offline checks over a whole journal.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use pairgate_canonical::{Canonicalizer, Digest, ProfileId};
use pairgate_core::{CurveHandle, PairProvisionedEvent, TokenHandle};
use serde::Serialize;
use serde_json::Value;

use crate::errors::JournalError;
use crate::filter::EventFilter;
use crate::reader::{JournalReader, ReadMode};

/// Outcome for one journal record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordVerdict {
    /// Every check passed.
    Ok,
    /// The payload is not a provisioning event.
    Malformed,
    /// `event_id` does not match the event content.
    EventIdMismatch,
    /// `config_digest` does not match `config`.
    ConfigDigestMismatch,
    /// The token or curve handle already appeared in an earlier record.
    DuplicateHandle,
}

impl fmt::Display for RecordVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecordVerdict::Ok => "ok",
            RecordVerdict::Malformed => "malformed",
            RecordVerdict::EventIdMismatch => "event-id-mismatch",
            RecordVerdict::ConfigDigestMismatch => "config-digest-mismatch",
            RecordVerdict::DuplicateHandle => "duplicate-handle",
        };
        f.write_str(s)
    }
}

/// Verification result for one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordReport {
    /// Zero-based position among event records.
    pub index: usize,
    /// Claimed event ID, when the payload has one.
    pub event_id: Option<Digest>,
    /// Token handle, when the payload parsed.
    pub token: Option<TokenHandle>,
    /// Curve handle, when the payload parsed.
    pub curve: Option<CurveHandle>,
    /// First failed check, or `Ok`.
    pub verdict: RecordVerdict,
}

/// Verification result for a journal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JournalReport {
    /// One entry per event record, in file order.
    pub records: Vec<RecordReport>,
}

impl JournalReport {
    /// Whether every record passed.
    pub fn all_ok(&self) -> bool {
        self.records.iter().all(|r| r.verdict == RecordVerdict::Ok)
    }

    /// Records that failed a check.
    pub fn failures(&self) -> impl Iterator<Item = &RecordReport> {
        self.records.iter().filter(|r| r.verdict != RecordVerdict::Ok)
    }
}

/// Reads the events at `path` that `filter` selects.
pub fn replay_pairs<P, F>(
    path: P,
    mode: ReadMode,
    filter: F,
) -> Result<Vec<PairProvisionedEvent>, JournalError>
where
    P: AsRef<Path>,
    F: EventFilter,
{
    let mut reader = JournalReader::open(path, mode)?;
    let mut events = Vec::new();
    while let Some(event) = reader.read_event()? {
        if filter.matches(&event) {
            events.push(event);
        }
    }
    Ok(events)
}

/// Checks every record at `path`.
///
/// Per record: the payload parses as a provisioning event, its `event_id`
/// matches its content, its `config_digest` matches its `config`, and neither
/// handle was claimed by an earlier record. Framing errors abort; record-level
/// failures are reported.
pub fn verify_journal<P: AsRef<Path>>(path: P, mode: ReadMode) -> Result<JournalReport, JournalError> {
    let canonicalizer = Canonicalizer::new(ProfileId::v1());
    let mut reader = JournalReader::open(path, mode)?;
    let mut report = JournalReport::default();
    let mut tokens: BTreeMap<TokenHandle, usize> = BTreeMap::new();
    let mut curves: BTreeMap<CurveHandle, usize> = BTreeMap::new();

    while let Some(value) = reader.read_value()? {
        let index = report.records.len();
        let record = match serde_json::from_value::<PairProvisionedEvent>(value.clone()) {
            Ok(event) => {
                let verdict = check_event(&event, &canonicalizer, index, &mut tokens, &mut curves);
                RecordReport {
                    index,
                    event_id: Some(event.event_id),
                    token: Some(event.token),
                    curve: Some(event.curve),
                    verdict,
                }
            }
            Err(err) => {
                tracing::debug!(index, error = %err, "record is not a provisioning event");
                RecordReport {
                    index,
                    event_id: claimed_event_id(&value),
                    token: None,
                    curve: None,
                    verdict: RecordVerdict::Malformed,
                }
            }
        };
        if record.verdict != RecordVerdict::Ok {
            tracing::warn!(index, verdict = %record.verdict, "journal record failed verification");
        }
        report.records.push(record);
    }
    Ok(report)
}

fn check_event(
    event: &PairProvisionedEvent,
    canonicalizer: &Canonicalizer,
    index: usize,
    tokens: &mut BTreeMap<TokenHandle, usize>,
    curves: &mut BTreeMap<CurveHandle, usize>,
) -> RecordVerdict {
    if !event.verify_event_id(canonicalizer).unwrap_or(false) {
        return RecordVerdict::EventIdMismatch;
    }
    if !event.verify_config_digest().unwrap_or(false) {
        return RecordVerdict::ConfigDigestMismatch;
    }
    let token_seen = tokens.insert(event.token, index).is_some();
    let curve_seen = curves.insert(event.curve, index).is_some();
    if token_seen || curve_seen {
        return RecordVerdict::DuplicateHandle;
    }
    RecordVerdict::Ok
}

fn claimed_event_id(value: &Value) -> Option<Digest> {
    value
        .get("event_id")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
}
