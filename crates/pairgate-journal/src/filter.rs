//! Predicates for selecting provisioning events.

use pairgate_core::{CurveHandle, PairProvisionedEvent, TokenHandle};

/// Selects events during replay.
pub trait EventFilter {
    /// Whether `event` is selected.
    fn matches(&self, event: &PairProvisionedEvent) -> bool;
}

/// Selects every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllEvents;

impl EventFilter for AllEvents {
    fn matches(&self, _event: &PairProvisionedEvent) -> bool {
        true
    }
}

/// Events for one token.
#[derive(Debug, Clone, Copy)]
pub struct TokenFilter(pub TokenHandle);

impl EventFilter for TokenFilter {
    fn matches(&self, event: &PairProvisionedEvent) -> bool {
        event.token == self.0
    }
}

/// Events for one pricing curve.
#[derive(Debug, Clone, Copy)]
pub struct CurveFilter(pub CurveHandle);

impl EventFilter for CurveFilter {
    fn matches(&self, event: &PairProvisionedEvent) -> bool {
        event.curve == self.0
    }
}

/// Events of one type.
#[derive(Debug, Clone)]
pub struct EventTypeFilter {
    /// Event type to match, e.g. `"pair_provisioned"`.
    pub event_type: String,
}

impl EventFilter for EventTypeFilter {
    fn matches(&self, event: &PairProvisionedEvent) -> bool {
        event.event_type == self.event_type
    }
}

/// All inner filters must match.
pub struct AndFilter {
    /// Combined filters.
    pub filters: Vec<Box<dyn EventFilter>>,
}

impl EventFilter for AndFilter {
    fn matches(&self, event: &PairProvisionedEvent) -> bool {
        self.filters.iter().all(|f| f.matches(event))
    }
}

impl<F: EventFilter + ?Sized> EventFilter for &F {
    fn matches(&self, event: &PairProvisionedEvent) -> bool {
        (**self).matches(event)
    }
}
