//! Append-only buffer of captured events.

// ============================================================================
// Imports
// ============================================================================

use chrono::Utc;
use parking_lot::Mutex;

use crate::identifiers::RequestId;

use super::CapturedEvent;

// ============================================================================
// EventStore
// ============================================================================

/// Thread-safe, time-ordered buffer of observed network events for the
/// current navigation window.
///
/// The proxy backend appends from the proxy's execution context while
/// the crawl driver snapshots from its own; the mutex is the only point
/// of contact, so the driver never sees partially-written state.
#[derive(Debug, Default)]
pub struct EventStore {
    events: Mutex<Vec<CapturedEvent>>,
}

impl EventStore {
    /// Creates an empty store.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new event, assigning its observation index.
    ///
    /// Returns a copy of the stored event.
    pub fn record(
        &self,
        request_id: RequestId,
        path: impl Into<String>,
        method: impl Into<String>,
        content_type: impl Into<String>,
    ) -> CapturedEvent {
        let mut events = self.events.lock();
        let event = CapturedEvent {
            request_id,
            path: path.into(),
            method: method.into(),
            content_type: content_type.into(),
            timestamp: Utc::now(),
            seq: events.len() as u64,
        };
        events.push(event.clone());
        event
    }

    /// Returns all events in observation order (oldest first).
    #[must_use]
    pub fn snapshot(&self) -> Vec<CapturedEvent> {
        self.events.lock().clone()
    }

    /// Returns the number of buffered events.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns `true` if no events are buffered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Drops all buffered events. Observation indices restart at zero.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

// ============================================================================
// Tests
// ============================================================================
