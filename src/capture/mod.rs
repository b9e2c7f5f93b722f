//! Traffic capture: observed network events and the backends that
//! produce them.
//!
//! # Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | `store` | Append-only FIFO buffer of captured events |
//! | `proxy` | Intercepting-proxy backend, bodies cached inline |
//! | `perflog` | Browser performance-log polling backend |
//!
//! Both backends expose the same [`CaptureBackend`] contract; the
//! pipeline never knows which one it is driving. The backend is chosen
//! at construction time, not by feature flags.

// ============================================================================
// Submodules
// ============================================================================

pub mod perflog;
pub mod proxy;
pub mod store;

// ============================================================================
// Re-exports
// ============================================================================

pub use perflog::{PerfLogCapture, PerfLogSource};
pub use proxy::{ProxyCapture, ResponseFlow};
pub use store::EventStore;

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::identifiers::RequestId;

// ============================================================================
// CapturedEvent
// ============================================================================

/// One observed network event within the current navigation window.
///
/// Immutable once recorded. `seq` is the observation index assigned by
/// the [`EventStore`] (FIFO by arrival); the correlator's oldest-wins
/// tie-break relies on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedEvent {
    /// Opaque per-session request token.
    pub request_id: RequestId,
    /// URL path only, no host or query.
    pub path: String,
    /// HTTP method.
    pub method: String,
    /// Response content type, empty when unknown.
    pub content_type: String,
    /// Wall-clock time of observation.
    pub timestamp: DateTime<Utc>,
    /// Observation index within the capture session.
    pub seq: u64,
}

// ============================================================================
// CaptureBackend
// ============================================================================

/// Contract shared by the two capture backends.
///
/// A backend owns session-local buffers only; nothing is shared across
/// sessions. `snapshot` returns events in observation order.
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Returns all events observed so far, oldest first.
    ///
    /// The perf-log backend drains new browser log entries as a side
    /// effect of this call.
    async fn snapshot(&self) -> Result<Vec<CapturedEvent>>;

    /// Retrieves the raw response body for a captured event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BodyUnavailable`](crate::Error::BodyUnavailable)
    /// when the underlying transport cannot locate the id. For the
    /// perf-log backend this happens quickly once the browser evicts the
    /// response, so callers fetch promptly after a match is found.
    async fn fetch_body(&self, request_id: &RequestId) -> Result<Vec<u8>>;

    /// Drops all buffered events (and cached bodies, where applicable).
    ///
    /// Called before every navigation so a correlation can never match a
    /// stale event left over from the previous page. Backends fed by an
    /// external log also discard entries the source has produced but not
    /// yet drained — those belong to the previous page too.
    async fn clear(&self);
}
