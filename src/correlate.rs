//! API response correlation.
//!
//! Correlation is the act of matching an observed network event to a
//! known, expected API path. Matching is exact string equality — never
//! substring, never regex — because the target paths are well-known REST
//! endpoints with identifiers embedded, and substring matching confuses
//! `/api/v1/event/123` with `/api/v1/event/1234`.
//!
//! [`Correlator::await_json`] is the crate's single waiting primitive: a
//! bounded poll-until-present loop that succeeds as soon as a matching
//! event appears, instead of sleeping a fixed guess and hoping.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::capture::{CaptureBackend, CapturedEvent};
use crate::error::{Error, Result};

// ============================================================================
// Matching
// ============================================================================

/// Finds the event whose path equals `target`, by exact string equality.
///
/// Tie-break: the first match in snapshot order (oldest observed) wins.
/// Duplicates are expected after forced reloads and are not an error.
#[must_use]
pub fn find_match<'a>(snapshot: &'a [CapturedEvent], target: &str) -> Option<&'a CapturedEvent> {
    snapshot.iter().find(|event| event.path == target)
}

/// Parses a retrieved body as JSON.
///
/// # Errors
///
/// Returns [`Error::MalformedJson`] when the bytes do not parse —
/// distinct from [`Error::BodyUnavailable`], which means the bytes could
/// not be retrieved at all.
pub fn parse_body(bytes: &[u8], path: &str) -> Result<Value> {
    serde_json::from_slice(bytes).map_err(|err| Error::malformed_json(path, err.to_string()))
}

// ============================================================================
// Field Extraction
// ============================================================================

/// Extracts a string field by JSON pointer.
///
/// # Errors
///
/// Returns [`Error::MissingField`] when absent or not a string.
pub fn require_str<'a>(value: &'a Value, pointer: &str, path: &str) -> Result<&'a str> {
    value
        .pointer(pointer)
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::missing_field(path, pointer))
}

/// Extracts an unsigned integer field by JSON pointer.
///
/// # Errors
///
/// Returns [`Error::MissingField`] when absent or not an integer.
pub fn require_u64(value: &Value, pointer: &str, path: &str) -> Result<u64> {
    value
        .pointer(pointer)
        .and_then(|v| v.as_u64())
        .ok_or_else(|| Error::missing_field(path, pointer))
}

/// Extracts a `u32` field by JSON pointer.
///
/// # Errors
///
/// Returns [`Error::MissingField`] when absent, not an integer, or out
/// of `u32` range — an out-of-range value is as unusable as a missing
/// one, never silently truncated.
pub fn require_u32(value: &Value, pointer: &str, path: &str) -> Result<u32> {
    let raw = require_u64(value, pointer, path)?;
    u32::try_from(raw).map_err(|_| Error::missing_field(path, pointer))
}

// ============================================================================
// Correlator
// ============================================================================

/// Polls a capture backend until an expected path appears, then fetches
/// and parses its body.
pub struct Correlator<'a, C: CaptureBackend + ?Sized> {
    capture: &'a C,
    poll_interval: Duration,
    timeout: Duration,
}

impl<'a, C: CaptureBackend + ?Sized> Correlator<'a, C> {
    /// Creates a correlator over a capture backend.
    #[inline]
    #[must_use]
    pub fn new(capture: &'a C, poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            capture,
            poll_interval,
            timeout,
        }
    }

    /// Waits for an event whose path equals `path`, then retrieves and
    /// parses its JSON body.
    ///
    /// The body is fetched immediately once a match appears: the
    /// perf-log backend's buffer evicts quickly, so deferring the fetch
    /// loses bodies.
    ///
    /// # Errors
    ///
    /// - [`Error::CorrelationMiss`] when no match appears in time
    /// - [`Error::BodyUnavailable`] when the match's body is gone
    ///   (treated like a miss by the pipeline; an evicted body does not
    ///   come back, so there is no point polling on)
    /// - [`Error::MalformedJson`] when the body does not parse
    pub async fn await_json(&self, path: &str) -> Result<Value> {
        let started = Instant::now();

        loop {
            let snapshot = self.capture.snapshot().await?;

            if let Some(event) = find_match(&snapshot, path) {
                debug!(
                    path = %path,
                    request_id = %event.request_id,
                    seq = event.seq,
                    waited_ms = started.elapsed().as_millis() as u64,
                    "Correlated API response"
                );
                let body = self.capture.fetch_body(&event.request_id).await?;
                return parse_body(&body, path);
            }

            let waited = started.elapsed();
            if waited >= self.timeout {
                return Err(Error::correlation_miss(path, waited.as_millis() as u64));
            }

            trace!(path = %path, observed = snapshot.len(), "No match yet, polling");
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
