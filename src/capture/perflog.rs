//! Performance-log polling capture backend.
//!
//! The browser keeps an internal log of network events; each
//! [`snapshot`](super::CaptureBackend::snapshot) pulls the entries added
//! since the last poll through a [`PerfLogSource`], decodes them and
//! appends them to the session buffer.
//!
//! Bodies are not in the log. [`fetch_body`](super::CaptureBackend::fetch_body)
//! is a live call into the browser's response-retrieval facility, which
//! fails once the response has been evicted from the browser's buffer —
//! that happens quickly, so the correlator fetches immediately after a
//! match is found rather than deferring.
//!
//! # Entry format
//!
//! Entries are devtools-style JSON. The path comes from the `:path`
//! pseudo-header, the request token from `params.requestId`:
//!
//! ```json
//! {"message": {"params": {"requestId": "1000012345.67",
//!   "headers": {":path": "/api/v1/event/111", ":method": "GET"}}}}
//! ```
//!
//! Entries without a `:path` header (connection events, pushes, console
//! noise) are skipped, not errors.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::identifiers::RequestId;

use super::{CaptureBackend, CapturedEvent, EventStore};

// ============================================================================
// PerfLogSource
// ============================================================================

/// The browser facilities this backend polls, specified at the
/// interface: a real implementation wraps the live browser session.
#[async_trait]
pub trait PerfLogSource: Send + Sync {
    /// Returns the log entries added since the previous call.
    async fn drain(&self) -> Result<Vec<Value>>;

    /// Retrieves a response body by request token.
    ///
    /// # Errors
    ///
    /// Fails when the browser has evicted the response.
    async fn response_body(&self, request_id: &RequestId) -> Result<String>;
}

// ============================================================================
// PerfLogCapture
// ============================================================================

/// Capture backend that polls the browser's performance log.
#[derive(Debug)]
pub struct PerfLogCapture<S> {
    source: S,
    store: EventStore,
}

impl<S: PerfLogSource> PerfLogCapture<S> {
    /// Creates a capture backend over a performance-log source.
    #[must_use]
    pub fn new(source: S) -> Self {
        Self {
            source,
            store: EventStore::new(),
        }
    }
}

// ============================================================================
// CaptureBackend Implementation
// ============================================================================

#[async_trait]
impl<S: PerfLogSource> CaptureBackend for PerfLogCapture<S> {
    async fn snapshot(&self) -> Result<Vec<CapturedEvent>> {
        let entries = self.source.drain().await?;
        let mut decoded = 0usize;

        for entry in &entries {
            if let Some(event) = decode_entry(entry) {
                self.store
                    .record(event.request_id, event.path, event.method, event.content_type);
                decoded += 1;
            }
        }

        if !entries.is_empty() {
            debug!(
                drained = entries.len(),
                decoded,
                buffered = self.store.len(),
                "Polled performance log"
            );
        }

        Ok(self.store.snapshot())
    }

    async fn fetch_body(&self, request_id: &RequestId) -> Result<Vec<u8>> {
        match self.source.response_body(request_id).await {
            Ok(body) => Ok(body.into_bytes()),
            Err(err) => {
                trace!(%request_id, error = %err, "Response body retrieval failed");
                Err(Error::body_unavailable(request_id.clone()))
            }
        }
    }

    async fn clear(&self) {
        // The browser may have logged entries for the previous page that
        // were never drained; pull and drop them so they cannot leak into
        // the next navigation window.
        if let Err(err) = self.source.drain().await {
            debug!(error = %err, "Discarding undrained log entries failed");
        }
        self.store.clear();
    }
}

// ============================================================================
// Entry Decoding
// ============================================================================

/// Decoded fields of one log entry.
struct DecodedEntry {
    request_id: RequestId,
    path: String,
    method: String,
    content_type: String,
}

/// Decodes a performance-log entry to an event, or `None` for entries
/// that carry no `:path` pseudo-header or request token.
fn decode_entry(entry: &Value) -> Option<DecodedEntry> {
    // Entries arrive either wrapped ({"message": {"params": ...}}) or
    // already unwrapped, depending on the source.
    let params = entry
        .pointer("/message/params")
        .or_else(|| entry.get("params"))?;

    let headers = params.get("headers")?;
    let path = headers.get(":path")?.as_str()?.to_string();
    let request_id = params.get("requestId")?.as_str()?;

    let method = headers
        .get(":method")
        .and_then(|v| v.as_str())
        .unwrap_or("GET")
        .to_string();

    let content_type = headers
        .get("content-type")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    Some(DecodedEntry {
        request_id: RequestId::new(request_id),
        path,
        method,
        content_type,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use parking_lot::Mutex;
    use serde_json::json;

    /// Source serving scripted entry batches, one per drain call.
    #[derive(Default)]
    struct ScriptedSource {
        batches: Mutex<Vec<Vec<Value>>>,
        bodies: Mutex<Vec<(RequestId, String)>>,
    }

    #[async_trait]
    impl PerfLogSource for ScriptedSource {
        async fn drain(&self) -> Result<Vec<Value>> {
            let mut batches = self.batches.lock();
            if batches.is_empty() {
                Ok(Vec::new())
            } else {
                Ok(batches.remove(0))
            }
        }

        async fn response_body(&self, request_id: &RequestId) -> Result<String> {
            self.bodies
                .lock()
                .iter()
                .find(|(id, _)| id == request_id)
                .map(|(_, body)| body.clone())
                .ok_or_else(|| Error::body_unavailable(request_id.clone()))
        }
    }

    fn entry(request_id: &str, path: &str) -> Value {
        json!({
            "message": {
                "params": {
                    "requestId": request_id,
                    "headers": { ":path": path, ":method": "GET" }
                }
            }
        })
    }

    #[tokio::test]
    async fn test_snapshot_accumulates_across_polls() {
        let source = ScriptedSource::default();
        source.batches.lock().extend([
            vec![entry("1.1", "/api/v1/event/111")],
            vec![entry("1.2", "/api/v1/event/111/pregame-form")],
        ]);
        let capture = PerfLogCapture::new(source);

        let first = capture.snapshot().await.unwrap();
        assert_eq!(first.len(), 1);

        let second = capture.snapshot().await.unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(second[0].path, "/api/v1/event/111");
        assert_eq!(second[1].path, "/api/v1/event/111/pregame-form");
    }

    #[tokio::test]
    async fn test_entries_without_path_skipped() {
        let source = ScriptedSource::default();
        source.batches.lock().push(vec![
            json!({"message": {"params": {"requestId": "1.1"}}}),
            json!({"other": true}),
            entry("1.2", "/api/v1/event/7"),
        ]);
        let capture = PerfLogCapture::new(source);

        let snapshot = capture.snapshot().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].request_id, RequestId::new("1.2"));
    }

    #[tokio::test]
    async fn test_unwrapped_entry_form_decodes() {
        let source = ScriptedSource::default();
        source.batches.lock().push(vec![json!({
            "params": {
                "requestId": "9.9",
                "headers": { ":path": "/api/v1/team/42/performance" }
            }
        })]);
        let capture = PerfLogCapture::new(source);

        let snapshot = capture.snapshot().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].method, "GET");
    }

    #[tokio::test]
    async fn test_fetch_body_maps_eviction_to_body_unavailable() {
        let source = ScriptedSource::default();
        source
            .bodies
            .lock()
            .push((RequestId::new("1.1"), "{}".to_string()));
        let capture = PerfLogCapture::new(source);

        assert_eq!(
            capture.fetch_body(&RequestId::new("1.1")).await.unwrap(),
            b"{}"
        );

        let err = capture
            .fetch_body(&RequestId::new("evicted"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BodyUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_clear_drops_buffer() {
        let source = ScriptedSource::default();
        source
            .batches
            .lock()
            .push(vec![entry("1.1", "/api/v1/event/1")]);
        let capture = PerfLogCapture::new(source);

        capture.snapshot().await.unwrap();
        capture.clear().await;
        assert!(capture.snapshot().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_discards_undrained_backlog() {
        let source = ScriptedSource::default();
        // Logged during the previous page, never drained.
        source
            .batches
            .lock()
            .push(vec![entry("1.1", "/api/v1/event/111/pregame-form")]);
        let capture = PerfLogCapture::new(source);

        capture.clear().await;

        // The first poll of the new navigation window must not surface
        // the previous page's entry.
        assert!(capture.snapshot().await.unwrap().is_empty());
    }
}
