//! Intercepting-proxy capture backend.
//!
//! An intercepting proxy sits between the browser and the internet and
//! invokes [`ProxyCapture::on_response`] synchronously for every flow it
//! completes. The handler runs on the proxy's execution context, not the
//! crawl driver's; the shared [`EventStore`] and the body cache are the
//! only points of contact.
//!
//! Unlike the perf-log backend, response bodies arrive with the flow and
//! are cached inline, so [`fetch_body`](super::CaptureBackend::fetch_body)
//! never races the browser's buffer eviction.

// ============================================================================
// Imports
// ============================================================================

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::RequestId;

use super::{CaptureBackend, CapturedEvent, EventStore};

// ============================================================================
// ResponseFlow
// ============================================================================

/// One completed HTTP flow as reported by the proxy.
#[derive(Debug, Clone)]
pub struct ResponseFlow {
    /// Full request URL.
    pub url: String,
    /// HTTP method.
    pub method: String,
    /// Response status code.
    pub status: u16,
    /// Response content type, empty when absent.
    pub content_type: String,
    /// Response body bytes.
    pub body: Vec<u8>,
}

// ============================================================================
// ProxyCapture
// ============================================================================

/// Capture backend fed by an intercepting proxy.
///
/// Flows are filtered by an optional URL substring and by JSON content
/// type before being stored; everything else on the page (images,
/// scripts, analytics) never enters the buffer.
#[derive(Debug, Default)]
pub struct ProxyCapture {
    /// Substring a flow URL must contain to be stored.
    url_filter: Option<String>,
    /// Shared event buffer.
    store: EventStore,
    /// Inline body cache keyed by assigned request id.
    bodies: Mutex<FxHashMap<RequestId, Vec<u8>>>,
    /// Source for assigned request ids.
    next_id: AtomicU64,
}

impl ProxyCapture {
    /// Creates a capture backend storing every JSON flow.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a capture backend storing only flows whose URL contains
    /// the given substring.
    #[must_use]
    pub fn with_url_filter(filter: impl Into<String>) -> Self {
        Self {
            url_filter: Some(filter.into()),
            ..Self::default()
        }
    }

    /// Response handler, invoked by the proxy for every completed flow.
    ///
    /// Safe to call from the proxy's own thread or task; appends through
    /// the thread-safe store.
    pub fn on_response(&self, flow: ResponseFlow) {
        if let Some(filter) = &self.url_filter
            && !flow.url.contains(filter.as_str())
        {
            return;
        }

        if !flow.content_type.starts_with("application/json") {
            return;
        }

        let path = match Url::parse(&flow.url) {
            Ok(url) => url.path().to_string(),
            Err(err) => {
                warn!(url = %flow.url, error = %err, "Dropping flow with unparseable URL");
                return;
            }
        };

        let request_id = RequestId::new(format!("proxy-{}", self.next_id.fetch_add(1, Ordering::Relaxed)));

        debug!(
            %request_id,
            path = %path,
            status = flow.status,
            body_len = flow.body.len(),
            "Captured JSON flow"
        );

        self.bodies.lock().insert(request_id.clone(), flow.body);
        self.store
            .record(request_id, path, flow.method, flow.content_type);
    }
}

// ============================================================================
// CaptureBackend Implementation
// ============================================================================

#[async_trait]
impl CaptureBackend for ProxyCapture {
    async fn snapshot(&self) -> Result<Vec<CapturedEvent>> {
        Ok(self.store.snapshot())
    }

    async fn fetch_body(&self, request_id: &RequestId) -> Result<Vec<u8>> {
        self.bodies
            .lock()
            .get(request_id)
            .cloned()
            .ok_or_else(|| Error::body_unavailable(request_id.clone()))
    }

    async fn clear(&self) {
        self.store.clear();
        self.bodies.lock().clear();
    }
}

// ============================================================================
// Tests
// ============================================================================
