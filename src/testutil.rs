//! Shared test harness: a scripted fake browser session.
//!
//! [`FakeBrowser`] implements both [`PageDriver`] and [`CaptureBackend`]
//! over one shared inner state, so pipeline tests can script which API
//! responses each page URL produces and observe the navigation sequence.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::capture::{CaptureBackend, CapturedEvent, EventStore};
use crate::config::{CrawlConfig, RetryPolicy};
use crate::error::{Error, Result};
use crate::identifiers::RequestId;
use crate::navigate::PageDriver;

// ============================================================================
// Config
// ============================================================================

/// Configuration with short waits suitable for tests.
pub(crate) fn test_config() -> CrawlConfig {
    CrawlConfig::builder()
        .target_date(NaiveDate::from_ymd_opt(2025, 4, 21).unwrap())
        .countries(["England"])
        .leagues(["Premier League"])
        .base_url("https://test.site")
        .poll_interval(Duration::from_millis(10))
        .correlation_timeout(Duration::from_millis(200))
        .settle_wait(Duration::from_millis(1))
        .retry(RetryPolicy::none())
        .build()
        .unwrap()
}

// ============================================================================
// FakeBrowser
// ============================================================================

/// One scripted API response a page serves.
struct ScriptEntry {
    path: String,
    body: Vec<u8>,
    /// Served once the page has been reloaded at least this many times.
    min_reloads: u32,
}

#[derive(Default)]
struct State {
    script: FxHashMap<String, Vec<Arc<ScriptEntry>>>,
    current_url: Option<String>,
    reload_count: u32,
    visited: Vec<String>,
}

#[derive(Default)]
struct Inner {
    state: Mutex<State>,
    store: EventStore,
    bodies: Mutex<FxHashMap<RequestId, Vec<u8>>>,
    next_id: AtomicU64,
}

/// Scripted browser session for pipeline tests.
#[derive(Clone, Default)]
pub(crate) struct FakeBrowser {
    inner: Arc<Inner>,
}

impl FakeBrowser {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Scripts `url` to produce a captured response for `path` on every
    /// load of the page.
    pub(crate) fn serve(&self, url: &str, path: &str, body: Value) {
        self.serve_after_reloads(url, path, body, 0);
    }

    /// Scripts a response that only appears once the page has been
    /// reloaded at least `min_reloads` times since navigation.
    pub(crate) fn serve_after_reloads(&self, url: &str, path: &str, body: Value, min_reloads: u32) {
        self.inner
            .state
            .lock()
            .script
            .entry(url.to_string())
            .or_default()
            .push(Arc::new(ScriptEntry {
                path: path.to_string(),
                body: serde_json::to_vec(&body).expect("scripted body serializes"),
                min_reloads,
            }));
    }

    /// Returns every URL navigated to, in order.
    pub(crate) fn visited(&self) -> Vec<String> {
        self.inner.state.lock().visited.clone()
    }

    fn emit_for_current_page(&self, reload_count: u32, exact: bool) {
        let entries: Vec<Arc<ScriptEntry>> = {
            let state = self.inner.state.lock();
            let Some(url) = state.current_url.as_deref() else {
                return;
            };
            state
                .script
                .get(url)
                .map(|entries| {
                    entries
                        .iter()
                        .filter(|e| {
                            if exact {
                                e.min_reloads == reload_count
                            } else {
                                e.min_reloads <= reload_count
                            }
                        })
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        };

        for entry in entries {
            let request_id =
                RequestId::new(format!("fake-{}", self.inner.next_id.fetch_add(1, Ordering::Relaxed)));
            self.inner
                .bodies
                .lock()
                .insert(request_id.clone(), entry.body.clone());
            self.inner
                .store
                .record(request_id, entry.path.clone(), "GET", "application/json");
        }
    }
}

// ============================================================================
// PageDriver Implementation
// ============================================================================

#[async_trait]
impl PageDriver for FakeBrowser {
    async fn goto(&self, url: &str) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            state.visited.push(url.to_string());
            state.current_url = Some(url.to_string());
            state.reload_count = 0;
        }
        self.emit_for_current_page(0, false);
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        let count = {
            let mut state = self.inner.state.lock();
            state.reload_count += 1;
            state.reload_count
        };
        // Entries newly unlocked by this reload; earlier ones were
        // already emitted and duplicates are tolerated upstream.
        self.emit_for_current_page(count, true);
        Ok(())
    }

    async fn dismiss(&self, _selector: &str) -> Result<bool> {
        Ok(false)
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        Ok(())
    }

    async fn scroll_to_top(&self) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// CaptureBackend Implementation
// ============================================================================

#[async_trait]
impl CaptureBackend for FakeBrowser {
    async fn snapshot(&self) -> Result<Vec<CapturedEvent>> {
        Ok(self.inner.store.snapshot())
    }

    async fn fetch_body(&self, request_id: &RequestId) -> Result<Vec<u8>> {
        self.inner
            .bodies
            .lock()
            .get(request_id)
            .cloned()
            .ok_or_else(|| Error::body_unavailable(request_id.clone()))
    }

    async fn clear(&self) {
        self.inner.store.clear();
        self.inner.bodies.lock().clear();
    }
}
