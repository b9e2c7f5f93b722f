//! Navigation control: driving the browser to a stable page state.
//!
//! The browser itself is an external collaborator behind the
//! [`PageDriver`] trait; this module only sequences its primitives.
//! [`Navigator`] never inspects network data — it exists purely to
//! produce a stable page state for the capture and correlation layers
//! to observe.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::capture::CaptureBackend;
use crate::error::Result;

// ============================================================================
// PageDriver
// ============================================================================

/// The DOM-facing primitives the crawl needs from a browser session.
///
/// Implementations wrap a live browser (webdriver, devtools protocol, a
/// remote automation service). All methods operate on the single shared
/// viewport, so callers keep them strictly sequential.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigates to a URL.
    ///
    /// # Errors
    ///
    /// Implementations return
    /// [`Error::Navigation`](crate::Error::Navigation) on transport-level
    /// failures (timeout, DNS, crashed session).
    async fn goto(&self, url: &str) -> Result<()>;

    /// Reloads the current page.
    async fn reload(&self) -> Result<()>;

    /// Clicks the element matching `selector` if present.
    ///
    /// Returns `Ok(false)` when no such element exists — absence of a
    /// popup is not an error.
    async fn dismiss(&self, selector: &str) -> Result<bool>;

    /// Scrolls to the bottom of the page.
    async fn scroll_to_bottom(&self) -> Result<()>;

    /// Scrolls to the top of the page.
    async fn scroll_to_top(&self) -> Result<()>;
}

// ============================================================================
// Navigator
// ============================================================================

/// Sequences navigation, popup dismissal and settling for one browser
/// session and its capture buffer.
pub struct Navigator<D, C: ?Sized> {
    driver: D,
    capture: Arc<C>,
    popup_selectors: Vec<String>,
    settle_wait: Duration,
}

impl<D: PageDriver, C: CaptureBackend + ?Sized> Navigator<D, C> {
    /// Creates a navigator over a page driver and its capture backend.
    #[must_use]
    pub fn new(
        driver: D,
        capture: Arc<C>,
        popup_selectors: Vec<String>,
        settle_wait: Duration,
    ) -> Self {
        Self {
            driver,
            capture,
            popup_selectors,
            settle_wait,
        }
    }

    /// Navigates to a URL.
    ///
    /// The capture buffer is cleared first, so a later correlation can
    /// never match a stale event left over from the previous page.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Navigation`](crate::Error::Navigation) on
    /// transport-level failure.
    pub async fn open(&self, url: &str) -> Result<()> {
        info!(url = %url, "Navigating");
        self.capture.clear().await;
        self.driver.goto(url).await
    }

    /// Dismisses the configured interstitial popups, best-effort.
    ///
    /// Absence of a popup is expected and logged at debug only; even a
    /// driver failure here never fails the stage.
    pub async fn dismiss_popups(&self) {
        for selector in &self.popup_selectors {
            match self.driver.dismiss(selector).await {
                Ok(true) => info!(selector = %selector, "Popup dismissed"),
                Ok(false) => debug!(selector = %selector, "Popup not present"),
                Err(err) => debug!(selector = %selector, error = %err, "Popup dismissal failed"),
            }
        }
    }

    /// Brings the page to a stable state for observation.
    ///
    /// Optionally forces a full reload, then scrolls to the bottom and
    /// back to the top — the page lazy-loads and fires API calls on
    /// scroll — and waits a minimum settle duration. The actual waiting
    /// for specific traffic happens in the correlator's poll loop; this
    /// wait only debounces the scroll-triggered fetches.
    pub async fn settle(&self, force_reload: bool) -> Result<()> {
        if force_reload {
            debug!("Forcing page reload");
            self.driver.reload().await?;
        }

        self.driver.scroll_to_bottom().await?;
        self.driver.scroll_to_top().await?;

        tokio::time::sleep(self.settle_wait).await;
        Ok(())
    }

    /// Like [`settle`](Self::settle), but a scroll failure is reported
    /// and swallowed: traffic may already be captured even when the
    /// viewport misbehaves, and the correlator will decide.
    pub async fn settle_lenient(&self, force_reload: bool) {
        if let Err(err) = self.settle(force_reload).await {
            warn!(error = %err, "Settle sequence failed, correlating anyway");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
