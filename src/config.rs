//! Crawl configuration and its builder.
//!
//! Provides a fluent API for configuring a crawl run.
//!
//! # Example
//!
//! ```no_run
//! use matchform::CrawlConfig;
//! use chrono::NaiveDate;
//!
//! # fn example() -> matchform::Result<()> {
//! let config = CrawlConfig::builder()
//!     .target_date(NaiveDate::from_ymd_opt(2025, 4, 21).unwrap())
//!     .countries(["England", "Spain"])
//!     .leagues(["Premier League", "LaLiga"])
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use chrono::{FixedOffset, NaiveDate};
use rustc_hash::FxHashSet;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Countries tracked by the reference crawl.
pub const REFERENCE_COUNTRIES: [&str; 10] = [
    "England",
    "Spain",
    "Italy",
    "Germany",
    "France",
    "Netherlands",
    "Türkiye",
    "Portugal",
    "Belgium",
    "Scotland",
];

/// Club leagues tracked by the reference crawl.
pub const REFERENCE_LEAGUES: [&str; 15] = [
    "Premier League",
    "LaLiga",
    "Serie A",
    "Bundesliga",
    "Ligue 1",
    "Eredivisie",
    "Super Lig",
    "LaLiga 2",
    "Championship",
    "2.Bundesliga",
    "Serie B",
    "Ligue 2",
    "Liga Portugal Betclic",
    "First Division A",
    "Premiership",
];

/// Default site base URL.
const DEFAULT_BASE_URL: &str = "https://www.sofascore.com";

/// Default interval between capture snapshot polls.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Default bound on one poll-until-correlated cycle.
const DEFAULT_CORRELATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Default minimum wait after scrolls for lazy-loaded fetches.
const DEFAULT_SETTLE_WAIT: Duration = Duration::from_secs(1);

/// Default reference timezone offset (UTC+3, no DST).
const DEFAULT_KICKOFF_OFFSET_SECS: i32 = 3 * 3600;

/// Default cap on historical records per team per match.
const DEFAULT_HISTORY_CAP: usize = 4;

/// Popup close buttons dismissed best-effort on match and team pages.
const DEFAULT_POPUP_SELECTORS: [&str; 2] = ["button.Button.pBEmc", "button.Button.gTStrj"];

// ============================================================================
// RetryPolicy
// ============================================================================

/// Bounded retry policy applied around the settle-and-correlate cycle of
/// the per-match stages.
///
/// The whole cycle (forced reload, settle, poll until correlated) is one
/// attempt; between attempts the driver sleeps `backoff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Never zero.
    pub max_attempts: u32,
    /// Sleep between attempts.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Single attempt, no retry. Reproduces the reference behavior.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    /// Retries with a fixed backoff.
    #[inline]
    #[must_use]
    pub fn fixed(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

// ============================================================================
// CrawlConfig
// ============================================================================

/// Validated configuration for one crawl run.
///
/// Use [`CrawlConfig::builder()`] to construct.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Calendar date whose matches are crawled, in the reference timezone.
    pub target_date: NaiveDate,
    /// Whitelist applied to tournament category country names.
    pub countries: FxHashSet<String>,
    /// Whitelist applied to tournament names.
    pub leagues: FxHashSet<String>,
    /// Fixed offset used to localize kickoff timestamps.
    pub kickoff_offset: FixedOffset,
    /// Site base URL, no trailing slash.
    pub base_url: String,
    /// CSS selectors of interstitial popups dismissed best-effort.
    pub popup_selectors: Vec<String>,
    /// Interval between capture snapshot polls.
    pub poll_interval: Duration,
    /// Bound on one poll-until-correlated cycle.
    pub correlation_timeout: Duration,
    /// Minimum wait after the scroll sequence.
    pub settle_wait: Duration,
    /// Retry policy for stages 2-4. Discover never retries.
    pub retry: RetryPolicy,
    /// Hard cap on historical records per team per match.
    pub history_cap: usize,
    /// Also crawl the away team's historical form.
    pub track_away_form: bool,
    /// Overall run deadline, `None` for unbounded.
    pub run_deadline: Option<Duration>,
}

impl CrawlConfig {
    /// Creates a new configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> CrawlConfigBuilder {
        CrawlConfigBuilder::new()
    }
}

// ============================================================================
// CrawlConfigBuilder
// ============================================================================

/// Builder for [`CrawlConfig`].
#[derive(Debug, Default, Clone)]
pub struct CrawlConfigBuilder {
    target_date: Option<NaiveDate>,
    countries: Vec<String>,
    leagues: Vec<String>,
    kickoff_offset: Option<FixedOffset>,
    base_url: Option<String>,
    popup_selectors: Option<Vec<String>>,
    poll_interval: Option<Duration>,
    correlation_timeout: Option<Duration>,
    settle_wait: Option<Duration>,
    retry: Option<RetryPolicy>,
    history_cap: Option<usize>,
    track_away_form: bool,
    run_deadline: Option<Duration>,
}

impl CrawlConfigBuilder {
    /// Creates a new builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the target date. Required.
    #[inline]
    #[must_use]
    pub fn target_date(mut self, date: NaiveDate) -> Self {
        self.target_date = Some(date);
        self
    }

    /// Sets the allowed country names.
    #[inline]
    #[must_use]
    pub fn countries<I, S>(mut self, countries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.countries = countries.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the allowed league names.
    #[inline]
    #[must_use]
    pub fn leagues<I, S>(mut self, leagues: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.leagues = leagues.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the fixed offset used to localize kickoff timestamps.
    ///
    /// Defaults to UTC+3, the reference timezone.
    #[inline]
    #[must_use]
    pub fn kickoff_offset(mut self, offset: FixedOffset) -> Self {
        self.kickoff_offset = Some(offset);
        self
    }

    /// Sets the site base URL. A trailing slash is stripped.
    #[inline]
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Replaces the popup selector list.
    #[inline]
    #[must_use]
    pub fn popup_selectors<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.popup_selectors = Some(selectors.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the capture snapshot poll interval.
    #[inline]
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Sets the bound on one poll-until-correlated cycle.
    #[inline]
    #[must_use]
    pub fn correlation_timeout(mut self, timeout: Duration) -> Self {
        self.correlation_timeout = Some(timeout);
        self
    }

    /// Sets the minimum settle wait after the scroll sequence.
    #[inline]
    #[must_use]
    pub fn settle_wait(mut self, wait: Duration) -> Self {
        self.settle_wait = Some(wait);
        self
    }

    /// Sets the retry policy for stages after Discover.
    #[inline]
    #[must_use]
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Sets the cap on historical records per team per match.
    #[inline]
    #[must_use]
    pub fn history_cap(mut self, cap: usize) -> Self {
        self.history_cap = Some(cap);
        self
    }

    /// Also crawls the away team's historical form.
    #[inline]
    #[must_use]
    pub fn track_away_form(mut self, enabled: bool) -> Self {
        self.track_away_form = enabled;
        self
    }

    /// Sets an overall deadline for the whole run.
    #[inline]
    #[must_use]
    pub fn run_deadline(mut self, deadline: Duration) -> Self {
        self.run_deadline = Some(deadline);
        self
    }

    /// Builds the configuration with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the target date is not set
    /// - [`Error::Config`] if a filter set is empty
    /// - [`Error::Config`] if the history cap is zero
    pub fn build(self) -> Result<CrawlConfig> {
        let target_date = self.target_date.ok_or_else(|| {
            Error::config(
                "Target date is required. Use .target_date() to set it.\n\
                 Example: CrawlConfig::builder().target_date(date)",
            )
        })?;

        if self.countries.is_empty() {
            return Err(Error::config(
                "Country whitelist is empty. Use .countries() to set it; \
                 see REFERENCE_COUNTRIES for the reference set.",
            ));
        }

        if self.leagues.is_empty() {
            return Err(Error::config(
                "League whitelist is empty. Use .leagues() to set it; \
                 see REFERENCE_LEAGUES for the reference set.",
            ));
        }

        let history_cap = self.history_cap.unwrap_or(DEFAULT_HISTORY_CAP);
        if history_cap == 0 {
            return Err(Error::config("History cap must be at least 1."));
        }

        let kickoff_offset = match self.kickoff_offset {
            Some(offset) => offset,
            None => FixedOffset::east_opt(DEFAULT_KICKOFF_OFFSET_SECS)
                .ok_or_else(|| Error::config("Default kickoff offset out of range"))?,
        };

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(CrawlConfig {
            target_date,
            countries: self.countries.into_iter().collect(),
            leagues: self.leagues.into_iter().collect(),
            kickoff_offset,
            base_url,
            popup_selectors: self.popup_selectors.unwrap_or_else(|| {
                DEFAULT_POPUP_SELECTORS
                    .iter()
                    .map(|s| (*s).to_string())
                    .collect()
            }),
            poll_interval: self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL),
            correlation_timeout: self
                .correlation_timeout
                .unwrap_or(DEFAULT_CORRELATION_TIMEOUT),
            settle_wait: self.settle_wait.unwrap_or(DEFAULT_SETTLE_WAIT),
            retry: self.retry.unwrap_or_default(),
            history_cap,
            track_away_form: self.track_away_form,
            run_deadline: self.run_deadline,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
