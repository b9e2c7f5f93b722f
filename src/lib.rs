//! matchform - traffic-capture driven football match crawler.
//!
//! This library drives a browser session against a sports-data site and
//! reconstructs, as structured records, the JSON payloads the site's own
//! backend API returns - without calling that API directly. It observes
//! the browser's network traffic (via an intercepting proxy or via the
//! browser's performance log), correlates observed events to known API
//! path patterns, and extracts the JSON response bodies.
//!
//! # Architecture
//!
//! Data flows bottom-up, control flows top-down:
//!
//! - **Capture backends** buffer observed network events per navigation
//! - The **correlator** matches a buffered event to an expected API path
//!   (exact equality, oldest wins) and retrieves its JSON body
//! - The **navigator** produces a stable page state to observe
//! - The **crawl pipeline** sequences Discover → PerMatchStandings →
//!   TeamInfo → HistoricalForm per match, applying domain filters and
//!   degrading gracefully on partial failure
//! - The **aggregator** holds the enriched result set
//!
//! The browser itself is an external collaborator: callers plug a live
//! session in behind [`PageDriver`] and either [`ProxyCapture`] (feed it
//! completed flows) or [`PerfLogCapture`] (give it a [`PerfLogSource`]).
//!
//! # Quick Start
//!
//! ```no_run
//! use matchform::{
//!     CrawlConfig, Crawler, PerfLogCapture, REFERENCE_COUNTRIES, REFERENCE_LEAGUES, Result,
//! };
//! use chrono::NaiveDate;
//!
//! # async fn example(
//! #     driver: impl matchform::PageDriver,
//! #     source: impl matchform::PerfLogSource,
//! # ) -> Result<()> {
//! let config = CrawlConfig::builder()
//!     .target_date(NaiveDate::from_ymd_opt(2025, 4, 21).unwrap())
//!     .countries(REFERENCE_COUNTRIES)
//!     .leagues(REFERENCE_LEAGUES)
//!     .build()?;
//!
//! let crawler = Crawler::new(driver, PerfLogCapture::new(source), config);
//! let results = crawler.run().await?;
//!
//! for row in results.flat_records() {
//!     println!("{row:?}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`aggregate`] | In-memory result set of a run |
//! | [`api`] | API path patterns and page URLs |
//! | [`capture`] | Captured events and the two capture backends |
//! | [`config`] | Crawl configuration and builder |
//! | [`correlate`] | Path correlation and the bounded poll loop |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`model`] | Typed match/form records |
//! | [`navigate`] | Navigation controller over a page driver |
//! | [`pipeline`] | The four-stage crawl state machine |

// ============================================================================
// Modules
// ============================================================================

/// In-memory result set of one crawl run.
pub mod aggregate;

/// API path patterns (exact-match correlation targets) and page URLs.
pub mod api;

/// Traffic capture: event buffer and the proxy / perf-log backends.
pub mod capture;

/// Crawl configuration and its builder.
pub mod config;

/// API response correlation.
pub mod correlate;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for captured traffic and domain entities.
pub mod identifiers;

/// Typed records produced by the pipeline.
pub mod model;

/// Navigation control over an external browser session.
pub mod navigate;

/// The four-stage crawl pipeline.
pub mod pipeline;

#[cfg(test)]
pub(crate) mod testutil;

// ============================================================================
// Re-exports
// ============================================================================

// Result set
pub use aggregate::Aggregator;

// Capture types
pub use capture::{
    CaptureBackend, CapturedEvent, EventStore, PerfLogCapture, PerfLogSource, ProxyCapture,
    ResponseFlow,
};

// Configuration
pub use config::{CrawlConfig, CrawlConfigBuilder, REFERENCE_COUNTRIES, REFERENCE_LEAGUES, RetryPolicy};

// Correlation
pub use correlate::Correlator;

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{MatchId, RequestId, TeamId};

// Record types
pub use model::{HistoricalRecord, Outcome, ScheduledMatch, TeamRef, Venue};

// Navigation
pub use navigate::{Navigator, PageDriver};

// Pipeline
pub use pipeline::Crawler;
