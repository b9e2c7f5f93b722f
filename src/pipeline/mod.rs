//! The multi-stage crawl pipeline.
//!
//! A four-stage state machine drives the navigator and correlator in
//! sequence per entity:
//!
//! | Stage | Module | Scope | Failure |
//! |-------|--------|-------|---------|
//! | Discover | `discover` | once per run | fatal |
//! | PerMatchStandings | `standings` | per match | degrade ranks |
//! | TeamInfo | `teams` | per match | skip historical form |
//! | HistoricalForm | `history` | per match per tracked side | degrade records |
//!
//! Every navigation and correlation attempt is independently fallible;
//! failures after Discover are caught at the stage boundary, logged with
//! URL / expected path / match id, and degrade the record instead of
//! unwinding the run.

// ============================================================================
// Submodules
// ============================================================================

mod discover;
mod history;
mod standings;
mod teams;

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tracing::{info, warn};

use crate::aggregate::Aggregator;
use crate::capture::CaptureBackend;
use crate::config::CrawlConfig;
use crate::correlate::Correlator;
use crate::error::{Error, Result};
use crate::model::Venue;
use crate::navigate::{Navigator, PageDriver};

// ============================================================================
// Crawler
// ============================================================================

/// Drives one browser session through the four crawl stages and
/// accumulates the result set.
///
/// Strictly sequential: one navigation or correlation in flight at a
/// time, because every stage operates against the single shared viewport
/// and the single capture buffer.
pub struct Crawler<D, C: CaptureBackend> {
    nav: Navigator<D, C>,
    capture: Arc<C>,
    config: CrawlConfig,
}

impl<D: PageDriver, C: CaptureBackend> Crawler<D, C> {
    /// Creates a crawler over a page driver and a capture backend.
    #[must_use]
    pub fn new(driver: D, capture: C, config: CrawlConfig) -> Self {
        let capture = Arc::new(capture);
        let nav = Navigator::new(
            driver,
            Arc::clone(&capture),
            config.popup_selectors.clone(),
            config.settle_wait,
        );

        Self {
            nav,
            capture,
            config,
        }
    }

    /// Runs the full crawl.
    ///
    /// # Errors
    ///
    /// - any Discover-stage failure (no matches can be found without it)
    /// - [`Error::Timeout`] when the configured run deadline elapses
    pub async fn run(&self) -> Result<Aggregator> {
        match self.config.run_deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.run_inner())
                .await
                .map_err(|_| Error::timeout("crawl run", deadline.as_millis() as u64))?,
            None => self.run_inner().await,
        }
    }

    async fn run_inner(&self) -> Result<Aggregator> {
        let mut aggregator = Aggregator::new();

        let matches = self.discover().await?;
        info!(count = matches.len(), "Discover stage complete");

        for mut record in matches {
            let match_id = record.match_id;

            if let Err(err) = self.attach_standings(&mut record).await {
                warn!(%match_id, error = %err, "Standings degraded, ranks left unset");
            }

            match self.attach_team_refs(&mut record).await {
                Ok(()) => {
                    self.crawl_history(&mut record, Venue::Home).await;
                    if self.config.track_away_form {
                        self.crawl_history(&mut record, Venue::Away).await;
                    }
                }
                Err(err) => {
                    // Historical form has a hard dependency on team
                    // identity; keep whatever was gathered so far.
                    warn!(%match_id, error = %err, "Team info unavailable, skipping historical form");
                }
            }

            aggregator.push(record);
        }

        info!(count = aggregator.len(), "Crawl complete");
        Ok(aggregator)
    }

    /// Correlator configured from this crawl's poll settings.
    pub(crate) fn correlator(&self) -> Correlator<'_, C> {
        Correlator::new(
            self.capture.as_ref(),
            self.config.poll_interval,
            self.config.correlation_timeout,
        )
    }

    /// Runs one settle-and-correlate cycle, retried per the configured
    /// policy. Each attempt forces a reload before polling.
    pub(crate) async fn settle_and_correlate(&self, path: &str) -> Result<serde_json::Value> {
        let retry = self.config.retry;
        let mut attempt = 1u32;

        loop {
            self.nav.settle_lenient(true).await;

            match self.correlator().await_json(path).await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < retry.max_attempts && err.is_recoverable() => {
                    warn!(
                        path = %path,
                        attempt,
                        max_attempts = retry.max_attempts,
                        error = %err,
                        "Correlation attempt failed, retrying"
                    );
                    tokio::time::sleep(retry.backoff).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    #[inline]
    pub(crate) fn nav(&self) -> &Navigator<D, C> {
        &self.nav
    }

    #[inline]
    pub(crate) fn config(&self) -> &CrawlConfig {
        &self.config
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use serde_json::json;

    use crate::api;
    use crate::config::RetryPolicy;
    use crate::identifiers::{MatchId, TeamId};
    use crate::model::{Outcome, Venue};
    use crate::testutil::{FakeBrowser, test_config};

    fn schedule_body() -> serde_json::Value {
        json!({
            "events": [{
                "tournament": {
                    "name": "Premier League",
                    "category": { "country": { "name": "England" } }
                },
                // 2025-04-21 16:00 UTC = 19:00 at UTC+3.
                "startTimestamp": 1745251200,
                "customId": "abc",
                "id": 111,
                "slug": "arsenal-chelsea",
                "homeTeam": { "name": "Arsenal" },
                "awayTeam": { "name": "Chelsea" }
            }]
        })
    }

    fn event_detail_body() -> serde_json::Value {
        json!({
            "event": {
                "homeTeam": { "slug": "arsenal", "id": 42 },
                "awayTeam": { "slug": "chelsea", "id": 38 }
            }
        })
    }

    /// Team performance: most recent last in source order. Ten qualifying
    /// league matches with Arsenal at home, all winnerCode 1.
    fn performance_body(count: usize) -> serde_json::Value {
        let events: Vec<_> = (0..count)
            .map(|i| {
                json!({
                    "tournament": { "name": "Premier League" },
                    "homeTeam": { "name": "Arsenal" },
                    "awayTeam": { "name": format!("Opponent {i}") },
                    "winnerCode": 1,
                    "homeScore": { "current": 2 },
                    "awayScore": { "current": i },
                    "slug": format!("arsenal-opponent-{i}"),
                    "customId": format!("h{i}"),
                    "id": 1000 + i
                })
            })
            .collect();
        json!({ "events": events })
    }

    fn browser_with_schedule() -> FakeBrowser {
        let browser = FakeBrowser::new();
        browser.serve(
            "https://test.site/football/2025-04-21",
            "/api/v1/sport/football/scheduled-events/2025-04-21",
            schedule_body(),
        );
        browser
    }

    fn crawler(browser: &FakeBrowser) -> Crawler<FakeBrowser, FakeBrowser> {
        Crawler::new(browser.clone(), browser.clone(), test_config())
    }

    #[tokio::test]
    async fn test_full_run_enriches_single_match() {
        let browser = browser_with_schedule();
        let match_url = "https://test.site/football/match/arsenal-chelsea/abc#id:111";
        browser.serve(
            match_url,
            "/api/v1/event/111/pregame-form",
            json!({ "homeTeam": { "position": 2 }, "awayTeam": { "position": 5 } }),
        );
        browser.serve(match_url, "/api/v1/event/111", event_detail_body());
        browser.serve(
            "https://test.site/team/football/arsenal/42#tab:matches",
            "/api/v1/team/42/performance",
            performance_body(10),
        );
        // Every historical match page serves its pregame form.
        for i in 0..10u32 {
            browser.serve(
                &format!(
                    "https://test.site/football/match/arsenal-opponent-{i}/h{i}#id:{},tab:standings",
                    1000 + i
                ),
                &format!("/api/v1/event/{}/pregame-form", 1000 + i),
                json!({ "homeTeam": { "position": 3 }, "awayTeam": { "position": 12 } }),
            );
        }

        let aggregator = crawler(&browser).run().await.unwrap();
        assert_eq!(aggregator.len(), 1);

        let record = &aggregator.matches()[0];
        assert_eq!(record.match_id, MatchId::new(111));
        assert_eq!(record.home_rank, Some(2));
        assert_eq!(record.away_rank, Some(5));
        assert_eq!(
            record.home_team_ref.as_ref().unwrap().id,
            TeamId::new(42)
        );

        // Cap of 4 is a hard stop despite 10 qualifying events, and
        // traversal is most-recent-first (source order reversed).
        assert_eq!(record.home_form.len(), 4);
        for rec in &record.home_form {
            assert_eq!(rec.venue, Venue::Home);
            assert_eq!(rec.outcome, Outcome::Win);
            assert_eq!(rec.team_rank, Some(3));
            assert_eq!(rec.opponent_rank, Some(12));
        }
        // Most recent event is id 1009, conceding 9.
        assert_eq!(record.home_form[0].goals_against, 9);
        assert_eq!(record.home_form[3].goals_against, 6);

        // Away side not tracked by default.
        assert!(record.away_form.is_empty());
    }

    #[tokio::test]
    async fn test_discover_failure_aborts_run() {
        // Schedule page serves nothing the correlator can match.
        let browser = FakeBrowser::new();
        let err = crawler(&browser).run().await.unwrap_err();
        assert!(matches!(err, Error::CorrelationMiss { .. }));
    }

    #[tokio::test]
    async fn test_standings_miss_degrades_but_continues() {
        let browser = browser_with_schedule();
        let match_url = "https://test.site/football/match/arsenal-chelsea/abc#id:111";
        // No pregame-form on the match page, but team info is there.
        browser.serve(match_url, "/api/v1/event/111", event_detail_body());
        browser.serve(
            "https://test.site/team/football/arsenal/42#tab:matches",
            "/api/v1/team/42/performance",
            json!({ "events": [] }),
        );

        let aggregator = crawler(&browser).run().await.unwrap();
        let record = &aggregator.matches()[0];

        // Ranks absent, no unrecovered error, TeamInfo still ran.
        assert_eq!(record.home_rank, None);
        assert_eq!(record.away_rank, None);
        assert!(record.home_team_ref.is_some());
    }

    #[tokio::test]
    async fn test_team_info_miss_skips_historical_form() {
        let browser = browser_with_schedule();
        let match_url = "https://test.site/football/match/arsenal-chelsea/abc#id:111";
        browser.serve(
            match_url,
            "/api/v1/event/111/pregame-form",
            json!({ "homeTeam": { "position": 2 }, "awayTeam": { "position": 5 } }),
        );
        // Event-detail endpoint never answers.

        let aggregator = crawler(&browser).run().await.unwrap();
        let record = &aggregator.matches()[0];

        // Partial record kept: ranks present, no team refs, no form.
        assert_eq!(record.home_rank, Some(2));
        assert!(record.home_team_ref.is_none());
        assert!(record.home_form.is_empty());
        // The team page was never visited.
        assert!(
            !browser
                .visited()
                .iter()
                .any(|url| url.contains("/team/football/"))
        );
    }

    #[tokio::test]
    async fn test_away_form_tracked_when_enabled() {
        let browser = browser_with_schedule();
        let match_url = "https://test.site/football/match/arsenal-chelsea/abc#id:111";
        browser.serve(match_url, "/api/v1/event/111", event_detail_body());
        browser.serve(
            "https://test.site/team/football/arsenal/42#tab:matches",
            "/api/v1/team/42/performance",
            json!({ "events": [] }),
        );
        // Chelsea away win: winnerCode 2, tracked team on the away side.
        browser.serve(
            "https://test.site/team/football/chelsea/38#tab:matches",
            "/api/v1/team/38/performance",
            json!({ "events": [{
                "tournament": { "name": "Premier League" },
                "homeTeam": { "name": "Fulham" },
                "awayTeam": { "name": "Chelsea" },
                "winnerCode": 2,
                "homeScore": { "current": 0 },
                "awayScore": { "current": 2 },
                "slug": "fulham-chelsea",
                "customId": "fc",
                "id": 2000
            }] }),
        );
        browser.serve(
            "https://test.site/football/match/fulham-chelsea/fc#id:2000,tab:standings",
            "/api/v1/event/2000/pregame-form",
            json!({ "homeTeam": { "position": 11 }, "awayTeam": { "position": 4 } }),
        );

        let mut config = test_config();
        config.track_away_form = true;
        let crawler = Crawler::new(browser.clone(), browser.clone(), config);

        let aggregator = crawler.run().await.unwrap();
        let record = &aggregator.matches()[0];

        assert_eq!(record.away_form.len(), 1);
        let rec = &record.away_form[0];
        assert_eq!(rec.venue, Venue::Away);
        assert_eq!(rec.outcome, Outcome::Win);
        assert_eq!(rec.goals_for, 2);
        assert_eq!(rec.goals_against, 0);
        // Away venue swaps the rank sides too.
        assert_eq!(rec.team_rank, Some(4));
        assert_eq!(rec.opponent_rank, Some(11));
    }

    #[tokio::test]
    async fn test_retry_policy_recovers_after_reload() {
        let browser = browser_with_schedule();
        let match_url = "https://test.site/football/match/arsenal-chelsea/abc#id:111";
        // Pregame form only appears on the second forced reload, so the
        // first settle-and-correlate attempt misses.
        browser.serve_after_reloads(
            match_url,
            "/api/v1/event/111/pregame-form",
            json!({ "homeTeam": { "position": 2 }, "awayTeam": { "position": 5 } }),
            2,
        );
        browser.serve(match_url, "/api/v1/event/111", event_detail_body());
        browser.serve(
            "https://test.site/team/football/arsenal/42#tab:matches",
            "/api/v1/team/42/performance",
            json!({ "events": [] }),
        );

        let mut config = test_config();
        config.retry = RetryPolicy::fixed(3, Duration::from_millis(1));
        let crawler = Crawler::new(browser.clone(), browser.clone(), config);

        let aggregator = crawler.run().await.unwrap();
        assert_eq!(aggregator.matches()[0].home_rank, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_deadline_surfaces_timeout() {
        let browser = FakeBrowser::new();
        let mut config = test_config();
        config.run_deadline = Some(Duration::from_millis(50));
        // Correlation would poll far longer than the deadline.
        config.correlation_timeout = Duration::from_secs(60);

        let crawler = Crawler::new(browser.clone(), browser.clone(), config);
        let err = crawler.run().await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_navigation_sequence_for_one_match() {
        let browser = browser_with_schedule();
        let match_url = "https://test.site/football/match/arsenal-chelsea/abc#id:111";
        browser.serve(match_url, "/api/v1/event/111", event_detail_body());
        browser.serve(
            "https://test.site/team/football/arsenal/42#tab:matches",
            "/api/v1/team/42/performance",
            json!({ "events": [] }),
        );

        crawler(&browser).run().await.unwrap();

        let visited = browser.visited();
        assert_eq!(visited[0], api::schedule_page("https://test.site", test_config().target_date));
        // Standings and team info both open the match page.
        assert_eq!(visited[1], match_url);
        assert_eq!(visited[2], match_url);
        assert_eq!(
            visited[3],
            "https://test.site/team/football/arsenal/42#tab:matches"
        );
    }
}
