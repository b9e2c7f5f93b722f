//! HistoricalForm stage: same-league form of a tracked team, capped,
//! most recent first, with ranks as of each historical match.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api;
use crate::capture::CaptureBackend;
use crate::error::Result;
use crate::identifiers::{MatchId, TeamId};
use crate::model::{HistoricalRecord, Outcome, ScheduledMatch, Venue};
use crate::navigate::PageDriver;

use super::Crawler;

// ============================================================================
// Crawler - HistoricalForm
// ============================================================================

impl<D: PageDriver, C: CaptureBackend> Crawler<D, C> {
    /// Crawls one tracked side's historical form and appends the
    /// qualifying records to the match.
    ///
    /// Never fails the run: any error degrades this side's form list
    /// (possibly to empty) and is logged here.
    pub(crate) async fn crawl_history(&self, record: &mut ScheduledMatch, venue: Venue) {
        let Some(team_ref) = record.team_ref(venue).cloned() else {
            // Callers only reach this stage after TeamInfo succeeded.
            warn!(match_id = %record.match_id, ?venue, "No team ref, skipping history");
            return;
        };

        if let Err(err) = self.crawl_history_inner(record, venue, &team_ref.slug, team_ref.id).await
        {
            warn!(
                match_id = %record.match_id,
                team = %team_ref.slug,
                error = %err,
                "Historical form degraded"
            );
        }
    }

    async fn crawl_history_inner(
        &self,
        record: &mut ScheduledMatch,
        venue: Venue,
        team_slug: &str,
        team_id: TeamId,
    ) -> Result<()> {
        let config = self.config();
        let url = api::team_page(&config.base_url, team_slug, team_id);
        let path = api::team_performance_path(team_id);

        info!(team = %team_slug, url = %url, "History: loading team page");
        self.nav().open(&url).await?;
        self.nav().dismiss_popups().await;

        let body = self.settle_and_correlate(&path).await?;

        // Source order is most-recent-last; traversal must be
        // most-recent-first.
        let mut events = body
            .get("events")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();
        events.reverse();

        let team_name = record.team_name(venue).to_string();
        let league = record.league.clone();
        let cap = config.history_cap;

        for event in &events {
            if record.form_mut(venue).len() >= cap {
                break;
            }

            let Some(historical) = qualify(event, &league, &team_name) else {
                continue;
            };

            let (team_rank, opponent_rank) = self
                .historical_ranks(
                    historical.match_id,
                    &historical.slug,
                    &historical.custom_id,
                    historical.venue,
                )
                .await;

            record.form_mut(venue).push(HistoricalRecord {
                venue: historical.venue,
                outcome: historical.outcome,
                goals_for: historical.goals_for,
                goals_against: historical.goals_against,
                team_rank,
                opponent_rank,
            });
        }

        debug!(
            team = %team_slug,
            collected = record.form_mut(venue).len(),
            "Historical form collected"
        );
        Ok(())
    }

    /// Nested navigation/correlation cycle: opens the historical match's
    /// own page and reads both sides' positions as of that match.
    ///
    /// Failures degrade to `(None, None)` — the record keeps its result
    /// and score either way.
    async fn historical_ranks(
        &self,
        match_id: MatchId,
        slug: &str,
        custom_id: &str,
        venue: Venue,
    ) -> (Option<u32>, Option<u32>) {
        let config = self.config();
        let url = api::historical_match_page(&config.base_url, slug, custom_id, match_id);
        let path = api::pregame_form_path(match_id);

        debug!(%match_id, url = %url, "History: loading historical match page");

        let body = match self.open_and_correlate(&url, &path).await {
            Ok(body) => body,
            Err(err) => {
                warn!(%match_id, expected = %path, error = %err, "Historical ranks unavailable");
                return (None, None);
            }
        };

        let home = body
            .pointer("/homeTeam/position")
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok());
        let away = body
            .pointer("/awayTeam/position")
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok());

        match venue {
            Venue::Home => (home, away),
            Venue::Away => (away, home),
        }
    }

    async fn open_and_correlate(&self, url: &str, path: &str) -> Result<Value> {
        self.nav().open(url).await?;
        self.nav().dismiss_popups().await;
        self.settle_and_correlate(path).await
    }
}

// ============================================================================
// Qualification
// ============================================================================

/// Fields extracted from a qualifying historical event.
struct QualifiedEvent {
    venue: Venue,
    outcome: Outcome,
    goals_for: u32,
    goals_against: u32,
    match_id: MatchId,
    slug: String,
    custom_id: String,
}

/// Decides whether a historical event counts toward the tracked team's
/// form, and extracts its record fields if so.
///
/// A record qualifies when it is in the same league as the upcoming
/// match and the tracked team appears on either side — venue is decided
/// by name comparison, since the source embeds names consistently across
/// endpoints. Unparseable records (missing scores, foreign winner codes)
/// are skipped and do not count toward the cap.
fn qualify(event: &Value, league: &str, team_name: &str) -> Option<QualifiedEvent> {
    let event_league = event.pointer("/tournament/name")?.as_str()?;
    if event_league != league {
        return None;
    }

    let home_name = event.pointer("/homeTeam/name")?.as_str()?;
    let away_name = event.pointer("/awayTeam/name")?.as_str()?;

    let venue = if team_name == home_name {
        Venue::Home
    } else if team_name == away_name {
        Venue::Away
    } else {
        return None;
    };

    let winner_code = event.get("winnerCode")?.as_u64()?;
    let outcome = Outcome::from_winner_code(winner_code, venue)?;

    let home_score = u32::try_from(event.pointer("/homeScore/current")?.as_u64()?).ok()?;
    let away_score = u32::try_from(event.pointer("/awayScore/current")?.as_u64()?).ok()?;
    let (goals_for, goals_against) = match venue {
        Venue::Home => (home_score, away_score),
        Venue::Away => (away_score, home_score),
    };

    let match_id = MatchId::new(event.get("id")?.as_u64()?);
    let slug = event.get("slug")?.as_str()?.to_string();
    let custom_id = event.get("customId")?.as_str()?.to_string();

    Some(QualifiedEvent {
        venue,
        outcome,
        goals_for,
        goals_against,
        match_id,
        slug,
        custom_id,
    })
}

// ============================================================================
// Tests
// ============================================================================
