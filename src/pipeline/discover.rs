//! Discover stage: schedule page -> filtered ScheduledMatch list.
//!
//! Runs once per crawl. Terminal failure here aborts the entire run —
//! without the schedule there is nothing to crawl.

// ============================================================================
// Imports
// ============================================================================

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api;
use crate::capture::CaptureBackend;
use crate::config::CrawlConfig;
use crate::error::{Error, Result};
use crate::identifiers::MatchId;
use crate::model::ScheduledMatch;
use crate::navigate::PageDriver;

use super::Crawler;

// ============================================================================
// Crawler - Discover
// ============================================================================

impl<D: PageDriver, C: CaptureBackend> Crawler<D, C> {
    /// Navigates to the schedule page for the target date and extracts
    /// every match that passes the country/league/date filter.
    ///
    /// # Errors
    ///
    /// Any failure here — navigation, correlation miss, unavailable
    /// body, malformed JSON — is fatal to the run.
    pub(crate) async fn discover(&self) -> Result<Vec<ScheduledMatch>> {
        let config = self.config();
        let url = api::schedule_page(&config.base_url, config.target_date);
        let path = api::scheduled_events_path(config.target_date);

        info!(url = %url, "Discover: loading schedule");
        self.nav().open(&url).await?;
        self.nav().settle(false).await?;

        let body = self.correlator().await_json(&path).await?;
        parse_schedule(&body, config, &path)
    }
}

// ============================================================================
// Schedule Parsing
// ============================================================================

/// Parses a schedule payload into the filtered match list.
///
/// A raw descriptor produces a [`ScheduledMatch`] if and only if its
/// country and league are whitelisted and its localized kickoff date
/// equals the target date. Descriptors missing fields are skipped with a
/// log line, matching the tolerance the noisy schedule feed needs — many
/// listed tournaments carry no country at all.
///
/// # Errors
///
/// Returns [`Error::MissingField`] when the payload has no `events`
/// array: that is a malformed schedule, not a noisy entry.
pub(crate) fn parse_schedule(
    body: &Value,
    config: &CrawlConfig,
    path: &str,
) -> Result<Vec<ScheduledMatch>> {
    let events = body
        .get("events")
        .and_then(|v| v.as_array())
        .ok_or_else(|| Error::missing_field(path, "/events"))?;

    let mut matches = Vec::new();

    for event in events {
        let Some(league) = event.pointer("/tournament/name").and_then(|v| v.as_str()) else {
            continue;
        };
        let Some(country) = event
            .pointer("/tournament/category/country/name")
            .and_then(|v| v.as_str())
        else {
            debug!(league = %league, "Skipping tournament without a country");
            continue;
        };
        let Some(timestamp) = event.get("startTimestamp").and_then(|v| v.as_i64()) else {
            warn!(league = %league, "Skipping event without a kickoff timestamp");
            continue;
        };
        let Some((kickoff_date, kickoff_time)) = kickoff_local(timestamp, config.kickoff_offset)
        else {
            warn!(league = %league, timestamp, "Skipping event with out-of-range timestamp");
            continue;
        };

        if !filter_allows(config, country, league, kickoff_date) {
            continue;
        }

        // Past the filter every identity field is required; a survivor
        // missing one cannot be crawled further.
        let (Some(custom_id), Some(id), Some(slug), Some(home_team), Some(away_team)) = (
            event.get("customId").and_then(|v| v.as_str()),
            event.get("id").and_then(|v| v.as_u64()),
            event.get("slug").and_then(|v| v.as_str()),
            event.pointer("/homeTeam/name").and_then(|v| v.as_str()),
            event.pointer("/awayTeam/name").and_then(|v| v.as_str()),
        ) else {
            warn!(league = %league, "Skipping filtered event with missing identity fields");
            continue;
        };

        debug!(league = %league, home = %home_team, away = %away_team, "Discovered match");

        matches.push(ScheduledMatch {
            league: league.to_string(),
            country: country.to_string(),
            custom_id: custom_id.to_string(),
            home_team: home_team.to_string(),
            away_team: away_team.to_string(),
            match_id: MatchId::new(id),
            slug: slug.to_string(),
            kickoff_date,
            kickoff_time,
            home_rank: None,
            away_rank: None,
            home_team_ref: None,
            away_team_ref: None,
            home_form: Vec::new(),
            away_form: Vec::new(),
        });
    }

    Ok(matches)
}

/// The Discover filter: a pure predicate over country, league and
/// localized kickoff date.
pub(crate) fn filter_allows(
    config: &CrawlConfig,
    country: &str,
    league: &str,
    kickoff_date: NaiveDate,
) -> bool {
    config.countries.contains(country)
        && config.leagues.contains(league)
        && kickoff_date == config.target_date
}

/// Converts a UNIX kickoff timestamp to date and time in the reference
/// timezone.
fn kickoff_local(timestamp: i64, offset: FixedOffset) -> Option<(NaiveDate, NaiveTime)> {
    let utc = DateTime::from_timestamp(timestamp, 0)?;
    let local = utc.with_timezone(&offset);
    Some((local.date_naive(), local.time()))
}

// ============================================================================
// Tests
// ============================================================================
