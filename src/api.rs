//! API path patterns and page URL construction.
//!
//! The correlator matches captured paths by exact string equality, so
//! every expected path is built here with the runtime identifiers
//! substituted in. Page URLs reproduce the site's routing, including the
//! fragment forms the match and team pages expect.

// ============================================================================
// Imports
// ============================================================================

use chrono::NaiveDate;

use crate::identifiers::{MatchId, TeamId};

// ============================================================================
// API Paths (exact-match correlation targets)
// ============================================================================

/// Schedule endpoint for all football matches on a date.
#[inline]
#[must_use]
pub fn scheduled_events_path(date: NaiveDate) -> String {
    format!("/api/v1/sport/football/scheduled-events/{}", date.format("%Y-%m-%d"))
}

/// Pregame-form endpoint: both sides' league positions before a match.
#[inline]
#[must_use]
pub fn pregame_form_path(match_id: MatchId) -> String {
    format!("/api/v1/event/{match_id}/pregame-form")
}

/// Event-detail endpoint: team slugs and ids for a match.
#[inline]
#[must_use]
pub fn event_detail_path(match_id: MatchId) -> String {
    format!("/api/v1/event/{match_id}")
}

/// Team-performance endpoint: a team's recent finished matches,
/// most recent last.
#[inline]
#[must_use]
pub fn team_performance_path(team_id: TeamId) -> String {
    format!("/api/v1/team/{team_id}/performance")
}

// ============================================================================
// Page URLs (navigation targets)
// ============================================================================

/// Schedule page listing all matches for a date.
#[inline]
#[must_use]
pub fn schedule_page(base: &str, date: NaiveDate) -> String {
    format!("{base}/football/{}", date.format("%Y-%m-%d"))
}

/// Detail page of an upcoming match.
#[inline]
#[must_use]
pub fn match_page(base: &str, slug: &str, custom_id: &str, match_id: MatchId) -> String {
    format!("{base}/football/match/{slug}/{custom_id}#id:{match_id}")
}

/// Detail page of a historical match, opened on its standings tab so the
/// pregame-form request fires.
#[inline]
#[must_use]
pub fn historical_match_page(base: &str, slug: &str, custom_id: &str, match_id: MatchId) -> String {
    format!("{base}/football/match/{slug}/{custom_id}#id:{match_id},tab:standings")
}

/// Team page opened on its matches tab.
#[inline]
#[must_use]
pub fn team_page(base: &str, slug: &str, team_id: TeamId) -> String {
    format!("{base}/team/football/{slug}/{team_id}#tab:matches")
}

// ============================================================================
// Tests
// ============================================================================
