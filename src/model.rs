//! Typed records produced by the crawl pipeline.
//!
//! # Record lifecycle
//!
//! A [`ScheduledMatch`] is created by the Discover stage and enriched in
//! place by the later stages: standings attach ranks, team info attaches
//! [`TeamRef`]s, historical form appends [`HistoricalRecord`]s. Records
//! are never deleted during a run; identity is the match id.

// ============================================================================
// Imports
// ============================================================================

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::identifiers::{MatchId, TeamId};

// ============================================================================
// Venue
// ============================================================================

/// Which side a team played on in a given match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Venue {
    /// The team played at home.
    Home,
    /// The team played away.
    Away,
}

impl Venue {
    /// Returns the opposite venue.
    #[inline]
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Home => Self::Away,
            Self::Away => Self::Home,
        }
    }

    /// Short label used in flat record output.
    #[inline]
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Away => "Away",
        }
    }
}

// ============================================================================
// Outcome
// ============================================================================

/// Match outcome from the perspective of one tracked team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The tracked team won.
    Win,
    /// The match was drawn.
    Draw,
    /// The tracked team lost.
    Loss,
}

impl Outcome {
    /// Maps a finished-match `winnerCode` to an outcome relative to the
    /// tracked team's venue in that match.
    ///
    /// The code is absolute (1 = home side won, 2 = away side won,
    /// 3 = draw); the outcome is relative: code 1 is a Win only if the
    /// tracked team played at home, a Loss if it played away.
    ///
    /// Returns `None` for codes outside 1..=3 (e.g. unfinished matches).
    #[must_use]
    pub fn from_winner_code(code: u64, venue: Venue) -> Option<Self> {
        match (code, venue) {
            (1, Venue::Home) | (2, Venue::Away) => Some(Self::Win),
            (1, Venue::Away) | (2, Venue::Home) => Some(Self::Loss),
            (3, _) => Some(Self::Draw),
            _ => None,
        }
    }

    /// Short label used in flat record output.
    #[inline]
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Win => "Win",
            Self::Draw => "Draw",
            Self::Loss => "Loss",
        }
    }
}

// ============================================================================
// TeamRef
// ============================================================================

/// Slug + id pair identifying a team on the site.
///
/// Attached by the TeamInfo stage; required before any historical form
/// can be crawled for that team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRef {
    /// URL slug, e.g. `"arsenal"`.
    pub slug: String,
    /// Numeric team id.
    pub id: TeamId,
}

// ============================================================================
// HistoricalRecord
// ============================================================================

/// One qualifying prior match of a tracked team, in the same league as
/// the upcoming match.
///
/// Ranks are the league positions *as of that historical match*, taken
/// from that match's own pregame-form payload, not current positions.
/// They stay unset when the nested correlation for that match failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    /// Side the tracked team played on.
    pub venue: Venue,
    /// Result from the tracked team's perspective.
    pub outcome: Outcome,
    /// Goals scored by the tracked team.
    pub goals_for: u32,
    /// Goals conceded by the tracked team.
    pub goals_against: u32,
    /// Tracked team's league position before that match.
    pub team_rank: Option<u32>,
    /// Opponent's league position before that match.
    pub opponent_rank: Option<u32>,
}

// ============================================================================
// ScheduledMatch
// ============================================================================

/// One upcoming match that survived the Discover-stage filter,
/// progressively enriched by the later pipeline stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledMatch {
    /// Tournament name, e.g. `"Premier League"`.
    pub league: String,
    /// Tournament category country name.
    pub country: String,
    /// Site-specific short id used in match page URLs.
    pub custom_id: String,
    /// Home team display name.
    pub home_team: String,
    /// Away team display name.
    pub away_team: String,
    /// Numeric match id. Record identity.
    pub match_id: MatchId,
    /// URL slug, e.g. `"arsenal-chelsea"`.
    pub slug: String,
    /// Kickoff date in the reference timezone.
    pub kickoff_date: NaiveDate,
    /// Kickoff time in the reference timezone.
    pub kickoff_time: NaiveTime,

    /// Home side league position before this match (PerMatchStandings).
    pub home_rank: Option<u32>,
    /// Away side league position before this match (PerMatchStandings).
    pub away_rank: Option<u32>,

    /// Home team slug/id (TeamInfo).
    pub home_team_ref: Option<TeamRef>,
    /// Away team slug/id (TeamInfo).
    pub away_team_ref: Option<TeamRef>,

    /// Same-league historical form of the home team, most recent first.
    pub home_form: Vec<HistoricalRecord>,
    /// Same-league historical form of the away team, most recent first.
    /// Empty unless away tracking is enabled.
    pub away_form: Vec<HistoricalRecord>,
}

impl ScheduledMatch {
    /// Returns the tracked team's display name for a side of this match.
    #[inline]
    #[must_use]
    pub fn team_name(&self, venue: Venue) -> &str {
        match venue {
            Venue::Home => &self.home_team,
            Venue::Away => &self.away_team,
        }
    }

    /// Returns the team ref for a side of this match, if attached.
    #[inline]
    #[must_use]
    pub fn team_ref(&self, venue: Venue) -> Option<&TeamRef> {
        match venue {
            Venue::Home => self.home_team_ref.as_ref(),
            Venue::Away => self.away_team_ref.as_ref(),
        }
    }

    /// Returns the mutable form list for a side of this match.
    #[inline]
    pub fn form_mut(&mut self, venue: Venue) -> &mut Vec<HistoricalRecord> {
        match venue {
            Venue::Home => &mut self.home_form,
            Venue::Away => &mut self.away_form,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
