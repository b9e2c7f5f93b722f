//! The mutable in-memory result set of one crawl run.
//!
//! The aggregator is owned by the crawl pipeline and handed to callers
//! once the run finishes; there is no module-level state. Records are
//! appended in discovery order and never removed.

// ============================================================================
// Imports
// ============================================================================

use crate::model::{HistoricalRecord, ScheduledMatch};

// ============================================================================
// Aggregator
// ============================================================================

/// Ordered collection of enriched [`ScheduledMatch`] records.
#[derive(Debug, Default)]
pub struct Aggregator {
    matches: Vec<ScheduledMatch>,
}

impl Aggregator {
    /// Creates an empty aggregator.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a finished record.
    #[inline]
    pub fn push(&mut self, record: ScheduledMatch) {
        self.matches.push(record);
    }

    /// Returns the records in discovery order.
    #[inline]
    #[must_use]
    pub fn matches(&self) -> &[ScheduledMatch] {
        &self.matches
    }

    /// Returns the number of records.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Returns `true` if the run produced no records.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Consumes the aggregator, yielding the records.
    #[inline]
    #[must_use]
    pub fn into_matches(self) -> Vec<ScheduledMatch> {
        self.matches
    }

    /// Renders every record as an ordered flat key/value row,
    /// historical form flattened with indexed keys
    /// (`home_form.1.result`, most recent first).
    #[must_use]
    pub fn flat_records(&self) -> Vec<Vec<(String, String)>> {
        self.matches.iter().map(flatten_match).collect()
    }
}

// ============================================================================
// Flattening
// ============================================================================

fn flatten_match(record: &ScheduledMatch) -> Vec<(String, String)> {
    let mut row = vec![
        ("league".to_string(), record.league.clone()),
        ("country".to_string(), record.country.clone()),
        ("custom_id".to_string(), record.custom_id.clone()),
        ("home_team".to_string(), record.home_team.clone()),
        ("away_team".to_string(), record.away_team.clone()),
        ("match_id".to_string(), record.match_id.to_string()),
        ("slug".to_string(), record.slug.clone()),
        ("kickoff_date".to_string(), record.kickoff_date.to_string()),
        ("kickoff_time".to_string(), record.kickoff_time.to_string()),
    ];

    if let Some(rank) = record.home_rank {
        row.push(("home_rank".to_string(), rank.to_string()));
    }
    if let Some(rank) = record.away_rank {
        row.push(("away_rank".to_string(), rank.to_string()));
    }

    flatten_form(&mut row, "home_form", &record.home_form);
    flatten_form(&mut row, "away_form", &record.away_form);

    row
}

fn flatten_form(row: &mut Vec<(String, String)>, prefix: &str, form: &[HistoricalRecord]) {
    for (i, rec) in form.iter().enumerate() {
        let n = i + 1;
        row.push((format!("{prefix}.{n}.venue"), rec.venue.label().to_string()));
        row.push((
            format!("{prefix}.{n}.result"),
            rec.outcome.label().to_string(),
        ));
        row.push((format!("{prefix}.{n}.scored"), rec.goals_for.to_string()));
        row.push((
            format!("{prefix}.{n}.conceded"),
            rec.goals_against.to_string(),
        ));
        if let Some(rank) = rec.team_rank {
            row.push((format!("{prefix}.{n}.team_rank"), rank.to_string()));
        }
        if let Some(rank) = rec.opponent_rank {
            row.push((format!("{prefix}.{n}.opponent_rank"), rank.to_string()));
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
