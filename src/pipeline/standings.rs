//! PerMatchStandings stage: attach both sides' league positions.

// ============================================================================
// Imports
// ============================================================================

use tracing::{debug, info};

use crate::api;
use crate::capture::CaptureBackend;
use crate::correlate::require_u32;
use crate::error::Result;
use crate::model::ScheduledMatch;
use crate::navigate::PageDriver;

use super::Crawler;

// ============================================================================
// Crawler - PerMatchStandings
// ============================================================================

impl<D: PageDriver, C: CaptureBackend> Crawler<D, C> {
    /// Loads the match page and attaches `home_rank`/`away_rank` from
    /// the pregame-form payload.
    ///
    /// # Errors
    ///
    /// Non-fatal to the run: the caller logs the error and leaves both
    /// ranks unset. Partial records are acceptable.
    pub(crate) async fn attach_standings(&self, record: &mut ScheduledMatch) -> Result<()> {
        let config = self.config();
        let url = api::match_page(
            &config.base_url,
            &record.slug,
            &record.custom_id,
            record.match_id,
        );
        let path = api::pregame_form_path(record.match_id);

        info!(match_id = %record.match_id, url = %url, "Standings: loading match page");
        self.nav().open(&url).await?;
        self.nav().dismiss_popups().await;

        let body = self.settle_and_correlate(&path).await?;

        let home_rank = require_u32(&body, "/homeTeam/position", &path)?;
        let away_rank = require_u32(&body, "/awayTeam/position", &path)?;

        record.home_rank = Some(home_rank);
        record.away_rank = Some(away_rank);

        debug!(
            match_id = %record.match_id,
            home_rank,
            away_rank,
            "Standings attached"
        );
        Ok(())
    }
}
