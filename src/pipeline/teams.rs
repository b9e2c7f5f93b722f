//! TeamInfo stage: attach team slugs and ids for both sides.

// ============================================================================
// Imports
// ============================================================================

use tracing::{debug, info};

use crate::api;
use crate::capture::CaptureBackend;
use crate::correlate::{require_str, require_u64};
use crate::error::Result;
use crate::identifiers::TeamId;
use crate::model::{ScheduledMatch, TeamRef};
use crate::navigate::PageDriver;

use super::Crawler;

// ============================================================================
// Crawler - TeamInfo
// ============================================================================

impl<D: PageDriver, C: CaptureBackend> Crawler<D, C> {
    /// Re-loads the match page and attaches both sides' [`TeamRef`]s
    /// from the event-detail payload.
    ///
    /// # Errors
    ///
    /// Non-fatal to the run, but the caller skips the HistoricalForm
    /// stage for this match on failure — it has a hard dependency on
    /// team identity.
    pub(crate) async fn attach_team_refs(&self, record: &mut ScheduledMatch) -> Result<()> {
        let config = self.config();
        let url = api::match_page(
            &config.base_url,
            &record.slug,
            &record.custom_id,
            record.match_id,
        );
        let path = api::event_detail_path(record.match_id);

        info!(match_id = %record.match_id, "Team info: reloading match page");
        self.nav().open(&url).await?;
        self.nav().dismiss_popups().await;

        let body = self.settle_and_correlate(&path).await?;

        let home = TeamRef {
            slug: require_str(&body, "/event/homeTeam/slug", &path)?.to_string(),
            id: TeamId::new(require_u64(&body, "/event/homeTeam/id", &path)?),
        };
        let away = TeamRef {
            slug: require_str(&body, "/event/awayTeam/slug", &path)?.to_string(),
            id: TeamId::new(require_u64(&body, "/event/awayTeam/id", &path)?),
        };

        debug!(
            match_id = %record.match_id,
            home_slug = %home.slug,
            away_slug = %away.slug,
            "Team refs attached"
        );

        record.home_team_ref = Some(home);
        record.away_team_ref = Some(away);
        Ok(())
    }
}
