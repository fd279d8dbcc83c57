//! Startup bootstrapper: re-attaches a clock to every draft that was live
//! when the previous process died, and self-heals drafts that finished
//! their final pick but were never marked completed.

use std::sync::Arc;

use tracing::info;

use crate::dto::draft_dto::DraftStatus;
use crate::errors::DraftError;
use crate::services::runtime::DraftRuntime;
use crate::store;

/// Returns the number of clocks attached.
pub async fn resume_active_drafts(runtime: &Arc<DraftRuntime>) -> Result<usize, DraftError> {
    let drafts = store::list_drafts_by_status(
        &runtime.pool,
        &[DraftStatus::Waiting, DraftStatus::Started],
    )
    .await?;

    let mut resumed = 0;
    for draft in drafts {
        match draft.status {
            DraftStatus::Waiting => {
                runtime.attach_clock(draft.id, draft.league_id).await;
                resumed += 1;
            }
            DraftStatus::Started => {
                // The previous process may have died after the final pick
                // committed but before the status flip.
                if (draft.pick_list.0.len() as i64) >= draft.total_picks() {
                    store::complete_draft(&runtime.pool, draft.id, None).await?;
                    info!("draft {} had all picks recorded; marked completed", draft.id);
                } else {
                    runtime.attach_clock(draft.id, draft.league_id).await;
                    resumed += 1;
                }
            }
            DraftStatus::Scheduled | DraftStatus::Completed => {}
        }
    }

    info!("recovery attached {resumed} draft clock(s)");
    Ok(resumed)
}
