//! One polling timer task per active draft. The clock only observes and
//! triggers; every state change goes through the coordinator's
//! transactions, so a tick that fires late or twice cannot double-advance
//! a turn.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::dto::draft_dto::DraftStatus;
use crate::errors::DraftError;
use crate::services::draft_coordinator::{self, TimeoutOutcome};
use crate::services::runtime::DraftRuntime;
use crate::store;

/// Coarse on purpose; the deadline grace period absorbs this granularity.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

enum ClockTick {
    KeepPolling,
    Finished,
}

pub(crate) fn spawn_clock(
    runtime: Arc<DraftRuntime>,
    draft_id: i64,
    league_id: i64,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        run_clock(runtime, draft_id, league_id, cancel).await;
    })
}

async fn run_clock(
    runtime: Arc<DraftRuntime>,
    draft_id: i64,
    league_id: i64,
    cancel: CancellationToken,
) {
    loop {
        // Cancellation is only honored between polls: a tick that already
        // entered a transaction finishes before the task exits.
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(POLL_INTERVAL) => {}
        }

        match tick(&runtime, draft_id).await {
            Ok(ClockTick::KeepPolling) => {}
            Ok(ClockTick::Finished) => break,
            Err(e) => {
                // A failed poll is retried on the next interval.
                error!("clock poll failed for draft {draft_id}: {e}");
            }
        }
    }

    runtime.release_clock(draft_id).await;
    info!("clock for draft {draft_id} (league {league_id}) stopped");
}

async fn tick(runtime: &Arc<DraftRuntime>, draft_id: i64) -> Result<ClockTick, DraftError> {
    let Some(draft) = store::get_draft(&runtime.pool, draft_id).await? else {
        warn!("draft {draft_id} disappeared; stopping its clock");
        return Ok(ClockTick::Finished);
    };

    match draft.status {
        DraftStatus::Scheduled => {
            warn!("draft {draft_id} is still scheduled; stopping its clock");
            Ok(ClockTick::Finished)
        }
        DraftStatus::Waiting => {
            if Utc::now() >= draft.start_time {
                draft_coordinator::begin_draft(runtime, draft_id).await?;
            }
            Ok(ClockTick::KeepPolling)
        }
        DraftStatus::Started => {
            let expired = matches!(draft.next_pick_time, Some(deadline) if Utc::now() > deadline);
            if !expired {
                return Ok(ClockTick::KeepPolling);
            }
            // The coordinator re-checks the deadline inside its own
            // transaction; this outer check only avoids needless work.
            match draft_coordinator::handle_timeout(runtime, draft_id).await? {
                TimeoutOutcome::DraftComplete => Ok(ClockTick::Finished),
                TimeoutOutcome::Skipped | TimeoutOutcome::NotDue => Ok(ClockTick::KeepPolling),
            }
        }
        DraftStatus::Completed => Ok(ClockTick::Finished),
    }
}
