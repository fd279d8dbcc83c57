//! The single authority for mutating a draft's turn state. Human picks and
//! clock timeouts both funnel into one re-read-then-write transaction per
//! draft, so only one of them can consume any given turn. The record
//! store's transaction serialization is the mutual-exclusion mechanism;
//! nothing here relies on in-process locks for correctness. Transactions
//! take write intent at begin, so overlapping writers queue there and the
//! loser's re-read sees the winner's committed advance.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::rng;
use tracing::info;

use crate::db;
use crate::dto::draft_dto::{Draft, DraftEvent, DraftStatus, PickReceipt};
use crate::dto::player_dto::NflPlayer;
use crate::errors::DraftError;
use crate::services::pick_advancer::{advance_turn, pick_deadline, TurnAdvance};
use crate::services::roster::find_open_slot;
use crate::services::runtime::DraftRuntime;
use crate::store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutOutcome {
    /// The turn was skipped and the draft moved on.
    Skipped,
    /// The deadline had moved since the clock last observed it; nothing to do.
    NotDue,
    /// The draft is over (either this timeout ended it or it already was).
    DraftComplete,
}

/// Randomizes the order and either starts the draft immediately or parks it
/// in `waiting` until `start_time`. Attaches the clock either way.
pub async fn start_draft(
    runtime: &Arc<DraftRuntime>,
    draft_id: i64,
    start_time: Option<DateTime<Utc>>,
) -> Result<Draft, DraftError> {
    let mut tx = db::begin_write(&runtime.pool).await?;

    let draft = store::get_draft(&mut *tx, draft_id)
        .await?
        .ok_or(DraftError::NotFound("draft"))?;
    if draft.status != DraftStatus::Scheduled {
        return Err(DraftError::AlreadyStarted);
    }

    let teams = store::list_teams_by_league(&mut *tx, draft.league_id).await?;
    if teams.is_empty() {
        return Err(DraftError::PickRejected("league has no teams to draft"));
    }

    let mut draft_order: Vec<i64> = teams.iter().map(|t| t.id).collect();
    draft_order.shuffle(&mut rng());

    let now = Utc::now();
    let start_time = start_time.unwrap_or(now);
    let (status, next_pick_time) = if start_time <= now {
        (DraftStatus::Started, Some(pick_deadline(now, draft.time_per_pick)))
    } else {
        (DraftStatus::Waiting, None)
    };

    store::set_draft_schedule(&mut *tx, draft_id, &draft_order, status, start_time, next_pick_time)
        .await?;
    tx.commit().await?;

    runtime.attach_clock(draft_id, draft.league_id).await;

    if let Some(next_pick_time) = next_pick_time {
        info!("draft {draft_id} started with {} teams", draft_order.len());
        runtime
            .rooms
            .broadcast(draft.league_id, &DraftEvent::DraftStarted { next_pick_time })
            .await;
    } else {
        info!("draft {draft_id} waiting until {start_time}");
    }

    store::get_draft(&runtime.pool, draft_id)
        .await?
        .ok_or(DraftError::NotFound("draft"))
}

/// Flips a `waiting` draft to `started` once its start time arrives. Called
/// by the clock; re-checks the status inside the transaction so a duplicate
/// invocation is a no-op.
pub async fn begin_draft(runtime: &Arc<DraftRuntime>, draft_id: i64) -> Result<(), DraftError> {
    let mut tx = db::begin_write(&runtime.pool).await?;

    let Some(draft) = store::get_draft(&mut *tx, draft_id).await? else {
        return Ok(());
    };
    if draft.status != DraftStatus::Waiting || Utc::now() < draft.start_time {
        return Ok(());
    }

    let next_pick_time = pick_deadline(Utc::now(), draft.time_per_pick);
    store::mark_draft_started(&mut *tx, draft_id, next_pick_time).await?;
    tx.commit().await?;

    info!("draft {draft_id} reached its start time");
    runtime
        .rooms
        .broadcast(draft.league_id, &DraftEvent::DraftStarted { next_pick_time })
        .await;
    Ok(())
}

/// Validates and records a human pick. Validation happens before the
/// transaction; the turn observed here is re-checked inside it, so a pick
/// that lost a race against the clock (or another writer) surfaces as
/// `PickRejected` rather than double-advancing the draft.
pub async fn submit_pick(
    runtime: &Arc<DraftRuntime>,
    draft_id: i64,
    team_id: i64,
    player_id: i64,
) -> Result<PickReceipt, DraftError> {
    let draft = store::get_draft(&runtime.pool, draft_id)
        .await?
        .ok_or(DraftError::NotFound("draft"))?;
    if draft.status != DraftStatus::Started {
        return Err(DraftError::PickRejected("draft is not in progress"));
    }

    let team = store::get_team(&runtime.pool, team_id)
        .await?
        .ok_or(DraftError::NotFound("team"))?;
    if team.league_id != draft.league_id {
        return Err(DraftError::NotFound("team"));
    }

    let player = store::get_player(&runtime.pool, player_id)
        .await?
        .ok_or(DraftError::NotFound("player"))?;

    if store::is_player_rostered(&runtime.pool, draft.league_id, player.id).await? {
        return Err(DraftError::PlayerAlreadyRostered);
    }
    if find_open_slot(&team.roster.0, player.position).is_none() {
        return Err(DraftError::RosterFull);
    }

    let expected_turn = (draft.current_round, draft.current_pick);
    match apply_pick(runtime, draft_id, team_id, &player, expected_turn).await {
        Err(DraftError::StaleTurn) => {
            Err(DraftError::PickRejected("the draft moved on before your pick was recorded"))
        }
        other => other,
    }
}

/// The transactional half of a human pick, exposed separately so the race
/// against a concurrent advance is testable. `expected_turn` is the
/// (round, pick) the caller observed; if the re-read inside the transaction
/// disagrees, the turn was already consumed and the whole pick aborts.
pub async fn apply_pick(
    runtime: &Arc<DraftRuntime>,
    draft_id: i64,
    team_id: i64,
    player: &NflPlayer,
    expected_turn: (i64, i64),
) -> Result<PickReceipt, DraftError> {
    let mut tx = db::begin_write(&runtime.pool).await?;

    let draft = store::get_draft(&mut *tx, draft_id)
        .await?
        .ok_or(DraftError::NotFound("draft"))?;
    if draft.status != DraftStatus::Started
        || (draft.current_round, draft.current_pick) != expected_turn
    {
        return Err(DraftError::StaleTurn);
    }

    // Re-run the roster checks against the in-transaction state; both could
    // have changed since validation.
    if store::is_player_rostered(&mut *tx, draft.league_id, player.id).await? {
        return Err(DraftError::PlayerAlreadyRostered);
    }
    let team = store::get_team(&mut *tx, team_id)
        .await?
        .ok_or(DraftError::NotFound("team"))?;
    let slot = find_open_slot(&team.roster.0, player.position).ok_or(DraftError::RosterFull)?;

    let mut roster = team.roster.0.clone();
    roster[slot] = Some(player.id);
    store::update_team_roster(&mut *tx, team_id, &roster).await?;

    let mut pick_list = draft.pick_list.0.clone();
    pick_list.push(Some(player.id));

    let advance = advance_turn(
        draft.current_round,
        draft.current_pick,
        &draft.draft_order.0,
        draft.total_rounds,
        draft.time_per_pick,
        Utc::now(),
    );

    let receipt = match advance {
        TurnAdvance::InProgress { round, pick, next_drafter, next_pick_time } => {
            store::advance_draft_turn(&mut *tx, draft_id, round, pick, next_pick_time, &pick_list)
                .await?;
            PickReceipt {
                player_id: player.id,
                slot,
                completed: false,
                next_drafter: Some(next_drafter),
                next_pick_time: Some(next_pick_time),
            }
        }
        TurnAdvance::Completed => {
            store::complete_draft(&mut *tx, draft_id, Some(pick_list.as_slice())).await?;
            PickReceipt {
                player_id: player.id,
                slot,
                completed: true,
                next_drafter: None,
                next_pick_time: None,
            }
        }
    };

    tx.commit().await?;

    info!("draft {draft_id}: team {team_id} picked player {} into slot {slot}", player.id);

    match (receipt.next_drafter, receipt.next_pick_time) {
        (Some(next_drafter), Some(next_pick_time)) => {
            runtime
                .rooms
                .broadcast(
                    draft.league_id,
                    &DraftEvent::PlayerDrafted {
                        player_id: player.id.to_string(),
                        next_pick_time,
                        next_drafter: next_drafter.to_string(),
                    },
                )
                .await;
        }
        _ => {
            runtime
                .rooms
                .broadcast(draft.league_id, &DraftEvent::DraftEnded { next_drafter: String::new() })
                .await;
            runtime.detach_clock(draft_id).await;
        }
    }
    Ok(receipt)
}

/// Clock-driven timeout. Re-reads the draft inside a transaction and
/// no-ops if the deadline has moved (a human pick won the race). Otherwise
/// the turn is consumed with an explicit skip marker; no placeholder player
/// is ever fabricated.
pub async fn handle_timeout(
    runtime: &Arc<DraftRuntime>,
    draft_id: i64,
) -> Result<TimeoutOutcome, DraftError> {
    let mut tx = db::begin_write(&runtime.pool).await?;

    let Some(draft) = store::get_draft(&mut *tx, draft_id).await? else {
        return Ok(TimeoutOutcome::DraftComplete);
    };
    match draft.status {
        DraftStatus::Started => {}
        DraftStatus::Completed => return Ok(TimeoutOutcome::DraftComplete),
        DraftStatus::Scheduled | DraftStatus::Waiting => return Ok(TimeoutOutcome::NotDue),
    }

    let now = Utc::now();
    match draft.next_pick_time {
        Some(deadline) if now > deadline => {}
        _ => return Ok(TimeoutOutcome::NotDue),
    }

    let mut pick_list = draft.pick_list.0.clone();
    pick_list.push(None);

    let advance = advance_turn(
        draft.current_round,
        draft.current_pick,
        &draft.draft_order.0,
        draft.total_rounds,
        draft.time_per_pick,
        now,
    );

    let next = match advance {
        TurnAdvance::InProgress { round, pick, next_drafter, next_pick_time } => {
            store::advance_draft_turn(&mut *tx, draft_id, round, pick, next_pick_time, &pick_list)
                .await?;
            Some((next_drafter, next_pick_time))
        }
        TurnAdvance::Completed => {
            store::complete_draft(&mut *tx, draft_id, Some(pick_list.as_slice())).await?;
            None
        }
    };

    tx.commit().await?;

    info!(
        "draft {draft_id}: turn ({}, {}) timed out and was skipped",
        draft.current_round, draft.current_pick
    );

    match next {
        Some((next_drafter, next_pick_time)) => {
            runtime
                .rooms
                .broadcast(
                    draft.league_id,
                    &DraftEvent::PlayerDrafted {
                        player_id: String::new(),
                        next_pick_time,
                        next_drafter: next_drafter.to_string(),
                    },
                )
                .await;
            Ok(TimeoutOutcome::Skipped)
        }
        None => {
            runtime
                .rooms
                .broadcast(draft.league_id, &DraftEvent::DraftEnded { next_drafter: String::new() })
                .await;
            runtime.detach_clock(draft_id).await;
            Ok(TimeoutOutcome::DraftComplete)
        }
    }
}
