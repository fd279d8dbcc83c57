use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    Json,
};
use sqlx::SqlitePool;
use tracing::info;

use crate::dto::draft_dto::{
    Draft, DraftStatus, DraftTimeUpdate, PickReceipt, PlayerDraftRequest, StartDraft,
};
use crate::errors::{parse_id, DraftError};
use crate::services::auth_user::AuthUser;
use crate::services::draft_coordinator;
use crate::services::runtime::DraftRuntime;
use crate::store;

pub async fn get_draft(
    Extension(pool): Extension<SqlitePool>,
    Path(draft_id): Path<String>,
) -> Result<Json<Draft>, DraftError> {
    let draft_id = parse_id(&draft_id)?;
    let draft = store::get_draft(&pool, draft_id)
        .await?
        .ok_or(DraftError::NotFound("draft"))?;
    Ok(Json(draft))
}

/**
 * POST request to start a draft. Omitting the body (or the start time)
 * starts it right away; a future start time parks it in waiting and the
 * clock flips it over when the time comes. Commissioner only.
 */
pub async fn start_draft(
    Extension(runtime): Extension<Arc<DraftRuntime>>,
    AuthUser(claims): AuthUser,
    Path(draft_id): Path<String>,
    payload: Option<Json<StartDraft>>,
) -> Result<Json<Draft>, DraftError> {
    let draft_id = parse_id(&draft_id)?;
    info!("Starting draft {}.", draft_id);

    let draft = store::get_draft(&runtime.pool, draft_id)
        .await?
        .ok_or(DraftError::NotFound("draft"))?;
    let league = store::get_league(&runtime.pool, draft.league_id)
        .await?
        .ok_or(DraftError::NotFound("league"))?;
    if league.commissioner_id != claims.uid {
        return Err(DraftError::Forbidden("only the commissioner can start the draft"));
    }

    let start_time = payload.and_then(|Json(body)| body.start_time);
    let draft = draft_coordinator::start_draft(&runtime, draft_id, start_time).await?;
    Ok(Json(draft))
}

/**
 * POST request to move the start time of a draft that has not begun.
 */
pub async fn update_draft_time(
    Extension(runtime): Extension<Arc<DraftRuntime>>,
    AuthUser(claims): AuthUser,
    Path(draft_id): Path<String>,
    Json(payload): Json<DraftTimeUpdate>,
) -> Result<Json<Draft>, DraftError> {
    let draft_id = parse_id(&draft_id)?;

    let draft = store::get_draft(&runtime.pool, draft_id)
        .await?
        .ok_or(DraftError::NotFound("draft"))?;
    match draft.status {
        DraftStatus::Scheduled | DraftStatus::Waiting => {}
        DraftStatus::Started | DraftStatus::Completed => {
            return Err(DraftError::AlreadyStarted);
        }
    }

    let league = store::get_league(&runtime.pool, draft.league_id)
        .await?
        .ok_or(DraftError::NotFound("league"))?;
    if league.commissioner_id != claims.uid {
        return Err(DraftError::Forbidden("only the commissioner can reschedule the draft"));
    }

    store::set_draft_start_time(&runtime.pool, draft_id, payload.new_start_time).await?;
    info!("Draft {} rescheduled to {}.", draft_id, payload.new_start_time);

    let draft = store::get_draft(&runtime.pool, draft_id)
        .await?
        .ok_or(DraftError::NotFound("draft"))?;
    Ok(Json(draft))
}

/**
 * POST request for a team's turn pick. The coordinator settles any race
 * against the timeout clock inside its transaction.
 */
pub async fn draft_player(
    Extension(runtime): Extension<Arc<DraftRuntime>>,
    AuthUser(claims): AuthUser,
    Path((league_id, team_id)): Path<(String, String)>,
    Json(payload): Json<PlayerDraftRequest>,
) -> Result<Json<PickReceipt>, DraftError> {
    let league_id = parse_id(&league_id)?;
    let team_id = parse_id(&team_id)?;
    let player_id = parse_id(&payload.player_id)?;

    let team = store::get_team(&runtime.pool, team_id)
        .await?
        .ok_or(DraftError::NotFound("team"))?;
    if team.owner_id != claims.uid {
        return Err(DraftError::Forbidden("you do not have permission to pick for this team"));
    }

    let draft = store::get_draft_by_league(&runtime.pool, league_id)
        .await?
        .ok_or(DraftError::NotFound("draft"))?;

    let receipt = draft_coordinator::submit_pick(&runtime, draft.id, team_id, player_id).await?;
    Ok(Json(receipt))
}
