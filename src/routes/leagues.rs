use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    Json,
};
use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use tracing::info;

use crate::db;
use crate::dto::draft_dto::DraftStatus;
use crate::dto::league_dto::{CreateLeague, JoinLeague, League};
use crate::dto::team_dto::empty_roster;
use crate::errors::{parse_id, DraftError};
use crate::services::auth_user::AuthUser;
use crate::services::runtime::DraftRuntime;
use crate::store;

/**
 * POST request to create a league. Also creates the commissioner's team
 * and the league's draft (scheduled a week out by default) in one
 * transaction.
 */
pub async fn create_league(
    Extension(pool): Extension<SqlitePool>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<CreateLeague>,
) -> Result<Json<League>, DraftError> {
    info!("Creating league {} for user {}.", payload.name, claims.sub);

    if payload.number_of_players < 1 {
        return Err(DraftError::PickRejected("league needs at least one team"));
    }

    let mut tx = db::begin_write(&pool).await?;

    let league_id =
        store::insert_league(&mut *tx, &payload.name, claims.uid, payload.number_of_players)
            .await?;
    store::insert_team(&mut *tx, &payload.team_name, claims.uid, league_id, &empty_roster())
        .await?;

    let draft_id = store::insert_draft(
        &mut *tx,
        league_id,
        Utc::now() + Duration::weeks(1),
        payload.time_per_pick,
        payload.total_rounds,
    )
    .await?;
    store::set_league_draft(&mut *tx, league_id, draft_id).await?;

    tx.commit().await?;

    let league = store::get_league(&pool, league_id)
        .await?
        .ok_or(DraftError::NotFound("league"))?;
    Ok(Json(league))
}

/**
 * POST request to join a league with a new team. Only possible while the
 * draft is still scheduled.
 */
pub async fn join_league(
    Extension(pool): Extension<SqlitePool>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<JoinLeague>,
) -> Result<Json<League>, DraftError> {
    let league_id = parse_id(&payload.league_id)?;

    let mut tx = db::begin_write(&pool).await?;

    let league = store::get_league(&mut *tx, league_id)
        .await?
        .ok_or(DraftError::NotFound("league"))?;

    let draft_id = league.draft_id.ok_or(DraftError::NotFound("draft"))?;
    let draft = store::get_draft(&mut *tx, draft_id)
        .await?
        .ok_or(DraftError::NotFound("draft"))?;
    if draft.status != DraftStatus::Scheduled {
        return Err(DraftError::AlreadyStarted);
    }

    if store::user_has_team_in_league(&mut *tx, league_id, claims.uid).await? {
        return Err(DraftError::PickRejected("you already have a team in this league"));
    }

    let teams = store::list_teams_by_league(&mut *tx, league_id).await?;
    if teams.len() as i64 >= league.number_of_players {
        return Err(DraftError::PickRejected("league is full"));
    }

    store::insert_team(&mut *tx, &payload.team_name, claims.uid, league_id, &empty_roster())
        .await?;
    tx.commit().await?;

    info!("User {} joined league {}.", claims.sub, league_id);
    Ok(Json(league))
}

pub async fn get_league(
    Extension(pool): Extension<SqlitePool>,
    Path(league_id): Path<String>,
) -> Result<Json<League>, DraftError> {
    let league_id = parse_id(&league_id)?;
    let league = store::get_league(&pool, league_id)
        .await?
        .ok_or(DraftError::NotFound("league"))?;
    Ok(Json(league))
}

/**
 * DELETE request to remove a league along with its teams and draft. Once
 * the deletes commit, the draft's clock is detached and the spectator
 * room is closed.
 */
pub async fn delete_league(
    Extension(pool): Extension<SqlitePool>,
    Extension(runtime): Extension<Arc<DraftRuntime>>,
    AuthUser(claims): AuthUser,
    Path(league_id): Path<String>,
) -> Result<Json<String>, DraftError> {
    let league_id = parse_id(&league_id)?;

    let league = store::get_league(&pool, league_id)
        .await?
        .ok_or(DraftError::NotFound("league"))?;
    if league.commissioner_id != claims.uid {
        return Err(DraftError::Forbidden("only the commissioner can remove the league"));
    }

    let mut tx = db::begin_write(&pool).await?;
    if let Some(draft_id) = league.draft_id {
        store::delete_draft(&mut *tx, draft_id).await?;
    }
    store::delete_teams_by_league(&mut *tx, league_id).await?;
    store::delete_league(&mut *tx, league_id).await?;
    tx.commit().await?;

    // Only after the deletes are committed; a failed transaction must not
    // leave a live draft without its clock or spectators.
    if let Some(draft_id) = league.draft_id {
        runtime.detach_clock(draft_id).await;
    }
    runtime.rooms.close(league_id).await;

    info!("League {} was removed.", league_id);
    Ok(Json(format!("League {} was successfully removed.", league.name)))
}
