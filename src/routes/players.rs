use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sqlx::SqlitePool;
use tracing::{error, info};

use crate::dto::player_dto::{CreatePlayer, NflPlayer};
use crate::errors::{parse_id, DraftError};
use crate::store;

/**
 * GET the full player pool, best projections first.
 */
pub async fn get_players(Extension(pool): Extension<SqlitePool>) -> impl IntoResponse {
    match store::list_players(&pool).await {
        Ok(players) => (StatusCode::OK, Json(players)),
        Err(e) => {
            error!("DB query error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(Vec::<NflPlayer>::new()))
        }
    }
}

pub async fn get_player(
    Extension(pool): Extension<SqlitePool>,
    Path(player_id): Path<String>,
) -> Result<Json<NflPlayer>, DraftError> {
    let player_id = parse_id(&player_id)?;
    let player = store::get_player(&pool, player_id)
        .await?
        .ok_or(DraftError::NotFound("player"))?;
    Ok(Json(player))
}

/**
 * GET the players a league can still draft (not on any roster there).
 */
pub async fn get_available_players(
    Extension(pool): Extension<SqlitePool>,
    Path(league_id): Path<String>,
) -> Result<Json<Vec<NflPlayer>>, DraftError> {
    let league_id = parse_id(&league_id)?;
    if store::get_league(&pool, league_id).await?.is_none() {
        return Err(DraftError::NotFound("league"));
    }
    let players = store::list_available_players(&pool, league_id).await?;
    Ok(Json(players))
}

/**
 * POST a player into the pool.
 */
pub async fn create_player(
    Extension(pool): Extension<SqlitePool>,
    Json(payload): Json<CreatePlayer>,
) -> Result<Json<NflPlayer>, DraftError> {
    info!("Adding player {} to the pool.", payload.name);

    let player_id = store::insert_player(
        &pool,
        &payload.name,
        payload.position,
        &payload.nfl_team,
        payload.projected_points,
    )
    .await?;

    let player = store::get_player(&pool, player_id)
        .await?
        .ok_or(DraftError::NotFound("player"))?;
    Ok(Json(player))
}
