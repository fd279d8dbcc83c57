use axum::{
    extract::{Extension, Path},
    Json,
};
use sqlx::SqlitePool;

use crate::dto::team_dto::Team;
use crate::errors::{parse_id, DraftError};
use crate::store;

/**
 * GET request to get all the teams of a league.
 */
pub async fn get_teams(
    Extension(pool): Extension<SqlitePool>,
    Path(league_id): Path<String>,
) -> Result<Json<Vec<Team>>, DraftError> {
    let league_id = parse_id(&league_id)?;
    if store::get_league(&pool, league_id).await?.is_none() {
        return Err(DraftError::NotFound("league"));
    }
    let teams = store::list_teams_by_league(&pool, league_id).await?;
    Ok(Json(teams))
}

pub async fn get_team(
    Extension(pool): Extension<SqlitePool>,
    Path(team_id): Path<String>,
) -> Result<Json<Team>, DraftError> {
    let team_id = parse_id(&team_id)?;
    let team = store::get_team(&pool, team_id)
        .await?
        .ok_or(DraftError::NotFound("team"))?;
    Ok(Json(team))
}
