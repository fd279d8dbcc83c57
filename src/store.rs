//! Record-store queries. Every function takes any `SqliteExecutor` so the
//! same query can run against the pool or inside a transaction; the draft
//! coordinator relies on that to re-read documents under transaction scope.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::SqliteExecutor;

use crate::dto::draft_dto::{Draft, DraftStatus};
use crate::dto::league_dto::League;
use crate::dto::player_dto::{NflPlayer, Position};
use crate::dto::team_dto::Team;
use crate::dto::user_dto::User;

/* users */

pub async fn insert_user<'e, E: SqliteExecutor<'e>>(
    ex: E,
    name: &str,
    username: &str,
    password: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (name, username, password) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(name)
    .bind(username)
    .bind(password)
    .fetch_one(ex)
    .await
}

pub async fn get_user_by_username<'e, E: SqliteExecutor<'e>>(
    ex: E,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(ex)
        .await
}

/* leagues */

pub async fn insert_league<'e, E: SqliteExecutor<'e>>(
    ex: E,
    name: &str,
    commissioner_id: i64,
    number_of_players: i64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO leagues (name, commissioner_id, number_of_players) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(name)
    .bind(commissioner_id)
    .bind(number_of_players)
    .fetch_one(ex)
    .await
}

pub async fn set_league_draft<'e, E: SqliteExecutor<'e>>(
    ex: E,
    league_id: i64,
    draft_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE leagues SET draft_id = ? WHERE id = ?")
        .bind(draft_id)
        .bind(league_id)
        .execute(ex)
        .await?;
    Ok(())
}

pub async fn get_league<'e, E: SqliteExecutor<'e>>(
    ex: E,
    league_id: i64,
) -> Result<Option<League>, sqlx::Error> {
    sqlx::query_as::<_, League>("SELECT * FROM leagues WHERE id = ?")
        .bind(league_id)
        .fetch_optional(ex)
        .await
}

pub async fn delete_league<'e, E: SqliteExecutor<'e>>(
    ex: E,
    league_id: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM leagues WHERE id = ?")
        .bind(league_id)
        .execute(ex)
        .await?;
    Ok(result.rows_affected())
}

/* teams */

pub async fn insert_team<'e, E: SqliteExecutor<'e>>(
    ex: E,
    name: &str,
    owner_id: i64,
    league_id: i64,
    roster: &[Option<i64>],
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO teams (name, owner_id, league_id, roster) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(name)
    .bind(owner_id)
    .bind(league_id)
    .bind(Json(roster))
    .fetch_one(ex)
    .await
}

pub async fn get_team<'e, E: SqliteExecutor<'e>>(
    ex: E,
    team_id: i64,
) -> Result<Option<Team>, sqlx::Error> {
    sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE id = ?")
        .bind(team_id)
        .fetch_optional(ex)
        .await
}

pub async fn list_teams_by_league<'e, E: SqliteExecutor<'e>>(
    ex: E,
    league_id: i64,
) -> Result<Vec<Team>, sqlx::Error> {
    sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE league_id = ? ORDER BY id")
        .bind(league_id)
        .fetch_all(ex)
        .await
}

pub async fn update_team_roster<'e, E: SqliteExecutor<'e>>(
    ex: E,
    team_id: i64,
    roster: &[Option<i64>],
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE teams SET roster = ? WHERE id = ?")
        .bind(Json(roster))
        .bind(team_id)
        .execute(ex)
        .await?;
    Ok(())
}

pub async fn user_has_team_in_league<'e, E: SqliteExecutor<'e>>(
    ex: E,
    league_id: i64,
    owner_id: i64,
) -> Result<bool, sqlx::Error> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM teams WHERE league_id = ? AND owner_id = ?",
    )
    .bind(league_id)
    .bind(owner_id)
    .fetch_one(ex)
    .await?;
    Ok(count > 0)
}

pub async fn delete_teams_by_league<'e, E: SqliteExecutor<'e>>(
    ex: E,
    league_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM teams WHERE league_id = ?")
        .bind(league_id)
        .execute(ex)
        .await?;
    Ok(())
}

/* players */

pub async fn insert_player<'e, E: SqliteExecutor<'e>>(
    ex: E,
    name: &str,
    position: Position,
    nfl_team: &str,
    projected_points: f64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO players (name, position, nfl_team, projected_points) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(name)
    .bind(position)
    .bind(nfl_team)
    .bind(projected_points)
    .fetch_one(ex)
    .await
}

pub async fn get_player<'e, E: SqliteExecutor<'e>>(
    ex: E,
    player_id: i64,
) -> Result<Option<NflPlayer>, sqlx::Error> {
    sqlx::query_as::<_, NflPlayer>("SELECT * FROM players WHERE id = ?")
        .bind(player_id)
        .fetch_optional(ex)
        .await
}

pub async fn list_players<'e, E: SqliteExecutor<'e>>(ex: E) -> Result<Vec<NflPlayer>, sqlx::Error> {
    sqlx::query_as::<_, NflPlayer>("SELECT * FROM players ORDER BY projected_points DESC")
        .fetch_all(ex)
        .await
}

/// Players not yet on any roster in the league.
pub async fn list_available_players<'e, E: SqliteExecutor<'e>>(
    ex: E,
    league_id: i64,
) -> Result<Vec<NflPlayer>, sqlx::Error> {
    sqlx::query_as::<_, NflPlayer>(
        r#"
        SELECT p.* FROM players p
        WHERE NOT EXISTS (
            SELECT 1 FROM teams t, json_each(t.roster) slot
            WHERE t.league_id = ? AND slot.value = p.id
        )
        ORDER BY p.projected_points DESC
        "#,
    )
    .bind(league_id)
    .fetch_all(ex)
    .await
}

/// Cross-team uniqueness check: is the player on any roster in the league?
pub async fn is_player_rostered<'e, E: SqliteExecutor<'e>>(
    ex: E,
    league_id: i64,
    player_id: i64,
) -> Result<bool, sqlx::Error> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM teams t, json_each(t.roster) slot
        WHERE t.league_id = ? AND slot.value = ?
        "#,
    )
    .bind(league_id)
    .bind(player_id)
    .fetch_one(ex)
    .await?;
    Ok(count > 0)
}

/* drafts */

pub async fn insert_draft<'e, E: SqliteExecutor<'e>>(
    ex: E,
    league_id: i64,
    start_time: DateTime<Utc>,
    time_per_pick: i64,
    total_rounds: i64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO drafts
            (league_id, draft_order, status, start_time, next_pick_time,
             time_per_pick, current_round, current_pick, total_rounds, pick_list)
        VALUES (?, '[]', ?, ?, NULL, ?, 1, 1, ?, '[]')
        RETURNING id
        "#,
    )
    .bind(league_id)
    .bind(DraftStatus::Scheduled)
    .bind(start_time)
    .bind(time_per_pick)
    .bind(total_rounds)
    .fetch_one(ex)
    .await
}

pub async fn get_draft<'e, E: SqliteExecutor<'e>>(
    ex: E,
    draft_id: i64,
) -> Result<Option<Draft>, sqlx::Error> {
    sqlx::query_as::<_, Draft>("SELECT * FROM drafts WHERE id = ?")
        .bind(draft_id)
        .fetch_optional(ex)
        .await
}

pub async fn get_draft_by_league<'e, E: SqliteExecutor<'e>>(
    ex: E,
    league_id: i64,
) -> Result<Option<Draft>, sqlx::Error> {
    sqlx::query_as::<_, Draft>("SELECT * FROM drafts WHERE league_id = ?")
        .bind(league_id)
        .fetch_optional(ex)
        .await
}

pub async fn list_drafts_by_status<'e, E: SqliteExecutor<'e>>(
    ex: E,
    statuses: &[DraftStatus],
) -> Result<Vec<Draft>, sqlx::Error> {
    let placeholders = vec!["?"; statuses.len()].join(", ");
    let sql = format!("SELECT * FROM drafts WHERE status IN ({placeholders})");
    let mut query = sqlx::query_as::<_, Draft>(&sql);
    for status in statuses {
        query = query.bind(*status);
    }
    query.fetch_all(ex).await
}

/// Writes the randomized order and the scheduled/immediate start decision.
pub async fn set_draft_schedule<'e, E: SqliteExecutor<'e>>(
    ex: E,
    draft_id: i64,
    draft_order: &[i64],
    status: DraftStatus,
    start_time: DateTime<Utc>,
    next_pick_time: Option<DateTime<Utc>>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE drafts
        SET draft_order = ?, status = ?, start_time = ?, next_pick_time = ?,
            current_round = 1, current_pick = 1
        WHERE id = ?
        "#,
    )
    .bind(Json(draft_order))
    .bind(status)
    .bind(start_time)
    .bind(next_pick_time)
    .bind(draft_id)
    .execute(ex)
    .await?;
    Ok(())
}

pub async fn set_draft_start_time<'e, E: SqliteExecutor<'e>>(
    ex: E,
    draft_id: i64,
    start_time: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE drafts SET start_time = ? WHERE id = ?")
        .bind(start_time)
        .bind(draft_id)
        .execute(ex)
        .await?;
    Ok(())
}

pub async fn set_draft_deadline<'e, E: SqliteExecutor<'e>>(
    ex: E,
    draft_id: i64,
    next_pick_time: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE drafts SET next_pick_time = ? WHERE id = ?")
        .bind(next_pick_time)
        .bind(draft_id)
        .execute(ex)
        .await?;
    Ok(())
}

pub async fn mark_draft_started<'e, E: SqliteExecutor<'e>>(
    ex: E,
    draft_id: i64,
    next_pick_time: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE drafts
        SET status = ?, current_round = 1, current_pick = 1, next_pick_time = ?
        WHERE id = ?
        "#,
    )
    .bind(DraftStatus::Started)
    .bind(next_pick_time)
    .bind(draft_id)
    .execute(ex)
    .await?;
    Ok(())
}

/// One committed turn: new position, new deadline, grown pick list.
pub async fn advance_draft_turn<'e, E: SqliteExecutor<'e>>(
    ex: E,
    draft_id: i64,
    current_round: i64,
    current_pick: i64,
    next_pick_time: DateTime<Utc>,
    pick_list: &[Option<i64>],
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE drafts
        SET current_round = ?, current_pick = ?, next_pick_time = ?, pick_list = ?
        WHERE id = ?
        "#,
    )
    .bind(current_round)
    .bind(current_pick)
    .bind(next_pick_time)
    .bind(Json(pick_list))
    .bind(draft_id)
    .execute(ex)
    .await?;
    Ok(())
}

pub async fn complete_draft<'e, E: SqliteExecutor<'e>>(
    ex: E,
    draft_id: i64,
    pick_list: Option<&[Option<i64>]>,
) -> Result<(), sqlx::Error> {
    match pick_list {
        Some(picks) => {
            sqlx::query(
                "UPDATE drafts SET status = ?, next_pick_time = NULL, pick_list = ? WHERE id = ?",
            )
            .bind(DraftStatus::Completed)
            .bind(Json(picks))
            .bind(draft_id)
            .execute(ex)
            .await?;
        }
        None => {
            sqlx::query("UPDATE drafts SET status = ?, next_pick_time = NULL WHERE id = ?")
                .bind(DraftStatus::Completed)
                .bind(draft_id)
                .execute(ex)
                .await?;
        }
    }
    Ok(())
}

pub async fn delete_draft<'e, E: SqliteExecutor<'e>>(
    ex: E,
    draft_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM drafts WHERE id = ?")
        .bind(draft_id)
        .execute(ex)
        .await?;
    Ok(())
}
