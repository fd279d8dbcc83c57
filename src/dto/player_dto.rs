use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Closed set of roster positions. The mapping from a position to the
/// roster slots it may occupy lives in `services::roster`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum Position {
    Qb,
    Rb,
    Wr,
    Te,
    Def,
    K,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct NflPlayer {
    pub id: i64,
    pub name: String,
    pub position: Position,
    pub nfl_team: String,
    pub projected_points: f64,
    pub total_points: f64,
}

#[derive(Debug, Deserialize)]
pub struct CreatePlayer {
    pub name: String,
    pub position: Position,
    pub nfl_team: String,
    #[serde(default)]
    pub projected_points: f64,
}
