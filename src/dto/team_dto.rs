use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use crate::services::roster::ROSTER_SIZE;

/// `roster` is a fixed-length slot array; `None` marks an open slot.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub owner_id: i64,
    pub league_id: i64,
    pub roster: Json<Vec<Option<i64>>>,
    pub wins: i64,
    pub losses: i64,
    pub total_points: f64,
}

pub fn empty_roster() -> Vec<Option<i64>> {
    vec![None; ROSTER_SIZE]
}
