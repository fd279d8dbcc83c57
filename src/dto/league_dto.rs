use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct League {
    pub id: i64,
    pub name: String,
    pub commissioner_id: i64,
    pub number_of_players: i64,
    pub draft_id: Option<i64>,
}

fn default_time_per_pick() -> i64 {
    60
}

fn default_total_rounds() -> i64 {
    17
}

#[derive(Debug, Deserialize)]
pub struct CreateLeague {
    pub name: String,
    pub team_name: String,
    pub number_of_players: i64,
    #[serde(default = "default_time_per_pick")]
    pub time_per_pick: i64,
    #[serde(default = "default_total_rounds")]
    pub total_rounds: i64,
}

#[derive(Debug, Deserialize)]
pub struct JoinLeague {
    pub league_id: String,
    pub team_name: String,
}
