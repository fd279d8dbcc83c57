use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// Draft lifecycle. Transitions are monotonic; there is no way back.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum DraftStatus {
    Scheduled,
    Waiting,
    Started,
    Completed,
}

/// Aggregate root of the draft subsystem.
///
/// `draft_order` is fixed once the draft starts. `pick_list` is append-only;
/// a `None` entry records a turn that timed out and was skipped. Its length
/// is the authoritative count of completed turns.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Draft {
    pub id: i64,
    pub league_id: i64,
    pub draft_order: Json<Vec<i64>>,
    pub status: DraftStatus,
    pub start_time: DateTime<Utc>,
    pub next_pick_time: Option<DateTime<Utc>>,
    pub time_per_pick: i64,
    pub current_round: i64,
    pub current_pick: i64,
    pub total_rounds: i64,
    pub pick_list: Json<Vec<Option<i64>>>,
}

impl Draft {
    pub fn participants(&self) -> i64 {
        self.draft_order.0.len() as i64
    }

    pub fn total_picks(&self) -> i64 {
        self.total_rounds * self.participants()
    }
}

/// Events fanned out to a league room. `player_id` is empty for a
/// timeout skip; `next_drafter` is empty once the draft has ended.
#[derive(Debug, Serialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DraftEvent {
    DraftStarted {
        next_pick_time: DateTime<Utc>,
    },
    PlayerDrafted {
        player_id: String,
        next_pick_time: DateTime<Utc>,
        next_drafter: String,
    },
    DraftEnded {
        next_drafter: String,
    },
}

#[derive(Debug, Deserialize, Default)]
pub struct StartDraft {
    /// Omit to start immediately.
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct DraftTimeUpdate {
    pub new_start_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct PlayerDraftRequest {
    pub player_id: String,
}

#[derive(Debug, Serialize)]
pub struct PickReceipt {
    pub player_id: i64,
    pub slot: usize,
    pub completed: bool,
    pub next_drafter: Option<i64>,
    pub next_pick_time: Option<DateTime<Utc>>,
}
