//! Per-league broadcast rooms. Each room is a `tokio::sync::broadcast`
//! channel; spectators subscribe on websocket upgrade. Delivery is
//! best-effort: a room with no subscribers swallows the event, and a
//! subscriber that stops draining simply lags out and disconnects itself
//! without affecting the rest of the room.

use std::collections::HashMap;

use tokio::sync::broadcast;
use tokio::sync::RwLock;
use tracing::error;

use crate::dto::draft_dto::DraftEvent;

const ROOM_CAPACITY: usize = 64;

#[derive(Default)]
pub struct RoomRegistry {
    rooms: RwLock<HashMap<i64, broadcast::Sender<String>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes a new spectator to the league room, creating the room on
    /// first join.
    pub async fn join(&self, league_id: i64) -> broadcast::Receiver<String> {
        let mut rooms = self.rooms.write().await;
        rooms
            .entry(league_id)
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .subscribe()
    }

    /// Garbage-collects the room once its last spectator is gone. Callers
    /// drop their receiver first, then call this.
    pub async fn leave(&self, league_id: i64) {
        let mut rooms = self.rooms.write().await;
        if let Some(tx) = rooms.get(&league_id) {
            if tx.receiver_count() == 0 {
                rooms.remove(&league_id);
            }
        }
    }

    /// Drops the room entirely, e.g. when its league is deleted.
    pub async fn close(&self, league_id: i64) {
        self.rooms.write().await.remove(&league_id);
    }

    /// Fans an event out to every spectator in the room. Never fails: an
    /// empty or missing room is a silent no-op.
    pub async fn broadcast(&self, league_id: i64, event: &DraftEvent) {
        let rooms = self.rooms.read().await;
        let Some(tx) = rooms.get(&league_id) else {
            return;
        };

        match serde_json::to_string(event) {
            Ok(json) => {
                let _ = tx.send(json);
            }
            Err(e) => {
                error!("failed to serialize draft event: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn leave_prunes_the_room_once_its_last_receiver_is_gone() {
        let rooms = RoomRegistry::new();
        let rx = rooms.join(1).await;

        // The receiver lives inside the connection's send task; teardown
        // awaits the aborted task before calling leave.
        let task = tokio::spawn(async move {
            let mut rx = rx;
            let _ = rx.recv().await;
        });
        task.abort();
        let _ = task.await;

        rooms.leave(1).await;
        assert!(!rooms.rooms.read().await.contains_key(&1));
    }

    #[tokio::test]
    async fn leave_keeps_the_room_while_other_receivers_remain() {
        let rooms = RoomRegistry::new();
        let _rx1 = rooms.join(2).await;
        let rx2 = rooms.join(2).await;

        drop(rx2);
        rooms.leave(2).await;
        assert!(rooms.rooms.read().await.contains_key(&2));
    }
}
