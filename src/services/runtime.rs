//! Process-wide draft runtime: the connection pool, the broadcast rooms,
//! and the registry of live clock tasks. Built once in `main` (or per test)
//! and passed explicitly; there are no global singletons.
//!
//! The clock map is only a local guard against attaching two clocks to the
//! same draft in this process. Turn-race correctness comes from the
//! coordinator's transactional re-reads, never from this map.

use std::collections::HashMap;
use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::services::draft_clock;
use crate::services::room_registry::RoomRegistry;

struct ClockHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

pub struct DraftRuntime {
    pub pool: SqlitePool,
    pub rooms: RoomRegistry,
    clocks: Mutex<HashMap<i64, ClockHandle>>,
}

impl DraftRuntime {
    pub fn new(pool: SqlitePool) -> Arc<Self> {
        Arc::new(Self {
            pool,
            rooms: RoomRegistry::new(),
            clocks: Mutex::new(HashMap::new()),
        })
    }

    /// Spawns the polling clock for a draft. A second attach for the same
    /// draft is a no-op.
    pub async fn attach_clock(self: &Arc<Self>, draft_id: i64, league_id: i64) {
        let mut clocks = self.clocks.lock().await;
        if clocks.contains_key(&draft_id) {
            return;
        }

        let cancel = CancellationToken::new();
        let task = draft_clock::spawn_clock(self.clone(), draft_id, league_id, cancel.clone());
        clocks.insert(draft_id, ClockHandle { cancel, task });
        info!("attached clock for draft {draft_id}");
    }

    /// Cancels a draft's clock. Idempotent. Cancellation stops new polls
    /// immediately; a poll already inside a transaction runs to completion
    /// because the token is only checked between polls.
    pub async fn detach_clock(&self, draft_id: i64) {
        if let Some(handle) = self.clocks.lock().await.remove(&draft_id) {
            handle.cancel.cancel();
            info!("detached clock for draft {draft_id}");
        }
    }

    pub async fn has_clock(&self, draft_id: i64) -> bool {
        self.clocks.lock().await.contains_key(&draft_id)
    }

    /// Called by a clock task when its draft reaches a terminal state.
    pub(crate) async fn release_clock(&self, draft_id: i64) {
        self.clocks.lock().await.remove(&draft_id);
    }

    /// Cancels every clock and waits for the tasks to wind down.
    pub async fn shutdown(&self) {
        let handles: Vec<ClockHandle> = {
            let mut clocks = self.clocks.lock().await;
            clocks.drain().map(|(_, handle)| handle).collect()
        };

        for handle in handles {
            handle.cancel.cancel();
            let _ = handle.task.await;
        }
    }
}
