//! End-to-end coordinator, clock, and recovery behavior against in-memory
//! SQLite databases.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use axum::extract::{Extension, Path};

use fantasy_league_backend::db;
use fantasy_league_backend::dto::claims_dto::Claims;
use fantasy_league_backend::dto::draft_dto::DraftStatus;
use fantasy_league_backend::dto::player_dto::Position;
use fantasy_league_backend::dto::team_dto::empty_roster;
use fantasy_league_backend::errors::DraftError;
use fantasy_league_backend::routes::leagues;
use fantasy_league_backend::services::auth_user::AuthUser;
use fantasy_league_backend::services::draft_coordinator::{self, TimeoutOutcome};
use fantasy_league_backend::services::recovery;
use fantasy_league_backend::services::runtime::DraftRuntime;
use fantasy_league_backend::store;

async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    db::init_schema(&pool).await.expect("schema");
    pool
}

/// File-backed pool for tests that need transactions on separate
/// connections (each in-memory connection would be its own database).
async fn file_pool(tag: &str) -> SqlitePool {
    let path = std::env::temp_dir().join(format!("draft_flow_{tag}_{}.db", std::process::id()));
    let _ = std::fs::remove_file(&path);
    let pool = SqlitePoolOptions::new()
        .max_connections(2)
        .connect(&format!("sqlite://{}?mode=rwc", path.display()))
        .await
        .expect("file-backed sqlite");
    db::init_schema(&pool).await.expect("schema");
    pool
}

struct Fixture {
    runtime: Arc<DraftRuntime>,
    league_id: i64,
    team_ids: Vec<i64>,
    draft_id: i64,
}

/// League with `n_teams` teams and a scheduled draft. Usernames carry a
/// per-invocation suffix so repeated seeding into one database does not
/// trip the `users.username` UNIQUE constraint.
async fn seed_league(pool: &SqlitePool, n_teams: usize, total_rounds: i64) -> Fixture {
    static SEED: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);
    let seed = SEED.fetch_add(1, std::sync::atomic::Ordering::Relaxed);

    let commissioner = store::insert_user(pool, "Commish", &format!("commish{seed}"), "pw")
        .await
        .unwrap();
    let league_id = store::insert_league(pool, "Test League", commissioner, n_teams as i64)
        .await
        .unwrap();

    let mut team_ids = Vec::new();
    for i in 0..n_teams {
        let owner = if i == 0 {
            commissioner
        } else {
            store::insert_user(pool, &format!("Owner {i}"), &format!("owner{seed}_{i}"), "pw")
                .await
                .unwrap()
        };
        let team_id = store::insert_team(
            pool,
            &format!("Team {i}"),
            owner,
            league_id,
            &empty_roster(),
        )
        .await
        .unwrap();
        team_ids.push(team_id);
    }

    let draft_id = store::insert_draft(pool, league_id, Utc::now() + Duration::weeks(1), 60, total_rounds)
        .await
        .unwrap();
    store::set_league_draft(pool, league_id, draft_id).await.unwrap();

    Fixture {
        runtime: DraftRuntime::new(pool.clone()),
        league_id,
        team_ids,
        draft_id,
    }
}

/// Forces the draft into `started` with a deterministic order and deadline.
async fn force_started(
    pool: &SqlitePool,
    fixture: &Fixture,
    deadline_offset: Duration,
) {
    store::set_draft_schedule(
        pool,
        fixture.draft_id,
        &fixture.team_ids,
        DraftStatus::Started,
        Utc::now(),
        Some(Utc::now() + deadline_offset),
    )
    .await
    .unwrap();
}

async fn seed_player(pool: &SqlitePool, name: &str, position: Position) -> i64 {
    store::insert_player(pool, name, position, "FA", 0.0).await.unwrap()
}

fn event_type(raw: &str) -> String {
    let value: serde_json::Value = serde_json::from_str(raw).unwrap();
    value["type"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn timeout_skips_a_turn_exactly_once() {
    let pool = test_pool().await;
    let fixture = seed_league(&pool, 2, 2).await;
    force_started(&pool, &fixture, Duration::seconds(-1)).await;

    let outcome = draft_coordinator::handle_timeout(&fixture.runtime, fixture.draft_id)
        .await
        .unwrap();
    assert_eq!(outcome, TimeoutOutcome::Skipped);

    let draft = store::get_draft(&pool, fixture.draft_id).await.unwrap().unwrap();
    assert_eq!((draft.current_round, draft.current_pick), (1, 2));
    assert_eq!(draft.pick_list.0, vec![None]);
    assert!(draft.next_pick_time.unwrap() > Utc::now());

    // The deadline moved; an immediate second call is a no-op.
    let outcome = draft_coordinator::handle_timeout(&fixture.runtime, fixture.draft_id)
        .await
        .unwrap();
    assert_eq!(outcome, TimeoutOutcome::NotDue);

    let draft = store::get_draft(&pool, fixture.draft_id).await.unwrap().unwrap();
    assert_eq!(draft.pick_list.0.len(), 1);
}

#[tokio::test]
async fn losing_pick_aborts_without_a_second_advance() {
    let pool = test_pool().await;
    let fixture = seed_league(&pool, 2, 2).await;
    force_started(&pool, &fixture, Duration::seconds(-1)).await;

    let player_id = seed_player(&pool, "Race QB", Position::Qb).await;
    let player = store::get_player(&pool, player_id).await.unwrap().unwrap();

    let mut rx = fixture.runtime.rooms.join(fixture.league_id).await;

    // Both the human and the clock observed turn (1, 1); the clock wins.
    let draft = store::get_draft(&pool, fixture.draft_id).await.unwrap().unwrap();
    let expected_turn = (draft.current_round, draft.current_pick);

    let outcome = draft_coordinator::handle_timeout(&fixture.runtime, fixture.draft_id)
        .await
        .unwrap();
    assert_eq!(outcome, TimeoutOutcome::Skipped);

    let result = draft_coordinator::apply_pick(
        &fixture.runtime,
        fixture.draft_id,
        fixture.team_ids[0],
        &player,
        expected_turn,
    )
    .await;
    assert!(matches!(result, Err(DraftError::StaleTurn)));

    // Exactly one turn consumed and one broadcast emitted.
    let draft = store::get_draft(&pool, fixture.draft_id).await.unwrap().unwrap();
    assert_eq!(draft.pick_list.0, vec![None]);
    assert_eq!(event_type(&rx.try_recv().unwrap()), "player_drafted");
    assert!(rx.try_recv().is_err());

    // The loser never touched the roster either.
    let team = store::get_team(&pool, fixture.team_ids[0]).await.unwrap().unwrap();
    assert_eq!(team.roster.0, empty_roster());
}

#[tokio::test(flavor = "multi_thread")]
async fn pick_overlapping_a_timeout_transaction_is_rejected_cleanly() {
    let pool = file_pool("overlap").await;
    let fixture = seed_league(&pool, 2, 2).await;
    force_started(&pool, &fixture, Duration::seconds(-1)).await;

    let player_id = seed_player(&pool, "Contested QB", Position::Qb).await;

    // A timeout transaction holds the write lock on the draft...
    let mut tx = db::begin_write(&pool).await.unwrap();
    let draft = store::get_draft(&mut *tx, fixture.draft_id).await.unwrap().unwrap();
    assert_eq!((draft.current_round, draft.current_pick), (1, 1));

    // ...while a human pick for the same turn runs concurrently. It reads
    // turn (1, 1) too, then queues behind the held write lock.
    let runtime = fixture.runtime.clone();
    let draft_id = fixture.draft_id;
    let team_id = fixture.team_ids[0];
    let pick = tokio::spawn(async move {
        draft_coordinator::submit_pick(&runtime, draft_id, team_id, player_id).await
    });
    tokio::time::sleep(StdDuration::from_millis(200)).await;

    // The timeout wins the turn and commits its skip.
    store::advance_draft_turn(
        &mut *tx,
        fixture.draft_id,
        1,
        2,
        Utc::now() + Duration::seconds(62),
        &[None],
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();

    // The pick's in-transaction re-read sees the advanced turn: a clean
    // rejection, not a storage error.
    let result = pick.await.unwrap();
    assert!(matches!(result, Err(DraftError::PickRejected(_))));

    let draft = store::get_draft(&pool, fixture.draft_id).await.unwrap().unwrap();
    assert_eq!(draft.pick_list.0, vec![None]);
    let team = store::get_team(&pool, fixture.team_ids[0]).await.unwrap().unwrap();
    assert_eq!(team.roster.0, empty_roster());
}

#[tokio::test]
async fn deleting_a_league_detaches_the_clock_after_the_records_are_gone() {
    let pool = test_pool().await;
    let fixture = seed_league(&pool, 2, 2).await;
    force_started(&pool, &fixture, Duration::seconds(60)).await;
    fixture.runtime.attach_clock(fixture.draft_id, fixture.league_id).await;

    let team = store::get_team(&pool, fixture.team_ids[0]).await.unwrap().unwrap();

    // A rejected delete tears nothing down; the clock keeps running.
    let intruder = Claims { sub: "owner1".to_string(), uid: team.owner_id + 1000, exp: usize::MAX };
    let result = leagues::delete_league(
        Extension(pool.clone()),
        Extension(fixture.runtime.clone()),
        AuthUser(intruder),
        Path(fixture.league_id.to_string()),
    )
    .await;
    assert!(matches!(result, Err(DraftError::Forbidden(_))));
    assert!(fixture.runtime.has_clock(fixture.draft_id).await);

    let commissioner = Claims { sub: "commish".to_string(), uid: team.owner_id, exp: usize::MAX };
    leagues::delete_league(
        Extension(pool.clone()),
        Extension(fixture.runtime.clone()),
        AuthUser(commissioner),
        Path(fixture.league_id.to_string()),
    )
    .await
    .unwrap();

    assert!(!fixture.runtime.has_clock(fixture.draft_id).await);
    assert!(store::get_league(&pool, fixture.league_id).await.unwrap().is_none());
    assert!(store::get_draft(&pool, fixture.draft_id).await.unwrap().is_none());
    assert!(store::list_teams_by_league(&pool, fixture.league_id).await.unwrap().is_empty());

    fixture.runtime.shutdown().await;
}

#[tokio::test]
async fn submitted_pick_lands_on_roster_and_advances() {
    let pool = test_pool().await;
    let fixture = seed_league(&pool, 2, 2).await;
    force_started(&pool, &fixture, Duration::seconds(60)).await;

    let player_id = seed_player(&pool, "Starter QB", Position::Qb).await;
    let mut rx = fixture.runtime.rooms.join(fixture.league_id).await;

    let receipt = draft_coordinator::submit_pick(
        &fixture.runtime,
        fixture.draft_id,
        fixture.team_ids[0],
        player_id,
    )
    .await
    .unwrap();
    assert_eq!(receipt.slot, 0);
    assert!(!receipt.completed);
    assert_eq!(receipt.next_drafter, Some(fixture.team_ids[1]));

    let team = store::get_team(&pool, fixture.team_ids[0]).await.unwrap().unwrap();
    assert_eq!(team.roster.0[0], Some(player_id));

    let draft = store::get_draft(&pool, fixture.draft_id).await.unwrap().unwrap();
    assert_eq!(draft.pick_list.0, vec![Some(player_id)]);
    assert_eq!((draft.current_round, draft.current_pick), (1, 2));

    let raw = rx.try_recv().unwrap();
    let event: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(event["type"], "player_drafted");
    assert_eq!(event["player_id"], player_id.to_string());
    assert_eq!(event["next_drafter"], fixture.team_ids[1].to_string());
}

#[tokio::test]
async fn player_cannot_be_drafted_twice_in_a_league() {
    let pool = test_pool().await;
    let fixture = seed_league(&pool, 2, 2).await;
    force_started(&pool, &fixture, Duration::seconds(60)).await;

    let player_id = seed_player(&pool, "Hot WR", Position::Wr).await;

    draft_coordinator::submit_pick(&fixture.runtime, fixture.draft_id, fixture.team_ids[0], player_id)
        .await
        .unwrap();

    let result = draft_coordinator::submit_pick(
        &fixture.runtime,
        fixture.draft_id,
        fixture.team_ids[1],
        player_id,
    )
    .await;
    assert!(matches!(result, Err(DraftError::PlayerAlreadyRostered)));
}

#[tokio::test]
async fn qb_overflow_falls_to_bench_and_then_roster_full() {
    let pool = test_pool().await;
    let fixture = seed_league(&pool, 2, 20).await;
    force_started(&pool, &fixture, Duration::seconds(60)).await;

    // Slot 0 (QB) occupied, flex open but not QB-eligible, bench nearly full.
    let mut roster = empty_roster();
    roster[0] = Some(900);
    for slot in 9..16 {
        roster[slot] = Some(900 + slot as i64);
    }
    store::update_team_roster(&pool, fixture.team_ids[0], &roster).await.unwrap();

    let qb = seed_player(&pool, "Backup QB", Position::Qb).await;
    let receipt =
        draft_coordinator::submit_pick(&fixture.runtime, fixture.draft_id, fixture.team_ids[0], qb)
            .await
            .unwrap();
    assert_eq!(receipt.slot, 16);

    // Bench now full: the next QB has nowhere to go.
    let qb2 = seed_player(&pool, "Third QB", Position::Qb).await;
    let result =
        draft_coordinator::submit_pick(&fixture.runtime, fixture.draft_id, fixture.team_ids[0], qb2)
            .await;
    assert!(matches!(result, Err(DraftError::RosterFull)));
}

#[tokio::test]
async fn one_round_draft_completes_after_each_team_turn() {
    let pool = test_pool().await;
    let fixture = seed_league(&pool, 4, 1).await;
    force_started(&pool, &fixture, Duration::seconds(60)).await;

    let mut rx = fixture.runtime.rooms.join(fixture.league_id).await;

    // Three human picks, then a timeout consumes the final turn.
    for turn in 0..3 {
        let player_id =
            seed_player(&pool, &format!("Pick {turn}"), Position::Rb).await;
        let on_clock = fixture.team_ids[turn];
        draft_coordinator::submit_pick(&fixture.runtime, fixture.draft_id, on_clock, player_id)
            .await
            .unwrap();
    }

    store::set_draft_deadline(&pool, fixture.draft_id, Utc::now() - Duration::seconds(1))
        .await
        .unwrap();
    let outcome = draft_coordinator::handle_timeout(&fixture.runtime, fixture.draft_id)
        .await
        .unwrap();
    assert_eq!(outcome, TimeoutOutcome::DraftComplete);

    let draft = store::get_draft(&pool, fixture.draft_id).await.unwrap().unwrap();
    assert_eq!(draft.status, DraftStatus::Completed);
    assert_eq!(draft.pick_list.0.len(), 4);
    assert_eq!(draft.pick_list.0[3], None);
    assert!(draft.next_pick_time.is_none());

    let mut types = Vec::new();
    while let Ok(raw) = rx.try_recv() {
        types.push(event_type(&raw));
    }
    assert_eq!(
        types,
        vec!["player_drafted", "player_drafted", "player_drafted", "draft_ended"]
    );
}

#[tokio::test]
async fn recovery_completes_fully_picked_draft_without_a_clock() {
    let pool = test_pool().await;
    let fixture = seed_league(&pool, 2, 2).await;
    force_started(&pool, &fixture, Duration::seconds(60)).await;

    // Simulate a process killed after the final pick but before the flip:
    // four picks recorded, status still started.
    let picks = vec![Some(1), None, Some(2), None];
    store::advance_draft_turn(
        &pool,
        fixture.draft_id,
        3,
        1,
        Utc::now() + Duration::seconds(60),
        &picks,
    )
    .await
    .unwrap();

    let runtime = DraftRuntime::new(pool.clone());
    let resumed = recovery::resume_active_drafts(&runtime).await.unwrap();
    assert_eq!(resumed, 0);
    assert!(!runtime.has_clock(fixture.draft_id).await);

    let draft = store::get_draft(&pool, fixture.draft_id).await.unwrap().unwrap();
    assert_eq!(draft.status, DraftStatus::Completed);
}

#[tokio::test]
async fn recovery_reattaches_clocks_to_live_drafts() {
    let pool = test_pool().await;

    let waiting = seed_league(&pool, 2, 2).await;
    store::set_draft_schedule(
        &pool,
        waiting.draft_id,
        &waiting.team_ids,
        DraftStatus::Waiting,
        Utc::now() + Duration::hours(1),
        None,
    )
    .await
    .unwrap();

    let started = seed_league(&pool, 2, 2).await;
    force_started(&pool, &started, Duration::seconds(60)).await;

    let runtime = DraftRuntime::new(pool.clone());
    let resumed = recovery::resume_active_drafts(&runtime).await.unwrap();
    assert_eq!(resumed, 2);
    assert!(runtime.has_clock(waiting.draft_id).await);
    assert!(runtime.has_clock(started.draft_id).await);

    // Attaching again is a no-op rather than a second clock.
    runtime.attach_clock(started.draft_id, started.league_id).await;
    assert!(runtime.has_clock(started.draft_id).await);

    runtime.shutdown().await;
    assert!(!runtime.has_clock(waiting.draft_id).await);
}

#[tokio::test(flavor = "multi_thread")]
async fn clock_flips_waiting_draft_when_start_time_arrives() {
    let pool = test_pool().await;
    let fixture = seed_league(&pool, 2, 1).await;
    store::set_draft_schedule(
        &pool,
        fixture.draft_id,
        &fixture.team_ids,
        DraftStatus::Waiting,
        Utc::now() - Duration::seconds(1),
        None,
    )
    .await
    .unwrap();

    let mut rx = fixture.runtime.rooms.join(fixture.league_id).await;
    fixture.runtime.attach_clock(fixture.draft_id, fixture.league_id).await;

    // The clock polls once a second; give it a few intervals.
    let mut started = false;
    for _ in 0..50 {
        tokio::time::sleep(StdDuration::from_millis(100)).await;
        let draft = store::get_draft(&pool, fixture.draft_id).await.unwrap().unwrap();
        if draft.status == DraftStatus::Started {
            started = true;
            assert!(draft.next_pick_time.unwrap() > Utc::now());
            break;
        }
    }
    assert!(started, "clock never flipped the waiting draft");

    assert_eq!(event_type(&rx.recv().await.unwrap()), "draft_started");

    fixture.runtime.shutdown().await;
}
