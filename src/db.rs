use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Sqlite, SqlitePool, Transaction};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    username TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS leagues (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    commissioner_id INTEGER NOT NULL,
    number_of_players INTEGER NOT NULL,
    draft_id INTEGER
);

CREATE TABLE IF NOT EXISTS teams (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    owner_id INTEGER NOT NULL,
    league_id INTEGER NOT NULL,
    roster TEXT NOT NULL,
    wins INTEGER NOT NULL DEFAULT 0,
    losses INTEGER NOT NULL DEFAULT 0,
    total_points REAL NOT NULL DEFAULT 0.0
);

CREATE TABLE IF NOT EXISTS players (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    position TEXT NOT NULL,
    nfl_team TEXT NOT NULL,
    projected_points REAL NOT NULL DEFAULT 0.0,
    total_points REAL NOT NULL DEFAULT 0.0
);

CREATE TABLE IF NOT EXISTS drafts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    league_id INTEGER NOT NULL,
    draft_order TEXT NOT NULL,
    status TEXT NOT NULL,
    start_time TEXT NOT NULL,
    next_pick_time TEXT,
    time_per_pick INTEGER NOT NULL,
    current_round INTEGER NOT NULL,
    current_pick INTEGER NOT NULL,
    total_rounds INTEGER NOT NULL,
    pick_list TEXT NOT NULL
);
"#;

pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
}

/// Creates the schema if it does not exist yet. Also used by the test
/// suites against in-memory databases.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}

/// Write-intent transaction (`BEGIN IMMEDIATE`). A deferred transaction
/// only takes the write lock at its first write, so two overlapping writers
/// that both read first would deadlock into a busy error; taking the lock
/// at begin makes overlapping writers queue, and every transaction's
/// re-read observes committed state.
pub async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
    pool.begin_with("BEGIN IMMEDIATE").await
}
