use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fantasy_league_backend::config::Config;
use fantasy_league_backend::db;
use fantasy_league_backend::routes::{draft, leagues, players, teams, users};
use fantasy_league_backend::services::recovery;
use fantasy_league_backend::services::runtime::DraftRuntime;
use fantasy_league_backend::services::websocket;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Arc::new(Config::from_env());

    let pool = db::connect(&config.database_url)
        .await
        .expect("Could not connect to SQLite");
    db::init_schema(&pool).await.expect("Could not initialize schema");

    info!("Connected to sqlite database.");

    let runtime = DraftRuntime::new(pool.clone());
    let resumed = recovery::resume_active_drafts(&runtime)
        .await
        .expect("Could not resume active drafts");
    info!("Resumed {resumed} active draft(s) from the database.");

    let app = Router::new()
        .route("/users", post(users::create_user))
        .route("/users/login", post(users::login_user))
        .route("/leagues", post(leagues::create_league))
        .route("/leagues/join", post(leagues::join_league))
        .route("/leagues/{league_id}", get(leagues::get_league).delete(leagues::delete_league))
        .route("/leagues/{league_id}/teams", get(teams::get_teams))
        .route("/leagues/{league_id}/players/available", get(players::get_available_players))
        .route("/leagues/{league_id}/teams/{team_id}/draft", post(draft::draft_player))
        .route("/teams/{team_id}", get(teams::get_team))
        .route("/players", get(players::get_players).post(players::create_player))
        .route("/players/{player_id}", get(players::get_player))
        .route("/drafts/{draft_id}", get(draft::get_draft))
        .route("/drafts/{draft_id}/start", post(draft::start_draft))
        .route("/drafts/{draft_id}/schedule", post(draft::update_draft_time))
        .route("/ws/{league_id}", get(websocket::websocket_handler))
        .layer(Extension(pool))
        .layer(Extension(runtime.clone()))
        .layer(Extension(config.clone()))
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await.unwrap();
    info!("Started server.");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .unwrap();

    // Let in-flight clock transactions finish before the process exits.
    runtime.shutdown().await;
}
