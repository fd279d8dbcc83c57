pub mod config;
pub mod db;
pub mod errors;

pub mod dto {
    pub mod claims_dto;
    pub mod draft_dto;
    pub mod league_dto;
    pub mod player_dto;
    pub mod team_dto;
    pub mod user_dto;
}

pub mod store;

pub mod routes {
    pub mod draft;
    pub mod leagues;
    pub mod players;
    pub mod teams;
    pub mod users;
}

pub mod services {
    pub mod auth_user;
    pub mod draft_clock;
    pub mod draft_coordinator;
    pub mod pick_advancer;
    pub mod recovery;
    pub mod room_registry;
    pub mod roster;
    pub mod runtime;
    pub mod websocket;
}
