use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

/// Error taxonomy for the draft subsystem and the thin CRUD layer around it.
///
/// `StaleTurn` is internal: the coordinator swallows it on the timeout path
/// and converts it to `PickRejected` for a human pick that lost the race.
#[derive(Debug, Error)]
pub enum DraftError {
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("player is already rostered in this league")]
    PlayerAlreadyRostered,

    #[error("no open roster slot for this position")]
    RosterFull,

    #[error("turn already advanced")]
    StaleTurn,

    #[error("pick rejected: {0}")]
    PickRejected(&'static str),

    #[error("draft has already been started")]
    AlreadyStarted,

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

pub fn parse_id(raw: &str) -> Result<i64, DraftError> {
    raw.parse::<i64>()
        .map_err(|_| DraftError::InvalidIdentifier(raw.to_string()))
}

impl IntoResponse for DraftError {
    fn into_response(self) -> Response {
        let status = match &self {
            DraftError::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
            DraftError::NotFound(_) => StatusCode::NOT_FOUND,
            DraftError::PlayerAlreadyRostered
            | DraftError::RosterFull
            | DraftError::StaleTurn
            | DraftError::PickRejected(_)
            | DraftError::AlreadyStarted => StatusCode::CONFLICT,
            DraftError::Forbidden(_) => StatusCode::FORBIDDEN,
            DraftError::Storage(e) => {
                error!("storage error: {e}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, self.to_string()).into_response()
    }
}
