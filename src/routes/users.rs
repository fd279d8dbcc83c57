use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use sqlx::SqlitePool;
use tracing::error;

use crate::config::Config;
use crate::dto::claims_dto::Claims;
use crate::dto::user_dto::{CreateUser, LoginUser};
use crate::store;

pub async fn create_user(
    Extension(pool): Extension<SqlitePool>,
    Json(payload): Json<CreateUser>
) -> impl IntoResponse {
    /* First check if the user with that user name already exists */
    match store::get_user_by_username(&pool, &payload.username).await {
        Ok(Some(_)) => {
            (StatusCode::CONFLICT, format!("That username already exists"))
        }
        Ok(None) => {
            match store::insert_user(&pool, &payload.name, &payload.username, &payload.password).await {
                Ok(_) => {
                    (StatusCode::OK, format!("Successfully created user \"{}\"", payload.username))
                }
                Err(e) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, format!("Could not create user in database: {}", e))
                }
            }
        }
        Err(e) => {
            error!("There was an error with the database {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("There was a database issue."))
        }
    }
}

/* POST to login the user */
pub async fn login_user(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Arc<Config>>,
    Json(payload): Json<LoginUser>,
) -> impl IntoResponse {
    match store::get_user_by_username(&pool, &payload.username).await {
        Ok(Some(user)) => {
            if payload.password == user.password {
                let claims = Claims {
                    sub: user.username.clone(),
                    uid: user.id,
                    exp: (Utc::now() + chrono::Duration::hours(24)).timestamp() as usize
                };

                match encode(
                    &Header::default(),
                    &claims,
                    &EncodingKey::from_secret(config.jwt_secret.as_ref())
                ) {
                    Ok(token) => (StatusCode::OK, Json(token)),
                    Err(e) => {
                        error!("Token encoding failed: {:?}", e);
                        (StatusCode::INTERNAL_SERVER_ERROR, Json("Could not issue a token.".to_string()))
                    }
                }
            }
            else {
                (StatusCode::UNAUTHORIZED, Json("Incorrect username or password.".to_string()))
            }
        }
        Ok(None) => {
            (StatusCode::NOT_FOUND, Json("User was not found.".to_string()))
        }
        Err(e) => {
            error!("There was an error with the database {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json("There was a database issue.".to_string()))
        }
    }
}
