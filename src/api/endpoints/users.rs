//! Registration and identity endpoints.
//!
//! `POST /api/users` creates a user and returns its bearer token once.
//! `GET /api/me` echoes the authenticated user.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, UserContext};
use crate::identity;
use crate::models::User;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub user: User,
    /// Shown once; only its hash is stored.
    pub token: String,
}

pub async fn register(
    State(ctx): State<ApiContext>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let conn = ctx.core.open_db()?;
    let (user, token) = identity::register(&conn, &payload.email, &payload.name)?;
    Ok((StatusCode::CREATED, Json(RegisterResponse { user, token })))
}

pub async fn me(Extension(caller): Extension<UserContext>) -> Json<User> {
    Json(caller.user)
}
