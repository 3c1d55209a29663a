//! Report listing, manual entry and deletion.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, UserContext};
use crate::models::Report;
use crate::reports;

#[derive(Serialize)]
pub struct ReportsResponse {
    pub version: u64,
    pub reports: Vec<Report>,
}

/// `GET /api/reports`: the caller's reports, ascending by report date.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
) -> Result<Json<ReportsResponse>, ApiError> {
    let book = ctx.core.book(caller.user.id).await?;
    Ok(Json(ReportsResponse {
        version: book.version(),
        reports: book.reports().to_vec(),
    }))
}

/// `POST /api/reports`: manual entry from a raw parameter map.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
    Json(raw): Json<Map<String, Value>>,
) -> Result<(StatusCode, Json<Report>), ApiError> {
    let mut book = ctx.core.book(caller.user.id).await?;
    let conn = ctx.core.open_db()?;
    let report = reports::save_manual(&conn, &mut book, caller.user.id, &raw)?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// `DELETE /api/reports/:id`: hard delete, scoped to the caller.
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    // A malformed id cannot name any report
    let report_id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::NotFound(format!("report {id} not found")))?;

    let mut book = ctx.core.book(caller.user.id).await?;
    let conn = ctx.core.open_db()?;
    reports::delete_report(&conn, &mut book, caller.user.id, report_id)?;
    Ok(StatusCode::NO_CONTENT)
}
