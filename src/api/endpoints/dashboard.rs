//! `GET /api/dashboard`: latest value, status and trend per parameter.

use axum::extract::State;
use axum::Extension;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, UserContext};
use crate::dashboard::{self, DashboardSummary};

pub async fn summary(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
) -> Result<Json<DashboardSummary>, ApiError> {
    let book = ctx.core.book(caller.user.id).await?;
    Ok(Json(dashboard::summary(&book)))
}
