//! Parameter registry and per-parameter history.

use axum::extract::{Path, State};
use axum::Extension;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, UserContext};
use crate::dashboard::{self, ParameterSeries};
use crate::labs::registry;
use crate::models::ParameterDefinition;

/// `GET /api/parameters`: every tracked parameter in display order.
pub async fn list() -> Json<&'static [ParameterDefinition]> {
    Json(registry::all())
}

/// `GET /api/parameters/:key/series`: the caller's measurements of one
/// parameter, oldest first.
pub async fn series(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
    Path(key): Path<String>,
) -> Result<Json<ParameterSeries>, ApiError> {
    let key = registry::parse_key(&key)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown parameter: {key}")))?;

    let book = ctx.core.book(caller.user.id).await?;
    Ok(Json(dashboard::series(&book, key)))
}
