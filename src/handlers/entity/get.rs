use std::collections::HashMap;

use axum::extract::{Query, State};
use serde::Serialize;

use crate::app::AppState;
use crate::container::Managed;
use crate::middleware::{ApiResponse, ApiResult};

/// A single record or the whole collection.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Found<E> {
    One(E),
    All(Vec<E>),
}

/// GET /api/<kind>[?id=..|?<key>=..]
pub async fn get<E: Managed>(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Found<E>> {
    let provider = state.container.provider::<E>().await?;

    let found = if let Some(id) = params.get("id") {
        Found::One(provider.get_by_id(id).await?.redacted())
    } else if let Some(value) = E::KEY_FIELD.and_then(|key| params.get(key)) {
        Found::One(provider.get_by_key(value).await?.redacted())
    } else {
        let records = provider.get_all().await?;
        Found::All(records.into_iter().map(E::redacted).collect())
    };

    Ok(ApiResponse::success(found))
}
