use axum::body::Bytes;
use axum::extract::State;

use crate::app::AppState;
use crate::container::Managed;
use crate::middleware::{ApiResponse, ApiResult};

/// PUT /api/<kind> - Create a record; 409 when its natural key is taken.
pub async fn put<E: Managed>(State(state): State<AppState>, body: Bytes) -> ApiResult<E> {
    let record: E = serde_json::from_slice(&body)?;
    let created = state.container.provider::<E>().await?.add(record).await?;
    Ok(ApiResponse::success(created.redacted()))
}
