use axum::body::Bytes;
use axum::extract::State;

use crate::app::AppState;
use crate::container::Managed;
use crate::middleware::{ApiResponse, ApiResult};

/// DELETE /api/<kind> - The body names the record by id or natural key.
pub async fn delete<E: Managed>(State(state): State<AppState>, body: Bytes) -> ApiResult<String> {
    let record: E = serde_json::from_slice(&body)?;
    let removed = state.container.provider::<E>().await?.delete(&record).await?;
    Ok(ApiResponse::success(format!("{} {} deleted", E::KIND, removed.label())))
}
