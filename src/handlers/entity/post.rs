use axum::body::Bytes;
use axum::extract::State;
use tracing::info;

use crate::app::AppState;
use crate::container::Managed;
use crate::database::models::UpdateRequest;
use crate::middleware::{ApiResponse, ApiResult};

/// POST /api/<kind> - Update the addressed record. With `upsert_on_post`
/// a request that addresses nothing creates the record instead.
pub async fn post<E: Managed>(State(state): State<AppState>, body: Bytes) -> ApiResult<E> {
    let request: E::Update = serde_json::from_slice(&body)?;
    let provider = state.container.provider::<E>().await?;

    let record = match provider.update(request.clone()).await {
        Ok(updated) => updated,
        Err(err) if err.is_not_found() && state.container.config().api.upsert_on_post => {
            info!("No {} to update, creating it", E::KIND);
            provider.add(request.apply(E::default())).await?
        }
        Err(err) => return Err(err.into()),
    };

    Ok(ApiResponse::success(record.redacted()))
}
