use axum::response::Json;

/// GET /api/ping
pub async fn ping() -> Json<&'static str> {
    Json("Pong")
}
