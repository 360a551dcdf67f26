use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::container::{Container, Managed};
use crate::database::models::{Company, Contact, Inspection, Inventory, Project, User};
use crate::handlers::{self, entity};

#[derive(Clone)]
pub struct AppState {
    pub container: Arc<Container>,
}

impl AppState {
    pub fn new(container: Arc<Container>) -> Self {
        Self { container }
    }
}

pub fn router(state: AppState) -> Router {
    let api = state.container.config().api.clone();

    let router = Router::new()
        // Service probes
        .route("/health", get(handlers::health))
        .route("/api/ping", get(handlers::ping))
        // Entities
        .merge(entity_routes::<User>("/api/user"))
        .merge(entity_routes::<Contact>("/api/contact"))
        .merge(entity_routes::<Company>("/api/company"))
        .merge(entity_routes::<Project>("/api/project"))
        .merge(entity_routes::<Inventory>("/api/inventory"))
        .merge(entity_routes::<Inspection>("/api/inspection"))
        // Global middleware
        .layer(DefaultBodyLimit::max(api.max_request_size_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if api.enable_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

fn entity_routes<E: Managed>(path: &str) -> Router<AppState> {
    Router::new().route(
        path,
        get(entity::get::<E>)
            .post(entity::post::<E>)
            .put(entity::put::<E>)
            .delete(entity::delete::<E>),
    )
}
