use axum::Router;

use crate::state::AppState;

pub mod customers;
pub mod delivery_slots;
pub mod doc;
pub mod health;
pub mod orders;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/orders", orders::router())
        .nest("/customers", customers::router())
        .nest("/delivery-slots", delivery_slots::router())
}

/// Health check, `/api` and the scalar docs, still waiting for state.
pub fn create_app_router() -> Router<AppState> {
    Router::new()
        .route("/health", axum::routing::get(health::health_check))
        .nest("/api", create_api_router())
        .merge(doc::scalar_docs())
}
