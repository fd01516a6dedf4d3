use axum::Router;
use tower_http::cors::CorsLayer;

use crate::routes::{auth, fundamentals, health, quotes, securities};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/api/securities", securities::router())
        .nest("/api/quotes", quotes::router())
        .nest("/api/fundamentals", fundamentals::router())
        .nest("/api/auth", auth::router())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
