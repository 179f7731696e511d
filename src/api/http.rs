//! HTTP server setup with Axum

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use super::rest::{admin, clans, columns, events, leaderboard, players};
use super::state::AppState;

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    // The dashboard is served from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/stats/events", post(events::post_events))
        .route("/stats/player/:player_id", get(players::get_player))
        .route("/stats/leaderboard", get(leaderboard::get_leaderboard))
        .route("/stats/clans", get(clans::get_clans))
        .route("/stats/columns", get(columns::get_columns))
        .route("/stats/reset", post(admin::post_reset))
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::auth::JwtAuth;
    use crate::engine::IngestEngine;
    use crate::registry::StatRegistry;
    use crate::store::TimeframeStores;
    use crate::validation::EventLimits;
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    #[tokio::test]
    async fn test_health_check() {
        let registry = Arc::new(StatRegistry::standard().unwrap());
        let stores = TimeframeStores::in_memory(registry.clone());
        let engine = IngestEngine::new(registry, stores, EventLimits::default());
        let auth = JwtAuth::new("test-secret-key-that-is-at-least-32-characters-long");
        let app = create_router(Arc::new(AppState::new(engine, auth, None)));

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
    }
}
