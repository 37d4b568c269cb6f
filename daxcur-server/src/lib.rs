//! HTTP surface of the DAX curation service.
//!
//! Every route is served at the root and again under `/api/v1`.

pub mod error;
pub mod routes;
pub mod state;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Versioned prefix the routes are also mounted under.
pub const API_PREFIX: &str = "/api/v1";

/// Build the application router with CORS and request tracing.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    let api = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::metrics::prometheus))
        // Examples
        .route("/examples/add", post(routes::examples::add_example))
        .route(
            "/examples/update-correction",
            post(routes::examples::update_correction),
        )
        .route(
            "/examples/{model_type}",
            get(routes::examples::list_examples).delete(routes::examples::reset_examples),
        )
        // Backups
        .route("/backups/{model_type}", get(routes::backups::list_backups))
        .route(
            "/backups/{model_type}/{file_name}",
            get(routes::backups::get_backup),
        )
        // Chat
        .route("/chat", post(routes::chat::chat))
        .route("/dax/correct", post(routes::chat::correct_dax));

    Router::new()
        .merge(api.clone())
        .nest(API_PREFIX, api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(origin = %o, error = %e, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(allowed))
}
