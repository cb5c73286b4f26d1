//! HTTP surface of the relay.

use std::sync::Arc;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::db::TokenStore;
use crate::notion::NotionClient;

pub mod envelope;
pub mod handlers;

/// Shared state handed to every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub notion: NotionClient,
    pub store: Arc<dyn TokenStore>,
    /// Parent database for upload items that name none.
    pub default_database: Option<String>,
}

pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/upload-works", post(handlers::upload_works))
        .route("/search-by-title", post(handlers::search_by_title))
        .route(
            "/page-database/",
            get(handlers::page_database_query).post(handlers::page_database_json),
        )
        .route(
            "/page-database",
            get(handlers::page_database_query).post(handlers::page_database_json),
        )
        .route(
            "/exchange-code-for-token",
            post(handlers::exchange_code_for_token),
        )
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(cors_origins))
        .with_state(state)
}

/// No configured origins means any origin is allowed.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(%origin, %err, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
}
