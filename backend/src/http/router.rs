//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;
use crate::config::API_PREFIX;

/// Proposals with attachments metadata stay well below this.
pub const DEFAULT_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    create_router_with_body_limit(state, DEFAULT_BODY_LIMIT)
}

pub fn create_router_with_body_limit(state: AppState, body_limit: usize) -> Router {
    // Permissive CORS; the deployment ingress restricts origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        .route("/health", get(handlers::health_check))
        // Proposal CRUD
        .route("/proposals", post(handlers::create_proposal))
        .route("/proposals/validate", post(handlers::validate))
        .route("/proposals/list/{user_id}", get(handlers::list_proposals))
        .route(
            "/proposals/{prsl_id}",
            get(handlers::get_proposal).put(handlers::update_proposal),
        )
        // Name resolution
        .route(
            "/coordinates/{identifier}/{reference_frame}",
            get(handlers::get_coordinates),
        )
        // Attachments
        .route("/upload/signedurl/{filename}", post(handlers::upload_signed_url))
        .route("/download/signedurl/{filename}", get(handlers::download_signed_url))
        .route("/osd/{cycle_id}", get(handlers::get_osd));

    Router::new()
        .nest(API_PREFIX, api_v1)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
