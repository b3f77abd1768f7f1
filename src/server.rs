//! HTTP server assembly
//!
//! Builds the router with every route and the middleware stack around it.

use crate::api::users;
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::Request,
    middleware::Next,
    response::{Html, Redirect, Response},
    routing::{any, get},
    Json, Router,
};
use serde::Serialize;
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

/// Banner served at the root path
pub const HOME_BANNER: &str = "<h1>User Service. Manage users at /api/users/.</h1>";

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/api/health", get(health_check))
        // User management API
        .route(
            "/api/users/",
            get(users::list_users).post(users::create_user),
        )
        .route(
            "/api/users",
            any(|| async { Redirect::permanent("/api/users/") }),
        )
        .route(
            "/api/users/:id",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        // Middleware (order matters - request_id should be first)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Request ID middleware - adds unique ID to each request for tracing
async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    let response = next.run(request).instrument(span).await;

    let duration = start.elapsed();
    info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status().as_u16(),
        duration_ms = duration.as_millis(),
        "Request completed"
    );

    response
}

async fn home() -> Html<&'static str> {
    Html(HOME_BANNER)
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn not_found() -> AppError {
    AppError::RouteNotFound
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
