//! Route handlers.

use axum::{http::HeaderMap, routing::get, Router};

use crate::http::request::request_id;

/// Prefix of the versioned API group.
pub const API_PREFIX: &str = "/v1/api";

/// Register the service routes.
pub fn routes(router: Router) -> Router {
    router
        .nest(API_PREFIX, api_routes())
        .route("/", get(hello))
}

/// Versioned API group. No endpoints are served under it yet.
fn api_routes() -> Router {
    Router::new()
}

async fn hello(headers: HeaderMap) -> &'static str {
    tracing::info!(request_id = %request_id(&headers), "received GET request");
    "Hello, World!"
}
