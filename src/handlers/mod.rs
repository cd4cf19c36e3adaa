//! HTTP surface of the license service.
//!
//! Every endpoint is public: the theme calls validate/clear from the
//! storefront, Shopify calls generate on `orders/paid`.

mod licenses;
mod orders;

pub use licenses::*;
pub use orders::*;

use std::time::Duration;

use axum::{
    Json, Router,
    http::{HeaderName, Method},
    routing::{get, post},
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router(dev_mode: bool) -> Router<AppState> {
    let router = Router::new()
        .route("/health", get(health))
        .route("/api/validate-license", post(validate_license))
        .route("/api/clear-license", post(clear_license))
        .route("/api/generate-license", post(generate_license));

    if dev_mode {
        // Replays a canned order through the issuer
        router.route("/api/webhook-test", post(webhook_test))
    } else {
        router
    }
}

/// Storefronts on any domain call these endpoints from the browser.
pub fn cors_layer(max_age_secs: u64) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("authorization"),
        ])
        .max_age(Duration::from_secs(max_age_secs))
}
