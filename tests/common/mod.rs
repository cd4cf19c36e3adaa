//! Test utilities and fixtures for license service integration tests

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::NaiveDate;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub use silkify_license::db::{DbPool, init_db, queries};
pub use silkify_license::error::{AppError, Result};
pub use silkify_license::handlers;
pub use silkify_license::keygen::{OsKeyGenerator, is_valid_license_key};
pub use silkify_license::ledger::LicenseLedger;
pub use silkify_license::models::*;
pub use silkify_license::shopify::ProductCatalog;
pub use silkify_license::state::AppState;
pub use silkify_license::store::{RecordStore, SqliteStore};

pub fn fixed_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

/// In-memory SQLite pool with the schema applied.
///
/// Each in-memory connection is its own database, so the pool holds exactly one.
pub fn create_test_pool() -> DbPool {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }
    pool
}

pub fn state_with_store(store: Arc<dyn RecordStore>) -> AppState {
    let ledger = LicenseLedger::new(store, Arc::new(OsKeyGenerator)).with_clock(fixed_day);
    AppState {
        ledger: Arc::new(ledger),
        catalog: Arc::new(ProductCatalog::default()),
        default_currency: "EUR".to_string(),
        max_licenses_per_order: 100,
    }
}

/// App state backed by a fresh in-memory SQLite store.
pub fn create_test_app_state() -> (AppState, DbPool) {
    let pool = create_test_pool();
    let state = state_with_store(Arc::new(SqliteStore::new(pool.clone())));
    (state, pool)
}

/// Full router with dev endpoints and the CORS layer, as `main` builds it.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(handlers::router(true))
        .layer(handlers::cors_layer(86400))
        .with_state(state)
}

/// Production router: no dev endpoints.
pub fn prod_app(state: AppState) -> Router {
    Router::new()
        .merge(handlers::router(false))
        .layer(handlers::cors_layer(86400))
        .with_state(state)
}

/// Issue `count` licenses for a test order and return their keys.
pub fn issue_test_licenses(state: &AppState, count: usize) -> Vec<String> {
    let provenance = Provenance {
        order_reference: "1001".to_string(),
        customer_email: "ana@example.com".to_string(),
        customer_name: "Ana García".to_string(),
        order_total: "29.99".to_string(),
        currency: "EUR".to_string(),
    };
    state
        .ledger
        .issue(count, &provenance)
        .expect("Failed to issue test licenses")
}

pub fn get_license(pool: &DbPool, key: &str) -> License {
    let conn = pool.get().unwrap();
    queries::get_license_by_key(&conn, key)
        .unwrap()
        .expect("License should exist")
}

/// POST a JSON body and return the status with the parsed response body.
pub async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    post_raw(app, uri, body.to_string()).await
}

/// POST an arbitrary body with a JSON content type.
pub async fn post_raw(app: Router, uri: &str, body: String) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

/// Record store whose every call fails, for exercising store-outage paths.
pub struct FailingStore;

impl RecordStore for FailingStore {
    fn lookup(&self, _key: &str) -> Result<Option<License>> {
        Err(AppError::StoreUnavailable("store offline".into()))
    }

    fn create(&self, _license: &License) -> Result<()> {
        Err(AppError::StoreUnavailable("store offline".into()))
    }

    fn create_batch(&self, _licenses: &[License]) -> Result<()> {
        Err(AppError::StoreUnavailable("store offline".into()))
    }

    fn update(&self, _license: &License) -> Result<()> {
        Err(AppError::StoreUnavailable("store offline".into()))
    }

    fn list(&self) -> Result<Vec<License>> {
        Err(AppError::StoreUnavailable("store offline".into()))
    }
}
