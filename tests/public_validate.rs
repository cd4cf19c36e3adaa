//! Tests for the POST /api/validate-license endpoint.
//!
//! The theme calls this on every storefront load with its license key and the
//! hash of the store it runs on.

use axum::http::StatusCode;
use serde_json::json;
use std::sync::Arc;

mod common;
use common::*;

#[tokio::test]
async fn test_first_validation_binds_license() {
    let (state, pool) = create_test_app_state();
    let key = issue_test_licenses(&state, 1).remove(0);

    let (status, json) = post_json(
        app(state),
        "/api/validate-license",
        json!({ "licencia": key, "hash_tienda": "store-1" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["valid"], true);
    assert_eq!(json["message"], "Licencia válida");
    assert!(json.get("error").is_none(), "accepted reply should carry no error");

    let license = get_license(&pool, &key);
    assert_eq!(license.status, LicenseStatus::Active);
    assert_eq!(license.bound_fingerprint.as_deref(), Some("store-1"));
    assert_eq!(license.last_checked_at, fixed_day());
}

#[tokio::test]
async fn test_same_store_validates_repeatedly() {
    let (state, _pool) = create_test_app_state();
    let key = issue_test_licenses(&state, 1).remove(0);

    for _ in 0..3 {
        let (status, json) = post_json(
            app(state.clone()),
            "/api/validate-license",
            json!({ "licencia": key, "hash_tienda": "store-1" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["valid"], true, "same store should stay valid");
    }
}

#[tokio::test]
async fn test_second_store_invalidates_license() {
    let (state, pool) = create_test_app_state();
    let key = issue_test_licenses(&state, 1).remove(0);

    post_json(
        app(state.clone()),
        "/api/validate-license",
        json!({ "licencia": key, "hash_tienda": "store-1" }),
    )
    .await;

    let (status, json) = post_json(
        app(state.clone()),
        "/api/validate-license",
        json!({ "licencia": key, "hash_tienda": "store-2" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["valid"], false);
    assert_eq!(json["error"], "Licencia ya está en uso en otra tienda");
    assert_eq!(json["reason"], "conflicting_binding");

    let license = get_license(&pool, &key);
    assert_eq!(license.status, LicenseStatus::Invalid);
    assert_eq!(
        license.bound_fingerprint.as_deref(),
        Some("store-1"),
        "original binding should be kept for audit"
    );

    // The original store is locked out too
    let (_, json) = post_json(
        app(state),
        "/api/validate-license",
        json!({ "licencia": key, "hash_tienda": "store-1" }),
    )
    .await;
    assert_eq!(json["valid"], false);
    assert_eq!(json["error"], "Licencia inválida");
    assert_eq!(json["reason"], "already_invalid");
}

#[tokio::test]
async fn test_unknown_license_returns_not_found() {
    let (state, _pool) = create_test_app_state();

    let (status, json) = post_json(
        app(state),
        "/api/validate-license",
        json!({ "licencia": "LIC-0000-0000-0000", "hash_tienda": "store-1" }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["valid"], false);
    assert_eq!(json["error"], "Licencia no encontrada");
    assert_eq!(json["reason"], "not_found");
}

#[tokio::test]
async fn test_empty_hash_releases_license() {
    let (state, pool) = create_test_app_state();
    let key = issue_test_licenses(&state, 1).remove(0);

    post_json(
        app(state.clone()),
        "/api/validate-license",
        json!({ "licencia": key, "hash_tienda": "store-1" }),
    )
    .await;

    let (status, json) = post_json(
        app(state.clone()),
        "/api/validate-license",
        json!({ "licencia": key, "hash_tienda": "" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["valid"], true);
    assert_eq!(json["message"], "Licencia liberada");

    let license = get_license(&pool, &key);
    assert_eq!(license.status, LicenseStatus::Active);
    assert!(license.bound_fingerprint.is_none());
    assert_eq!(license.usage_count, 1);

    // Another store can now claim it
    let (_, json) = post_json(
        app(state),
        "/api/validate-license",
        json!({ "licencia": key, "hash_tienda": "store-2" }),
    )
    .await;
    assert_eq!(json["valid"], true);
}

#[tokio::test]
async fn test_empty_hash_on_unknown_license_returns_not_found() {
    let (state, _pool) = create_test_app_state();

    let (status, json) = post_json(
        app(state),
        "/api/validate-license",
        json!({ "licencia": "LIC-0000-0000-0000", "hash_tienda": "" }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["valid"], false);
    assert_eq!(json["error"], "Licencia no encontrada");
}

#[tokio::test]
async fn test_missing_license_parameter() {
    let (state, _pool) = create_test_app_state();

    for body in [json!({ "hash_tienda": "store-1" }), json!({ "licencia": "", "hash_tienda": "store-1" })] {
        let (status, json) = post_json(app(state.clone()), "/api/validate-license", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["valid"], false);
        assert_eq!(json["error"], "Falta parámetro licencia");
    }
}

#[tokio::test]
async fn test_missing_hash_parameter() {
    let (state, pool) = create_test_app_state();
    let key = issue_test_licenses(&state, 1).remove(0);

    let (status, json) = post_json(
        app(state),
        "/api/validate-license",
        json!({ "licencia": key }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["valid"], false);
    assert_eq!(json["error"], "Falta parámetro hash_tienda");
    assert_eq!(
        get_license(&pool, &key).status,
        LicenseStatus::New,
        "a rejected request must not touch the record"
    );
}

#[tokio::test]
async fn test_malformed_body_gets_validate_shaped_reply() {
    let (state, _pool) = create_test_app_state();

    let (status, json) = post_raw(app(state), "/api/validate-license", "{not json".to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["valid"], false);
    assert_eq!(json["error"], "Faltan parámetros requeridos");
    assert!(json.get("success").is_none(), "should not use the generic error shape");
}

#[tokio::test]
async fn test_store_failure_returns_internal_error() {
    let state = state_with_store(Arc::new(FailingStore));

    let (status, json) = post_json(
        app(state),
        "/api/validate-license",
        json!({ "licencia": "LIC-0000-0000-0000", "hash_tienda": "store-1" }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["valid"], false);
    assert_eq!(json["error"], "Error interno del servidor");
}
