use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extractors::Json;
use crate::ledger::BindReason;
use crate::state::AppState;
use crate::util::extract_request_info;

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub licencia: Option<String>,
    /// Store fingerprint. An empty string asks for the license to be released.
    pub hash_tienda: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<BindReason>,
}

impl ValidateResponse {
    fn ok(message: &'static str) -> Self {
        Self {
            valid: true,
            message: Some(message),
            error: None,
            reason: None,
        }
    }

    fn error(error: &'static str) -> Self {
        Self {
            valid: false,
            message: None,
            error: Some(error),
            reason: None,
        }
    }

    fn refused(reason: BindReason) -> Self {
        Self {
            reason: Some(reason),
            ..Self::error(reason.message())
        }
    }
}

type ValidateReply = (StatusCode, Json<ValidateResponse>);

fn internal_error(e: AppError, key: &str) -> ValidateReply {
    tracing::error!(key, error = %e, "License validation failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ValidateResponse::error("Error interno del servidor")),
    )
}

fn refusal_status(reason: BindReason) -> StatusCode {
    match reason {
        BindReason::NotFound => StatusCode::NOT_FOUND,
        BindReason::MissingParameter => StatusCode::BAD_REQUEST,
        BindReason::AlreadyInvalid | BindReason::ConflictingBinding => StatusCode::OK,
    }
}

/// POST /api/validate-license
///
/// Called by the theme on every storefront load. Binds the license to the
/// store on first use, and invalidates it when a second store shows up.
/// `hash_tienda: ""` releases the license instead (theme uninstall).
pub async fn validate_license(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ValidateRequest>, AppError>,
) -> ValidateReply {
    let req = match body {
        Ok(Json(req)) => req,
        Err(e) => {
            tracing::debug!(error = %e, "Unreadable validate-license body");
            return (
                StatusCode::BAD_REQUEST,
                Json(ValidateResponse::refused(BindReason::MissingParameter)),
            );
        }
    };

    let Some(key) = req.licencia.filter(|k| !k.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ValidateResponse::error("Falta parámetro licencia")),
        );
    };

    let (ip, user_agent) = extract_request_info(&headers);
    tracing::debug!(
        key = %key,
        ip = ip.as_deref().unwrap_or("unknown"),
        user_agent = user_agent.as_deref().unwrap_or("unknown"),
        "Validate license request"
    );

    match req.hash_tienda.as_deref() {
        None => (
            StatusCode::BAD_REQUEST,
            Json(ValidateResponse::error("Falta parámetro hash_tienda")),
        ),
        Some("") => match state.ledger.release(&key) {
            Ok(outcome) if outcome.cleared => {
                (StatusCode::OK, Json(ValidateResponse::ok("Licencia liberada")))
            }
            Ok(_) => (
                StatusCode::NOT_FOUND,
                Json(ValidateResponse::refused(BindReason::NotFound)),
            ),
            Err(e) => internal_error(e, &key),
        },
        Some(fingerprint) => match state.ledger.bind(&key, fingerprint) {
            Ok(outcome) => match outcome.reason {
                None => (StatusCode::OK, Json(ValidateResponse::ok("Licencia válida"))),
                Some(reason) => (
                    refusal_status(reason),
                    Json(ValidateResponse::refused(reason)),
                ),
            },
            Err(e) => internal_error(e, &key),
        },
    }
}

#[derive(Debug, Deserialize)]
pub struct ClearRequest {
    pub licencia: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleared: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

impl ClearResponse {
    fn failed(error: &'static str) -> Json<Self> {
        Json(Self {
            success: false,
            cleared: None,
            error: Some(error),
        })
    }
}

/// POST /api/clear-license
///
/// Always answers 200 so the theme's uninstall hook never sees a transport error.
pub async fn clear_license(
    State(state): State<AppState>,
    body: Result<Json<ClearRequest>, AppError>,
) -> Json<ClearResponse> {
    let key = match body {
        Ok(Json(ClearRequest { licencia: Some(key) })) if !key.is_empty() => key,
        _ => return ClearResponse::failed("Falta parámetro licencia"),
    };

    match state.ledger.release(&key) {
        Ok(outcome) => Json(ClearResponse {
            success: true,
            cleared: Some(outcome.cleared),
            error: None,
        }),
        Err(e) => {
            tracing::error!(key = %key, error = %e, "Clearing license failed");
            ClearResponse::failed("Error interno")
        }
    }
}
