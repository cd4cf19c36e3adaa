use axum::{extract::State, http::StatusCode};
use serde::Serialize;

use crate::extractors::Json;
use crate::shopify::{OrderWebhook, sample_order};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum GenerateResponse {
    Issued {
        success: bool,
        licenses: Vec<String>,
        total_licenses: u32,
        order_number: Option<String>,
    },
    /// The order had no theme line items; acknowledged so Shopify stops retrying.
    Ignored { success: bool, message: &'static str },
    TooMany {
        success: bool,
        error: &'static str,
        total_licenses: u32,
        max_licenses: u32,
    },
    Failed {
        success: bool,
        error: &'static str,
        details: String,
    },
}

impl GenerateResponse {
    pub fn status(&self) -> StatusCode {
        match self {
            GenerateResponse::TooMany { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            GenerateResponse::Failed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::OK,
        }
    }
}

/// Count the theme licenses bought by `order` and issue them.
///
/// Orders over `max_licenses_per_order` are refused before anything is generated.
pub fn process_order(state: &AppState, order: &OrderWebhook) -> GenerateResponse {
    let reference = order.reference();
    let total = state.catalog.licenses_for_order(order);

    if total == 0 {
        tracing::debug!(
            order = reference.as_deref().unwrap_or("unknown"),
            "Order has no theme items, ignoring"
        );
        return GenerateResponse::Ignored {
            success: true,
            message: "No es compra de Silkify Theme",
        };
    }

    if total > state.max_licenses_per_order {
        tracing::warn!(
            order = reference.as_deref().unwrap_or("unknown"),
            total,
            max = state.max_licenses_per_order,
            "Order exceeds the per-order license limit, refusing"
        );
        return GenerateResponse::TooMany {
            success: false,
            error: "Demasiadas licencias en el pedido",
            total_licenses: total,
            max_licenses: state.max_licenses_per_order,
        };
    }

    let provenance = order.provenance(&state.default_currency);

    match state.ledger.issue(total as usize, &provenance) {
        Ok(licenses) => GenerateResponse::Issued {
            success: true,
            licenses,
            total_licenses: total,
            order_number: reference,
        },
        Err(e) => {
            tracing::error!(
                order = reference.as_deref().unwrap_or("unknown"),
                total,
                error = %e,
                "License issuance failed"
            );
            GenerateResponse::Failed {
                success: false,
                error: "Error generando licencias",
                details: e.to_string(),
            }
        }
    }
}

/// POST /api/generate-license
///
/// Target of the Shopify `orders/paid` webhook.
pub async fn generate_license(
    State(state): State<AppState>,
    Json(order): Json<OrderWebhook>,
) -> (StatusCode, Json<GenerateResponse>) {
    tracing::info!(
        order = order.reference().as_deref().unwrap_or("unknown"),
        email = order
            .customer
            .as_ref()
            .and_then(|c| c.email.as_deref())
            .unwrap_or(""),
        "Processing order"
    );

    let response = process_order(&state, &order);
    (response.status(), Json(response))
}

#[derive(Debug, Serialize)]
pub struct WebhookTestResponse {
    pub success: bool,
    pub message: &'static str,
    pub result: GenerateResponse,
}

/// POST /api/webhook-test (dev mode only)
///
/// Runs a canned three-license order through the issuer.
pub async fn webhook_test(State(state): State<AppState>) -> Json<WebhookTestResponse> {
    let result = process_order(&state, &sample_order());

    Json(WebhookTestResponse {
        success: true,
        message: "Webhook de prueba ejecutado",
        result,
    })
}
