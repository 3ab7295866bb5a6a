//! # Request Handlers
//!
//! Axum request handlers for the payment API.

use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use pay_core::{LeadData, PaymentError, PaymentRequest, PaymentResponse, PaymentStatusView};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Onboarding request
#[derive(Debug, Deserialize)]
pub struct OnboardRequest {
    #[serde(default)]
    pub lead_data: LeadData,
    #[serde(default)]
    pub payment_ref: String,
}

/// Onboarding response
#[derive(Debug, Serialize, Deserialize)]
pub struct OnboardResponse {
    pub workflow_id: String,
    pub status: String,
    pub message: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
        }
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn payment_error_to_response(err: PaymentError) -> ApiError {
    let code = err.status_code();
    if code >= 500 {
        error!("Request failed: {}", err);
    }
    let response = ErrorResponse::new(err.public_message(), code);
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

fn json_rejection_to_response(rejection: JsonRejection) -> ApiError {
    payment_error_to_response(PaymentError::MalformedPayload(rejection.body_text()))
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "cipc-pay",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now()
    }))
}

/// Create a hosted payment
#[instrument(skip(state, request))]
pub async fn create_payment(
    State(state): State<AppState>,
    request: Result<Json<PaymentRequest>, JsonRejection>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let Json(request) = request.map_err(json_rejection_to_response)?;

    let response = state
        .payments
        .create_payment(&request)
        .await
        .map_err(payment_error_to_response)?;

    Ok(Json(response))
}

/// Look up a payment by id or reference
#[instrument(skip(state))]
pub async fn payment_status(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
) -> Result<Json<PaymentStatusView>, ApiError> {
    let record = state
        .payments
        .payment_status(&payment_id)
        .await
        .map_err(payment_error_to_response)?;

    Ok(Json(PaymentStatusView::from(&record)))
}

/// Receive a gateway webhook
///
/// Verified payloads are acknowledged with `200 OK` whatever their business
/// outcome, including references we never issued.
#[instrument(skip(state, headers, body))]
pub async fn receive_webhook(
    State(state): State<AppState>,
    Path(source): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, ApiError> {
    let decoder = state.webhooks.get(&source).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(
                format!("Unknown webhook source: {}", source),
                404,
            )),
        )
    })?;

    let signature = decoder
        .signature_header()
        .and_then(|name| headers.get(name))
        .and_then(|v| v.to_str().ok());

    let outcome = decoder.decode(&body, signature).map_err(|e| {
        warn!("Rejected {} webhook: {}", source, e);
        payment_error_to_response(e)
    })?;

    let reference = outcome.reference().to_string();

    match state.payments.apply_webhook(outcome).await {
        Ok(disposition) => {
            info!(reference = %reference, "Webhook processed: {:?}", disposition);
            Ok("OK")
        }
        Err(PaymentError::UnknownReference { reference }) => {
            warn!(reference = %reference, "Webhook for unknown payment reference");
            Ok("OK")
        }
        Err(e) => Err(payment_error_to_response(e)),
    }
}

/// Hand a new lead to the filing workflow
#[instrument(skip(state, request))]
pub async fn onboard(
    State(state): State<AppState>,
    request: Result<Json<OnboardRequest>, JsonRejection>,
) -> Result<Json<OnboardResponse>, ApiError> {
    let Json(request) = request.map_err(json_rejection_to_response)?;

    let missing = request.lead_data.missing_fields();
    if !missing.is_empty() {
        return Err(payment_error_to_response(PaymentError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        ))));
    }

    let workflow_id = state
        .workflows
        .start_filing_workflow(&request.lead_data, &request.payment_ref)
        .await
        .map_err(payment_error_to_response)?;

    info!(
        "Onboarding accepted: {} ({})",
        request.lead_data.company_name, request.lead_data.company_number
    );

    Ok(Json(OnboardResponse {
        workflow_id,
        status: "accepted".to_string(),
        message: "CIPC filing workflow started".to_string(),
    }))
}
