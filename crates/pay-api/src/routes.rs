//! # Routes
//!
//! Axum router configuration for the payment API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Payment, webhook and onboarding routes
fn api_routes() -> Router<AppState> {
    Router::new()
        // Payments
        .route("/payments/create", post(handlers::create_payment))
        .route("/payments/{payment_id}/status", get(handlers::payment_status))
        // Webhooks (raw body; decoders verify signatures)
        .route("/webhooks/{source}", post(handlers::receive_webhook))
        // Onboarding
        .route("/flows/onboard", post(handlers::onboard))
        .route("/health", get(handlers::health))
}

/// Create the main application router
///
/// Routes are served at the root and mirrored under `/api/v1`:
/// - POST /payments/create
/// - GET  /payments/{payment_id}/status
/// - POST /webhooks/{source} (ozow, payfast, paystack, payment)
/// - POST /flows/onboard
/// - GET  /health, GET /
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::health))
        .merge(api_routes())
        .nest("/api/v1", api_routes())
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // State
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppConfig;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use pay_core::{
        GatewayChain, InMemoryPaymentStore, LoggingNotifier, LoggingWorkflowEngine,
        PaymentConfig, PaymentService, WebhookRegistry,
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    fn state() -> AppState {
        let service = PaymentService::new(
            PaymentConfig::default(),
            GatewayChain::new(),
            Arc::new(InMemoryPaymentStore::new()),
            Arc::new(LoggingNotifier),
        );
        AppState::from_parts(
            AppConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                base_url: "http://localhost".to_string(),
                environment: "test".to_string(),
            },
            service,
            WebhookRegistry::new(),
            Arc::new(LoggingWorkflowEngine),
        )
    }

    #[tokio::test]
    async fn test_health_mirrored() {
        for uri in ["/", "/health", "/api/v1/health"] {
            let response = create_router(state())
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_unknown_webhook_source() {
        let response = create_router(state())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/webhooks/paypal")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
