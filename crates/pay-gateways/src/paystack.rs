//! # Paystack
//!
//! Second alternate. Unlike Ozow and PayFast, a Paystack session is created
//! server-side through the Transaction Initialize API; webhooks are signed
//! with HMAC-SHA512 of the raw body in `x-paystack-signature`.

use crate::config::{require, CallbackUrls, PaystackConfig};
use crate::signature::{constant_time_compare, hmac_sha512_hex};
use crate::timestamp::timestamp_or_now;
use async_trait::async_trait;
use pay_core::{
    decode_json, Gateway, GatewaySession, PaymentCompletion, PaymentError, PaymentGateway,
    PaymentRequest, PaymentResult, WebhookDecoder, WebhookOutcome,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

pub const SOURCE: &str = "paystack";
pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

const EVENT_CHARGE_SUCCESS: &str = "charge.success";

/// Paystack Transaction Initialize adapter
pub struct PaystackGateway {
    config: PaystackConfig,
    urls: CallbackUrls,
    client: Client,
}

impl PaystackGateway {
    pub fn new(config: PaystackConfig, urls: CallbackUrls) -> PaymentResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PaymentError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            urls,
            client,
        })
    }

    fn provider_error(message: impl Into<String>) -> PaymentError {
        PaymentError::ProviderError {
            provider: SOURCE.to_string(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    #[instrument(skip(self, request), fields(gateway = SOURCE))]
    async fn create_session(
        &self,
        request: &PaymentRequest,
        reference: &str,
    ) -> PaymentResult<GatewaySession> {
        let secret_key = require(&self.config.secret_key, "PAYSTACK_SECRET_KEY")?;

        if request.customer.email.trim().is_empty() {
            return Err(Self::provider_error("customer email is required"));
        }

        let body = InitializeRequest {
            email: &request.customer.email,
            amount: request.amount,
            currency: &request.currency,
            reference,
            callback_url: request
                .success_url
                .clone()
                .unwrap_or_else(|| self.urls.success_url()),
            metadata: InitializeMetadata {
                company_number: &request.customer.company_number,
                service: "cipc_filing",
            },
        };

        let url = format!(
            "{}/transaction/initialize",
            self.config.api_base_url.trim_end_matches('/')
        );

        debug!("Initializing Paystack transaction {}", reference);

        let response = self
            .client
            .post(&url)
            .bearer_auth(secret_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!("Paystack API error: status={}, body={}", status, text);

            if let Ok(envelope) = serde_json::from_str::<PaystackErrorResponse>(&text) {
                return Err(Self::provider_error(envelope.message));
            }
            return Err(Self::provider_error(format!("HTTP {}: {}", status, text)));
        }

        let envelope: InitializeResponse = serde_json::from_str(&text).map_err(|e| {
            PaymentError::Serialization(format!("Failed to parse Paystack response: {}", e))
        })?;

        let data = match envelope.data {
            Some(data) if envelope.status => data,
            _ => return Err(Self::provider_error(envelope.message)),
        };

        info!(
            "Initialized Paystack transaction: reference={}, access_code={}",
            reference, data.access_code
        );

        Ok(GatewaySession::new(data.authorization_url).with_gateway_reference(data.access_code))
    }

    fn gateway(&self) -> Gateway {
        Gateway::Paystack
    }
}

/// Verifies Paystack webhooks against the secret key
pub struct PaystackWebhookDecoder {
    secret_key: Option<String>,
    currency: String,
}

impl PaystackWebhookDecoder {
    pub fn new(config: &PaystackConfig) -> Self {
        Self {
            secret_key: config.secret_key.clone(),
            currency: config.currency.clone(),
        }
    }
}

impl WebhookDecoder for PaystackWebhookDecoder {
    fn source(&self) -> &'static str {
        SOURCE
    }

    fn signature_header(&self) -> Option<&'static str> {
        Some(SIGNATURE_HEADER)
    }

    fn decode(&self, payload: &[u8], signature: Option<&str>) -> PaymentResult<WebhookOutcome> {
        let secret_key = self.secret_key.as_deref().ok_or_else(|| {
            PaymentError::SignatureVerification("Paystack secret key not configured".to_string())
        })?;
        let signature = signature.ok_or_else(|| {
            PaymentError::SignatureVerification(format!("Missing {} header", SIGNATURE_HEADER))
        })?;

        let expected = hmac_sha512_hex(secret_key, payload)?;
        if !constant_time_compare(&expected, &signature.trim().to_lowercase()) {
            warn!("Paystack signature mismatch");
            return Err(PaymentError::SignatureVerification(
                "Paystack signature mismatch".to_string(),
            ));
        }

        let event: PaystackEvent = decode_json(payload)?;
        let data = event.data;

        if data.reference.is_empty() {
            return Err(PaymentError::MalformedPayload(
                "Missing data.reference".to_string(),
            ));
        }

        if event.event != EVENT_CHARGE_SUCCESS {
            return Ok(WebhookOutcome::Ignored {
                reference: data.reference,
                status: event.event,
            });
        }

        if data.currency != self.currency {
            warn!(
                reference = %data.reference,
                "Paystack charge settled in {:?}, expected {}",
                data.currency, self.currency
            );
            return Ok(WebhookOutcome::Ignored {
                reference: data.reference,
                status: format!("{} ({})", event.event, data.currency),
            });
        }

        let timestamp = timestamp_or_now(&[data.paid_at.as_str(), data.created_at.as_str()]);

        Ok(WebhookOutcome::Completed(PaymentCompletion {
            reference: data.reference,
            amount: data.amount,
            gateway_status: data.status,
            gateway_id: data.id.map(|id| id.to_string()).unwrap_or_default(),
            source: SOURCE.to_string(),
            timestamp,
        }))
    }
}

// =============================================================================
// Paystack API Types
// =============================================================================

#[derive(Debug, Serialize)]
struct InitializeRequest<'a> {
    email: &'a str,
    amount: i64,
    currency: &'a str,
    reference: &'a str,
    callback_url: String,
    metadata: InitializeMetadata<'a>,
}

#[derive(Debug, Serialize)]
struct InitializeMetadata<'a> {
    company_number: &'a str,
    service: &'a str,
}

#[derive(Debug, Deserialize)]
struct InitializeResponse {
    status: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<InitializeData>,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    authorization_url: String,
    access_code: String,
}

#[derive(Debug, Deserialize)]
struct PaystackErrorResponse {
    message: String,
}

#[derive(Debug, Deserialize)]
struct PaystackEvent {
    event: String,
    data: PaystackEventData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PaystackEventData {
    id: Option<i64>,
    reference: String,
    amount: i64,
    currency: String,
    status: String,
    paid_at: String,
    created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pay_core::Customer;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SECRET: &str = "sk_test_abc123";

    /// Paystack event body and its signature
    fn signed_event(event: &str, reference: &str, amount: i64) -> (Vec<u8>, String) {
        signed_event_in(event, reference, amount, "ZAR")
    }

    fn signed_event_in(
        event: &str,
        reference: &str,
        amount: i64,
        currency: &str,
    ) -> (Vec<u8>, String) {
        let body = serde_json::to_vec(&json!({
            "event": event,
            "data": {
                "id": 302961,
                "reference": reference,
                "amount": amount,
                "currency": currency,
                "status": "success",
                "paid_at": "2024-03-01T10:02:00.000Z",
                "created_at": "2024-03-01T10:00:00.000Z",
                "metadata": { "company_number": "202212345" },
                "customer": { "email": "a@b.com" }
            }
        }))
        .unwrap();
        let signature = hmac_sha512_hex(SECRET, &body).unwrap();
        (body, signature)
    }

    fn request() -> PaymentRequest {
        PaymentRequest::new(19900, "ZAR").with_customer(Customer {
            company_number: "202212345".into(),
            email: "a@b.com".into(),
            ..Default::default()
        })
    }

    async fn gateway(server: &MockServer) -> PaystackGateway {
        let config = PaystackConfig::new(SECRET).with_api_base_url(server.uri());
        PaystackGateway::new(config, CallbackUrls::default()).unwrap()
    }

    #[tokio::test]
    async fn test_initialize_transaction() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/transaction/initialize"))
            .and(header("authorization", format!("Bearer {}", SECRET).as_str()))
            .and(body_partial_json(json!({
                "email": "a@b.com",
                "amount": 19900,
                "currency": "ZAR",
                "reference": "PAY-1"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": true,
                "message": "Authorization URL created",
                "data": {
                    "authorization_url": "https://checkout.paystack.com/0peioxfhpn",
                    "access_code": "0peioxfhpn",
                    "reference": "PAY-1"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = gateway(&server)
            .await
            .create_session(&request(), "PAY-1")
            .await
            .unwrap();

        assert_eq!(session.payment_url, "https://checkout.paystack.com/0peioxfhpn");
        assert_eq!(session.gateway_reference.as_deref(), Some("0peioxfhpn"));
    }

    #[tokio::test]
    async fn test_http_error_is_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/transaction/initialize"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "status": false,
                "message": "Invalid key"
            })))
            .mount(&server)
            .await;

        let err = gateway(&server)
            .await
            .create_session(&request(), "PAY-1")
            .await
            .unwrap_err();

        match err {
            PaymentError::ProviderError { provider, message } => {
                assert_eq!(provider, "paystack");
                assert_eq!(message, "Invalid key");
            }
            other => panic!("expected provider error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_status_false_is_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/transaction/initialize"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": false,
                "message": "Duplicate Transaction Reference"
            })))
            .mount(&server)
            .await;

        let err = gateway(&server)
            .await
            .create_session(&request(), "PAY-1")
            .await
            .unwrap_err();
        assert!(err.is_gateway_failure());
    }

    #[tokio::test]
    async fn test_missing_secret_or_email() {
        let unconfigured =
            PaystackGateway::new(PaystackConfig::default(), CallbackUrls::default()).unwrap();
        let err = unconfigured.create_session(&request(), "PAY-1").await.unwrap_err();
        assert!(matches!(err, PaymentError::Configuration(_)));

        let server = MockServer::start().await;
        let mut no_email = request();
        no_email.customer.email.clear();
        let err = gateway(&server)
            .await
            .create_session(&no_email, "PAY-1")
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::ProviderError { .. }));
    }

    #[test]
    fn test_charge_success() {
        let decoder = PaystackWebhookDecoder::new(&PaystackConfig::new(SECRET));
        let (body, signature) = signed_event("charge.success", "PAY-1", 19900);

        match decoder.decode(&body, Some(&signature)).unwrap() {
            WebhookOutcome::Completed(c) => {
                assert_eq!(c.reference, "PAY-1");
                assert_eq!(c.amount, 19900);
                assert_eq!(c.gateway_id, "302961");
                assert_eq!(c.gateway_status, "success");
                assert_eq!(c.source, "paystack");
            }
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[test]
    fn test_other_events_ignored() {
        let decoder = PaystackWebhookDecoder::new(&PaystackConfig::new(SECRET));
        let (body, signature) = signed_event("transfer.success", "PAY-1", 19900);

        let outcome = decoder.decode(&body, Some(&signature)).unwrap();
        assert!(outcome.is_ignored());
    }

    #[test]
    fn test_foreign_currency_charge_ignored() {
        let decoder = PaystackWebhookDecoder::new(&PaystackConfig::new(SECRET));
        let (body, signature) = signed_event_in("charge.success", "PAY-1", 19900, "NGN");

        match decoder.decode(&body, Some(&signature)).unwrap() {
            WebhookOutcome::Ignored { reference, status } => {
                assert_eq!(reference, "PAY-1");
                assert!(status.contains("NGN"));
            }
            other => panic!("expected ignored, got {:?}", other),
        }

        let naira = PaystackWebhookDecoder::new(&PaystackConfig::new(SECRET).with_currency("NGN"));
        assert!(matches!(
            naira.decode(&body, Some(&signature)).unwrap(),
            WebhookOutcome::Completed(_)
        ));
    }

    #[test]
    fn test_signature_checked_before_parsing() {
        let decoder = PaystackWebhookDecoder::new(&PaystackConfig::new(SECRET));

        let err = decoder.decode(b"not json", Some("deadbeef")).unwrap_err();
        assert!(matches!(err, PaymentError::SignatureVerification(_)));

        let (body, _) = signed_event("charge.success", "PAY-1", 19900);
        let err = decoder.decode(&body, None).unwrap_err();
        assert!(matches!(err, PaymentError::SignatureVerification(_)));

        let unconfigured = PaystackWebhookDecoder::new(&PaystackConfig::default());
        let (body, signature) = signed_event("charge.success", "PAY-1", 19900);
        let err = unconfigured.decode(&body, Some(&signature)).unwrap_err();
        assert!(matches!(err, PaymentError::SignatureVerification(_)));
    }

    #[test]
    fn test_signed_garbage_is_malformed() {
        let decoder = PaystackWebhookDecoder::new(&PaystackConfig::new(SECRET));
        let body = b"{\"event\": 42}";
        let signature = hmac_sha512_hex(SECRET, body).unwrap();

        let err = decoder.decode(body, Some(&signature)).unwrap_err();
        assert!(matches!(err, PaymentError::MalformedPayload(_)));
    }
}
