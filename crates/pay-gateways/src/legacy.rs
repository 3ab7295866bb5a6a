//! Generic `/webhooks/payment` notifications from older integrations.
//!
//! Amounts are minor units; the body is signed with HMAC-SHA256 in
//! `x-webhook-signature` using a shared secret.

use crate::signature::{constant_time_compare, hmac_sha256_hex};
use crate::timestamp::timestamp_or_now;
use pay_core::{
    decode_json, PaymentCompletion, PaymentError, PaymentFailure, PaymentResult, WebhookDecoder,
    WebhookOutcome,
};
use serde::Deserialize;
use tracing::warn;

pub const SOURCE: &str = "payment";
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

const EVENT_COMPLETED: &str = "payment.completed";
const EVENT_FAILED: &str = "payment.failed";

#[derive(Debug, Deserialize)]
struct LegacyEvent {
    event: String,
    payment_reference: String,
    #[serde(default)]
    amount: i64,
    #[serde(default)]
    timestamp: String,
}

pub struct LegacyWebhookDecoder {
    secret: Option<String>,
}

impl LegacyWebhookDecoder {
    pub fn new(secret: Option<String>) -> Self {
        Self { secret }
    }
}

impl WebhookDecoder for LegacyWebhookDecoder {
    fn source(&self) -> &'static str {
        SOURCE
    }

    fn signature_header(&self) -> Option<&'static str> {
        Some(SIGNATURE_HEADER)
    }

    fn decode(&self, payload: &[u8], signature: Option<&str>) -> PaymentResult<WebhookOutcome> {
        let secret = self.secret.as_deref().ok_or_else(|| {
            PaymentError::SignatureVerification("Webhook secret not configured".to_string())
        })?;
        let signature = signature.ok_or_else(|| {
            PaymentError::SignatureVerification(format!("Missing {} header", SIGNATURE_HEADER))
        })?;

        let expected = hmac_sha256_hex(secret, payload)?;
        if !constant_time_compare(&expected, &signature.trim().to_lowercase()) {
            warn!("Legacy webhook signature mismatch");
            return Err(PaymentError::SignatureVerification(
                "Signature mismatch".to_string(),
            ));
        }

        let event: LegacyEvent = decode_json(payload)?;
        if event.payment_reference.is_empty() {
            return Err(PaymentError::MalformedPayload(
                "Missing payment_reference".to_string(),
            ));
        }

        let timestamp = timestamp_or_now(&[event.timestamp.as_str()]);

        match event.event.as_str() {
            EVENT_COMPLETED => Ok(WebhookOutcome::Completed(PaymentCompletion {
                reference: event.payment_reference,
                amount: event.amount,
                gateway_status: event.event,
                gateway_id: String::new(),
                source: SOURCE.to_string(),
                timestamp,
            })),
            EVENT_FAILED => Ok(WebhookOutcome::Failed(PaymentFailure {
                reference: event.payment_reference,
                gateway_status: event.event,
                gateway_id: String::new(),
                source: SOURCE.to_string(),
                timestamp,
            })),
            _ => Ok(WebhookOutcome::Ignored {
                reference: event.payment_reference,
                status: event.event,
            }),
        }
    }
}
