//! # Webhook Normalization
//!
//! Each gateway posts its own payload schema. A [`WebhookDecoder`] verifies
//! the payload and turns it into one [`WebhookOutcome`], so status
//! transitions are written once, in the orchestrator.

use crate::error::{PaymentError, PaymentResult};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// A gateway reported a successful payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCompletion {
    /// Our payment reference
    pub reference: String,

    /// Amount in minor units of the supported currency
    pub amount: i64,

    /// Status literal exactly as the gateway sent it
    pub gateway_status: String,

    /// Gateway transaction identifier
    pub gateway_id: String,

    /// Webhook source ("ozow", "payfast", "paystack", "payment")
    pub source: String,

    pub timestamp: DateTime<Utc>,
}

/// A gateway reported a terminal failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentFailure {
    pub reference: String,
    pub gateway_status: String,
    pub gateway_id: String,
    pub source: String,
    pub timestamp: DateTime<Utc>,
}

/// What a verified webhook means for the payment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Success literal recognised
    Completed(PaymentCompletion),
    /// Failure literal recognised
    Failed(PaymentFailure),
    /// Valid payload with no business effect (pending, informational events)
    Ignored { reference: String, status: String },
}

impl WebhookOutcome {
    pub fn reference(&self) -> &str {
        match self {
            WebhookOutcome::Completed(c) => &c.reference,
            WebhookOutcome::Failed(f) => &f.reference,
            WebhookOutcome::Ignored { reference, .. } => reference,
        }
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, WebhookOutcome::Ignored { .. })
    }
}

/// Verifies and decodes one gateway's webhook payloads.
pub trait WebhookDecoder: Send + Sync {
    /// Route segment this decoder serves (`/webhooks/{source}`)
    fn source(&self) -> &'static str;

    /// Header carrying the signature, for gateways that sign out-of-band
    fn signature_header(&self) -> Option<&'static str> {
        None
    }

    /// Decode, verify, then interpret a raw payload.
    ///
    /// Decode failures are `MalformedPayload`; a missing or wrong signature
    /// is `SignatureVerification`. Only verified payloads yield an outcome.
    fn decode(&self, payload: &[u8], signature: Option<&str>) -> PaymentResult<WebhookOutcome>;
}

/// Type alias for a shared webhook decoder
pub type BoxedWebhookDecoder = Arc<dyn WebhookDecoder>;

/// Decoders keyed by source name
#[derive(Clone, Default)]
pub struct WebhookRegistry {
    decoders: HashMap<String, BoxedWebhookDecoder>,
}

impl WebhookRegistry {
    pub fn new() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Register a decoder under its source name
    pub fn register(&mut self, decoder: BoxedWebhookDecoder) {
        self.decoders.insert(decoder.source().to_string(), decoder);
    }

    /// Register with builder pattern
    pub fn with_decoder(mut self, decoder: BoxedWebhookDecoder) -> Self {
        self.register(decoder);
        self
    }

    pub fn get(&self, source: &str) -> Option<&BoxedWebhookDecoder> {
        self.decoders.get(source)
    }

    /// List all registered sources
    pub fn sources(&self) -> Vec<&str> {
        let mut sources: Vec<&str> = self.decoders.keys().map(|s| s.as_str()).collect();
        sources.sort_unstable();
        sources
    }
}

/// Parse a JSON webhook body, mapping failures to `MalformedPayload`
pub fn decode_json<T: DeserializeOwned>(payload: &[u8]) -> PaymentResult<T> {
    serde_json::from_slice(payload)
        .map_err(|e| PaymentError::MalformedPayload(format!("Failed to parse webhook: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoDecoder;

    impl WebhookDecoder for EchoDecoder {
        fn source(&self) -> &'static str {
            "echo"
        }

        fn decode(&self, payload: &[u8], _signature: Option<&str>) -> PaymentResult<WebhookOutcome> {
            #[derive(Deserialize)]
            struct Body {
                reference: String,
            }
            let body: Body = decode_json(payload)?;
            Ok(WebhookOutcome::Ignored {
                reference: body.reference,
                status: "echo".into(),
            })
        }
    }

    #[test]
    fn test_registry_lookup() {
        let registry = WebhookRegistry::new().with_decoder(Arc::new(EchoDecoder));

        assert!(registry.get("echo").is_some());
        assert!(registry.get("ozow").is_none());
        assert_eq!(registry.sources(), vec!["echo"]);
    }

    #[test]
    fn test_decode_json_maps_to_malformed() {
        let err = EchoDecoder.decode(b"not json", None).unwrap_err();
        assert!(matches!(err, PaymentError::MalformedPayload(_)));

        let outcome = EchoDecoder.decode(br#"{"reference":"PAY-1"}"#, None).unwrap();
        assert_eq!(outcome.reference(), "PAY-1");
        assert!(outcome.is_ignored());
    }
}
