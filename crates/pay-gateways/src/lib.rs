//! # pay-gateways
//!
//! South African payment gateways for cipc-pay.
//!
//! Each gateway contributes two halves:
//!
//! 1. **Adapter** (`PaymentGateway`) - opens a hosted-payment session
//!    - `OzowGateway`: signed pay.ozow.com link (primary)
//!    - `PayFastGateway`: signed PayFast process link (alternate 1)
//!    - `PaystackGateway`: Transaction Initialize API (alternate 2)
//!
//! 2. **Decoder** (`WebhookDecoder`) - verifies and normalizes notifications
//!    - `/webhooks/ozow`: SHA-512 `hash` field
//!    - `/webhooks/payfast`: MD5 `signature` field
//!    - `/webhooks/paystack`: HMAC-SHA512 `x-paystack-signature` header
//!    - `/webhooks/payment`: HMAC-SHA256 `x-webhook-signature` header
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pay_core::{GatewayChain, PaymentConfig};
//! use pay_gateways::{build_gateways, build_webhook_registry, GatewayCredentials};
//!
//! let credentials = GatewayCredentials::from_env();
//! let config = PaymentConfig::default();
//!
//! let chain = GatewayChain::ordered(&config.gateway_order, build_gateways(&credentials)?);
//! let webhooks = build_webhook_registry(&credentials);
//! ```

pub mod config;
pub mod legacy;
pub mod ozow;
pub mod payfast;
pub mod paystack;
pub mod query;
pub mod signature;
pub mod timestamp;

use pay_core::{BoxedPaymentGateway, PaymentResult, WebhookRegistry};
use std::sync::Arc;

// Re-exports
pub use config::{CallbackUrls, GatewayCredentials, OzowConfig, PayFastConfig, PaystackConfig};
pub use legacy::LegacyWebhookDecoder;
pub use ozow::{OzowGateway, OzowWebhookDecoder};
pub use payfast::{PayFastGateway, PayFastWebhookDecoder};
pub use paystack::{PaystackGateway, PaystackWebhookDecoder};

/// One adapter per gateway, in default priority order
pub fn build_gateways(credentials: &GatewayCredentials) -> PaymentResult<Vec<BoxedPaymentGateway>> {
    let urls = &credentials.urls;

    let ozow: BoxedPaymentGateway =
        Arc::new(OzowGateway::new(credentials.ozow.clone(), urls.clone()));
    let payfast: BoxedPaymentGateway =
        Arc::new(PayFastGateway::new(credentials.payfast.clone(), urls.clone()));
    let paystack: BoxedPaymentGateway =
        Arc::new(PaystackGateway::new(credentials.paystack.clone(), urls.clone())?);

    Ok(vec![ozow, payfast, paystack])
}

/// Decoders for every webhook route
pub fn build_webhook_registry(credentials: &GatewayCredentials) -> WebhookRegistry {
    WebhookRegistry::new()
        .with_decoder(Arc::new(OzowWebhookDecoder::new(&credentials.ozow)))
        .with_decoder(Arc::new(PayFastWebhookDecoder::new(&credentials.payfast)))
        .with_decoder(Arc::new(PaystackWebhookDecoder::new(&credentials.paystack)))
        .with_decoder(Arc::new(LegacyWebhookDecoder::new(
            credentials.legacy_webhook_secret.clone(),
        )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pay_core::{Gateway, GatewayChain, PaymentConfig};

    #[test]
    fn test_build_gateways_in_priority_order() {
        let gateways = build_gateways(&GatewayCredentials::default()).unwrap();
        let chain = GatewayChain::ordered(&PaymentConfig::default().gateway_order, gateways);

        assert_eq!(
            chain.identities(),
            vec![Gateway::Ozow, Gateway::PayFast, Gateway::Paystack]
        );
    }

    #[test]
    fn test_registry_sources() {
        let registry = build_webhook_registry(&GatewayCredentials::default());
        assert_eq!(registry.sources(), vec!["ozow", "payfast", "payment", "paystack"]);
        assert_eq!(
            registry.get("paystack").unwrap().signature_header(),
            Some("x-paystack-signature")
        );
        assert!(registry.get("ozow").unwrap().signature_header().is_none());
    }
}
