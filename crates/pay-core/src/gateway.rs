//! # Payment Gateway Trait
//!
//! One capability shared by every hosted-payment provider: create a
//! payment session and hand back the redirect URL.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   PaymentGateway (trait)                    │
//! │  ├── create_session()                                       │
//! │  └── gateway()                                              │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!          ┌─────────────────┼─────────────────┐
//!          │                 │                 │
//!  ┌───────┴───────┐ ┌───────┴───────┐ ┌───────┴───────┐
//!  │  OzowGateway  │ │PayFastGateway │ │PaystackGateway│
//!  │   (primary)   │ │ (alternate 1) │ │ (alternate 2) │
//!  └───────────────┘ └───────────────┘ └───────────────┘
//! ```
//!
//! The orchestrator walks a [`GatewayChain`] in priority order.

use crate::error::{PaymentError, PaymentResult};
use crate::payment::PaymentRequest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Supported hosted-payment gateways
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gateway {
    Ozow,
    PayFast,
    Paystack,
}

impl Gateway {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gateway::Ozow => "ozow",
            Gateway::PayFast => "payfast",
            Gateway::Paystack => "paystack",
        }
    }
}

impl std::fmt::Display for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Gateway {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ozow" => Ok(Gateway::Ozow),
            "payfast" => Ok(Gateway::PayFast),
            "paystack" => Ok(Gateway::Paystack),
            other => Err(PaymentError::Configuration(format!(
                "Unknown gateway: {}",
                other
            ))),
        }
    }
}

/// A hosted payment session created by a gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewaySession {
    /// URL to redirect the customer to
    pub payment_url: String,

    /// Gateway-assigned identifier (access code, transaction id)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_reference: Option<String>,
}

impl GatewaySession {
    pub fn new(payment_url: impl Into<String>) -> Self {
        Self {
            payment_url: payment_url.into(),
            gateway_reference: None,
        }
    }

    /// Builder: attach the gateway's own identifier
    pub fn with_gateway_reference(mut self, reference: impl Into<String>) -> Self {
        self.gateway_reference = Some(reference.into());
        self
    }
}

/// Core trait for hosted-payment gateway adapters.
///
/// Implementations receive all configuration at construction and must not
/// read process state or mutate anything shared.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a hosted payment session for `request` under `reference`.
    ///
    /// Fails when credentials are missing or the gateway rejects the call.
    async fn create_session(
        &self,
        request: &PaymentRequest,
        reference: &str,
    ) -> PaymentResult<GatewaySession>;

    /// Identity of this gateway (for logging and the payment record)
    fn gateway(&self) -> Gateway;
}

/// Type alias for a shared gateway (dynamic dispatch)
pub type BoxedPaymentGateway = Arc<dyn PaymentGateway>;

/// Gateways in the order they are attempted
#[derive(Clone, Default)]
pub struct GatewayChain {
    gateways: Vec<BoxedPaymentGateway>,
}

impl GatewayChain {
    pub fn new() -> Self {
        Self {
            gateways: Vec::new(),
        }
    }

    /// Append a gateway at the lowest priority
    pub fn push(&mut self, gateway: BoxedPaymentGateway) {
        self.gateways.push(gateway);
    }

    /// Builder: append a gateway
    pub fn with_gateway(mut self, gateway: BoxedPaymentGateway) -> Self {
        self.push(gateway);
        self
    }

    /// Build a chain from available gateways, ordered by `order`.
    ///
    /// Entries in `order` with no matching gateway are skipped.
    pub fn ordered(order: &[Gateway], available: Vec<BoxedPaymentGateway>) -> Self {
        let gateways = order
            .iter()
            .filter_map(|wanted| available.iter().find(|g| g.gateway() == *wanted).cloned())
            .collect();
        Self { gateways }
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoxedPaymentGateway> {
        self.gateways.iter()
    }

    /// Gateway identities in priority order
    pub fn identities(&self) -> Vec<Gateway> {
        self.gateways.iter().map(|g| g.gateway()).collect()
    }

    pub fn len(&self) -> usize {
        self.gateways.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gateways.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticGateway(Gateway);

    #[async_trait]
    impl PaymentGateway for StaticGateway {
        async fn create_session(
            &self,
            _request: &PaymentRequest,
            reference: &str,
        ) -> PaymentResult<GatewaySession> {
            Ok(GatewaySession::new(format!("https://{}/{}", self.0, reference)))
        }

        fn gateway(&self) -> Gateway {
            self.0
        }
    }

    #[test]
    fn test_gateway_parse() {
        assert_eq!("PayFast".parse::<Gateway>().unwrap(), Gateway::PayFast);
        assert_eq!(" ozow ".parse::<Gateway>().unwrap(), Gateway::Ozow);
        assert!("paypal".parse::<Gateway>().is_err());
    }

    #[test]
    fn test_ordered_chain() {
        let available: Vec<BoxedPaymentGateway> = vec![
            Arc::new(StaticGateway(Gateway::Paystack)),
            Arc::new(StaticGateway(Gateway::Ozow)),
        ];

        let chain = GatewayChain::ordered(
            &[Gateway::Ozow, Gateway::PayFast, Gateway::Paystack],
            available,
        );

        assert_eq!(chain.identities(), vec![Gateway::Ozow, Gateway::Paystack]);
    }

    #[test]
    fn test_empty_chain() {
        let chain = GatewayChain::new();
        assert!(chain.is_empty());
        assert_eq!(chain.len(), 0);
    }
}
