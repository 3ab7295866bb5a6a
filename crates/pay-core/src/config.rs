//! # Payment Configuration
//!
//! Amount limits, the supported currency, session TTL and gateway priority.
//! Constructed once at startup (defaults, then `config/payments.toml`, then
//! env overrides applied by the API layer) and passed into the orchestrator.

use crate::gateway::Gateway;
use serde::{Deserialize, Serialize};

/// Orchestrator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentConfig {
    /// Smallest accepted amount in minor units (inclusive)
    pub min_amount: i64,

    /// Largest accepted amount in minor units (inclusive)
    pub max_amount: i64,

    /// The single accepted ISO 4217 code
    pub currency: String,

    /// How long a hosted payment session stays valid
    pub session_ttl_minutes: i64,

    /// Upper bound for a single gateway attempt
    pub gateway_timeout_secs: u64,

    /// Prefix for generated references
    pub reference_prefix: String,

    /// Gateways in the order they are attempted
    pub gateway_order: Vec<Gateway>,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            min_amount: 5_000,
            max_amount: 1_000_000,
            currency: "ZAR".to_string(),
            session_ttl_minutes: 30,
            gateway_timeout_secs: 10,
            reference_prefix: "PAY".to_string(),
            gateway_order: vec![Gateway::Ozow, Gateway::PayFast, Gateway::Paystack],
        }
    }
}

impl PaymentConfig {
    /// Load from a TOML document; missing keys keep their defaults
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Builder: set the accepted amount range
    pub fn with_amount_bounds(mut self, min_amount: i64, max_amount: i64) -> Self {
        self.min_amount = min_amount;
        self.max_amount = max_amount;
        self
    }

    /// Builder: set the per-gateway timeout
    pub fn with_gateway_timeout_secs(mut self, secs: u64) -> Self {
        self.gateway_timeout_secs = secs;
        self
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.session_ttl_minutes)
    }

    pub fn gateway_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.gateway_timeout_secs)
    }

    /// Check if an amount lies in the accepted range
    pub fn accepts_amount(&self, amount: i64) -> bool {
        (self.min_amount..=self.max_amount).contains(&amount)
    }
}
