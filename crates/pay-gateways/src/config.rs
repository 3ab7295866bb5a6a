//! # Gateway Configuration
//!
//! Credentials and endpoints for every gateway, loaded once from the
//! environment and handed to the adapters and decoders at construction.
//!
//! Missing credentials are not a startup error: the adapter that needs them
//! fails at session time (so the orchestrator falls back) and the matching
//! webhook decoder rejects every payload.

use pay_core::{PaymentError, PaymentResult};
use std::env;

const DEFAULT_BASE_URL: &str = "https://api.cipcagent.co.za";
const OZOW_PAY_URL: &str = "https://pay.ozow.com/";
const PAYFAST_LIVE_URL: &str = "https://www.payfast.co.za/eng/process";
const PAYFAST_SANDBOX_URL: &str = "https://sandbox.payfast.co.za/eng/process";
const PAYSTACK_API_URL: &str = "https://api.paystack.co";
const DEFAULT_CURRENCY: &str = "ZAR";

/// Default item name shown on hosted payment pages
pub const DEFAULT_ITEM_NAME: &str = "CIPC Annual Returns Filing";

/// Where gateways send the customer and their notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackUrls {
    /// Public base URL of this service
    pub base_url: String,
    /// Success page path
    pub success_path: String,
    /// Cancel page path
    pub cancel_path: String,
    /// Error page path
    pub error_path: String,
}

impl CallbackUrls {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            success_path: "/payment/success".to_string(),
            cancel_path: "/payment/cancel".to_string(),
            error_path: "/payment/error".to_string(),
        }
    }

    pub fn success_url(&self) -> String {
        format!("{}{}", self.base_url, self.success_path)
    }

    pub fn cancel_url(&self) -> String {
        format!("{}{}", self.base_url, self.cancel_path)
    }

    pub fn error_url(&self) -> String {
        format!("{}{}", self.base_url, self.error_path)
    }

    /// Webhook endpoint for a source, e.g. `/api/v1/webhooks/ozow`
    pub fn notify_url(&self, source: &str) -> String {
        format!("{}/api/v1/webhooks/{}", self.base_url, source)
    }
}

impl Default for CallbackUrls {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Ozow merchant configuration
#[derive(Debug, Clone)]
pub struct OzowConfig {
    pub site_code: Option<String>,
    /// Used for the request hash and notification hash
    pub private_key: Option<String>,
    pub pay_url: String,
    pub is_test: bool,
}

impl OzowConfig {
    pub fn new(site_code: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            site_code: Some(site_code.into()),
            private_key: Some(private_key.into()),
            pay_url: OZOW_PAY_URL.to_string(),
            is_test: true,
        }
    }

    pub fn from_env() -> Self {
        Self {
            site_code: optional_env("OZOW_SITE_CODE"),
            private_key: optional_env("OZOW_PRIVATE_KEY"),
            pay_url: optional_env("OZOW_PAY_URL").unwrap_or_else(|| OZOW_PAY_URL.to_string()),
            is_test: flag_env("OZOW_IS_TEST", true),
        }
    }
}

impl Default for OzowConfig {
    fn default() -> Self {
        Self {
            site_code: None,
            private_key: None,
            pay_url: OZOW_PAY_URL.to_string(),
            is_test: true,
        }
    }
}

/// PayFast merchant configuration
#[derive(Debug, Clone)]
pub struct PayFastConfig {
    pub merchant_id: Option<String>,
    pub merchant_key: Option<String>,
    /// Salt for request signatures; required to verify ITNs
    pub passphrase: Option<String>,
    pub process_url: String,
    pub item_name: String,
}

impl PayFastConfig {
    pub fn new(merchant_id: impl Into<String>, merchant_key: impl Into<String>) -> Self {
        Self {
            merchant_id: Some(merchant_id.into()),
            merchant_key: Some(merchant_key.into()),
            ..Self::default()
        }
    }

    /// Builder: set passphrase
    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = Some(passphrase.into());
        self
    }

    pub fn from_env() -> Self {
        let process_url = if flag_env("PAYFAST_SANDBOX", false) {
            PAYFAST_SANDBOX_URL
        } else {
            PAYFAST_LIVE_URL
        };

        Self {
            merchant_id: optional_env("PAYFAST_MERCHANT_ID"),
            merchant_key: optional_env("PAYFAST_MERCHANT_KEY"),
            passphrase: optional_env("PAYFAST_PASSPHRASE"),
            process_url: process_url.to_string(),
            item_name: DEFAULT_ITEM_NAME.to_string(),
        }
    }
}

impl Default for PayFastConfig {
    fn default() -> Self {
        Self {
            merchant_id: None,
            merchant_key: None,
            passphrase: None,
            process_url: PAYFAST_LIVE_URL.to_string(),
            item_name: DEFAULT_ITEM_NAME.to_string(),
        }
    }
}

/// Paystack API configuration
#[derive(Debug, Clone)]
pub struct PaystackConfig {
    /// Secret key (sk_test_... or sk_live_...); also signs webhooks
    pub secret_key: Option<String>,
    /// API base URL (for testing/mocking)
    pub api_base_url: String,
    /// Only charges settled in this currency complete a payment
    pub currency: String,
}

impl PaystackConfig {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: Some(secret_key.into()),
            ..Self::default()
        }
    }

    pub fn from_env() -> Self {
        Self {
            secret_key: optional_env("PAYSTACK_SECRET_KEY"),
            api_base_url: optional_env("PAYSTACK_API_URL")
                .unwrap_or_else(|| PAYSTACK_API_URL.to_string()),
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Builder: set the accepted settlement currency
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Check if using test keys
    pub fn is_test_mode(&self) -> bool {
        self.secret_key
            .as_deref()
            .map(|k| k.starts_with("sk_test_"))
            .unwrap_or(false)
    }
}

impl Default for PaystackConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            api_base_url: PAYSTACK_API_URL.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

/// Everything the gateway layer needs, loaded once at startup
#[derive(Debug, Clone, Default)]
pub struct GatewayCredentials {
    pub ozow: OzowConfig,
    pub payfast: PayFastConfig,
    pub paystack: PaystackConfig,
    /// Shared secret for the legacy `/webhooks/payment` route
    pub legacy_webhook_secret: Option<String>,
    pub urls: CallbackUrls,
}

impl GatewayCredentials {
    /// Load configuration from environment variables (and `.env` if present)
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            ozow: OzowConfig::from_env(),
            payfast: PayFastConfig::from_env(),
            paystack: PaystackConfig::from_env(),
            legacy_webhook_secret: optional_env("PAYMENT_WEBHOOK_SECRET"),
            urls: CallbackUrls::new(
                optional_env("BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            ),
        }
    }

    /// Names of gateways with complete credentials
    pub fn configured_gateways(&self) -> Vec<&'static str> {
        let mut configured = Vec::new();
        if self.ozow.site_code.is_some() && self.ozow.private_key.is_some() {
            configured.push("ozow");
        }
        if self.payfast.merchant_id.is_some() && self.payfast.merchant_key.is_some() {
            configured.push("payfast");
        }
        if self.paystack.secret_key.is_some() {
            configured.push("paystack");
        }
        configured
    }
}

/// Borrow a required credential or fail with a configuration error
pub(crate) fn require<'a>(value: &'a Option<String>, name: &str) -> PaymentResult<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| PaymentError::Configuration(format!("{} not set", name)))
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn flag_env(key: &str, default: bool) -> bool {
    optional_env(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}
