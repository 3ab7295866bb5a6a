//! # Application State
//!
//! Shared state for the Axum application: the payment orchestrator, the
//! webhook decoders, the workflow engine and server configuration.

use crate::notify::{AiSensyConfig, AiSensyNotifier};
use pay_core::{
    BoxedNotifier, BoxedWorkflowEngine, GatewayChain, InMemoryPaymentStore, LoggingNotifier,
    LoggingWorkflowEngine, PaymentConfig, PaymentService, WebhookRegistry,
};
use pay_gateways::{build_gateways, build_webhook_registry, GatewayCredentials};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Startup configuration problems
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid socket address {0}")]
    InvalidAddress(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Failed to parse {path}: {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for gateway callbacks
    pub base_url: String,
    /// Environment (development, staging, production)
    pub environment: String,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            base_url: std::env::var("BASE_URL")
                .unwrap_or_else(|_| "https://api.cipcagent.co.za".to_string()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|_| ConfigError::InvalidAddress(addr))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Payment orchestrator
    pub payments: Arc<PaymentService>,
    /// Webhook decoders keyed by route source
    pub webhooks: WebhookRegistry,
    /// Filing workflow hand-off
    pub workflows: BoxedWorkflowEngine,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Build the production state from environment and config files
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let mut credentials = GatewayCredentials::from_env();
        let payment_config = load_payment_config(|key| std::env::var(key).ok())?;
        credentials.paystack = credentials
            .paystack
            .with_currency(payment_config.currency.clone());

        let chain = GatewayChain::ordered(
            &payment_config.gateway_order,
            build_gateways(&credentials)
                .map_err(|e| anyhow::anyhow!("Failed to initialize gateways: {}", e))?,
        );

        let configured = credentials.configured_gateways();
        if configured.is_empty() {
            warn!("No gateway credentials configured; payment creation will fail");
        } else {
            info!("Gateways with credentials: {:?}", configured);
        }

        let notifier: BoxedNotifier = match AiSensyConfig::from_env() {
            Some(aisensy) => {
                info!("WhatsApp notifications enabled via AiSensy");
                Arc::new(
                    AiSensyNotifier::new(aisensy)
                        .map_err(|e| anyhow::anyhow!("Failed to initialize AiSensy: {}", e))?,
                )
            }
            None => Arc::new(LoggingNotifier),
        };

        let service = PaymentService::new(
            payment_config,
            chain,
            Arc::new(InMemoryPaymentStore::new()),
            notifier,
        );

        Ok(Self::from_parts(
            config,
            service,
            build_webhook_registry(&credentials),
            Arc::new(LoggingWorkflowEngine),
        ))
    }

    /// Assemble state from already-built parts
    pub fn from_parts(
        config: AppConfig,
        payments: PaymentService,
        webhooks: WebhookRegistry,
        workflows: BoxedWorkflowEngine,
    ) -> Self {
        Self {
            payments: Arc::new(payments),
            webhooks,
            workflows,
            config,
        }
    }
}

/// Defaults, then `config/payments.toml` if present, then env overrides
pub fn load_payment_config(
    env: impl Fn(&str) -> Option<String>,
) -> Result<PaymentConfig, ConfigError> {
    let config_paths = [
        "config/payments.toml",
        "../config/payments.toml",
        "../../config/payments.toml",
    ];

    let mut config = PaymentConfig::default();
    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            config = PaymentConfig::from_toml(&content).map_err(|source| ConfigError::Toml {
                path: path.to_string(),
                source,
            })?;
            info!("Loaded payment config from {}", path);
            break;
        }
    }

    apply_env_overrides(config, env)
}

/// Apply `PAYMENT_MIN_AMOUNT`, `PAYMENT_MAX_AMOUNT` and `GATEWAY_TIMEOUT_SECS`
pub fn apply_env_overrides(
    mut config: PaymentConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<PaymentConfig, ConfigError> {
    if let Some(value) = env("PAYMENT_MIN_AMOUNT") {
        config.min_amount = parse_env("PAYMENT_MIN_AMOUNT", &value)?;
    }
    if let Some(value) = env("PAYMENT_MAX_AMOUNT") {
        config.max_amount = parse_env("PAYMENT_MAX_AMOUNT", &value)?;
    }
    if let Some(value) = env("GATEWAY_TIMEOUT_SECS") {
        config.gateway_timeout_secs = parse_env("GATEWAY_TIMEOUT_SECS", &value)?;
    }

    if config.min_amount > config.max_amount {
        return Err(ConfigError::InvalidValue {
            key: "PAYMENT_MIN_AMOUNT".to_string(),
            value: format!("{} exceeds maximum {}", config.min_amount, config.max_amount),
        });
    }

    Ok(config)
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}
