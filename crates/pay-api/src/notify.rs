//! # WhatsApp Notifications
//!
//! Tells the customer over WhatsApp (AiSensy messaging API) that their
//! payment arrived and the filing has started.

use async_trait::async_trait;
use pay_core::money::format_major;
use pay_core::{CustomerContact, Notifier, PaymentCompletion, PaymentError, PaymentResult};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{error, info, instrument};

const DEFAULT_BASE_URL: &str = "https://api.aisensy.com";

/// AiSensy API configuration
#[derive(Debug, Clone)]
pub struct AiSensyConfig {
    pub api_key: String,
    pub base_url: String,
}

impl AiSensyConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// `None` when `AISENSY_API_KEY` is unset
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("AISENSY_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())?;
        let base_url =
            std::env::var("AISENSY_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Some(Self::new(api_key).with_base_url(base_url))
    }
}

/// Normalize a South African number to `27XXXXXXXXX`
pub fn format_phone_number(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    match digits.len() {
        10 if digits.starts_with('0') => format!("27{}", &digits[1..]),
        9 => format!("27{}", digits),
        _ => digits,
    }
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    phone_number: String,
    message: String,
    message_type: &'a str,
}

/// Sends a WhatsApp text for every applied payment completion
pub struct AiSensyNotifier {
    config: AiSensyConfig,
    client: Client,
}

impl AiSensyNotifier {
    pub fn new(config: AiSensyConfig) -> PaymentResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| PaymentError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn message(contact: &CustomerContact, completion: &PaymentCompletion) -> String {
        let greeting = if contact.name.is_empty() {
            "Hi".to_string()
        } else {
            format!("Hi {}", contact.name)
        };

        format!(
            "{}, we received your payment of R{} (ref {}). \
             Your CIPC annual return filing is now in progress.",
            greeting,
            format_major(completion.amount),
            completion.reference
        )
    }

    fn collaborator_error(message: impl Into<String>) -> PaymentError {
        PaymentError::Collaborator {
            collaborator: "aisensy".to_string(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl Notifier for AiSensyNotifier {
    #[instrument(skip(self, contact, completion), fields(reference = %completion.reference))]
    async fn notify(
        &self,
        contact: &CustomerContact,
        completion: &PaymentCompletion,
    ) -> PaymentResult<()> {
        if contact.phone.trim().is_empty() {
            info!("No phone number on record; skipping WhatsApp notification");
            return Ok(());
        }

        let body = SendMessage {
            phone_number: format_phone_number(&contact.phone),
            message: Self::message(contact, completion),
            message_type: "text",
        };

        let url = format!("{}/message/send", self.config.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::collaborator_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!("AiSensy API error: status={}, body={}", status, text);
            return Err(Self::collaborator_error(format!("HTTP {}", status)));
        }

        info!("WhatsApp notification sent");
        Ok(())
    }
}
