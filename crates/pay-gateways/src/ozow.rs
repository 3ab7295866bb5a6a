//! # Ozow
//!
//! Primary gateway. Sessions are hosted-payment URLs signed with a SHA-512
//! `HashCheck`; notifications carry the same style of hash in the body.

use crate::config::{require, CallbackUrls, OzowConfig};
use crate::query::encode_pairs;
use crate::signature::{constant_time_compare, sha512_hex};
use crate::timestamp::timestamp_or_now;
use async_trait::async_trait;
use pay_core::money::{format_major, minor_units_from_major};
use pay_core::{
    decode_json, Gateway, GatewaySession, PaymentCompletion, PaymentError, PaymentFailure,
    PaymentGateway, PaymentRequest, PaymentResult, WebhookDecoder, WebhookOutcome,
};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

pub const SOURCE: &str = "ozow";

const COUNTRY_CODE: &str = "ZA";
const STATUS_COMPLETE: &str = "Complete";
const FAILURE_STATUSES: &[&str] = &["Cancelled", "Error", "Abandoned"];

/// SHA-512 over the lower-cased concatenation of `values` and the private key
fn hash_check(values: &[&str], private_key: &str) -> String {
    let mut base: String = values.concat();
    base.push_str(private_key);
    sha512_hex(&base.to_lowercase())
}

/// Ozow hosted-payment adapter
pub struct OzowGateway {
    config: OzowConfig,
    urls: CallbackUrls,
}

impl OzowGateway {
    pub fn new(config: OzowConfig, urls: CallbackUrls) -> Self {
        Self { config, urls }
    }

    fn build_url(&self, request: &PaymentRequest, reference: &str) -> PaymentResult<String> {
        let site_code = require(&self.config.site_code, "OZOW_SITE_CODE")?;
        let private_key = require(&self.config.private_key, "OZOW_PRIVATE_KEY")?;

        let customer = if request.customer.name.is_empty() {
            request.customer.company_number.clone()
        } else {
            request.customer.name.clone()
        };

        let fields: Vec<(&str, String)> = vec![
            ("SiteCode", site_code.to_string()),
            ("CountryCode", COUNTRY_CODE.to_string()),
            ("CurrencyCode", request.currency.clone()),
            ("Amount", format_major(request.amount)),
            ("TransactionReference", reference.to_string()),
            ("BankReference", reference.to_string()),
            ("Customer", customer),
            (
                "CancelUrl",
                request.cancel_url.clone().unwrap_or_else(|| self.urls.cancel_url()),
            ),
            ("ErrorUrl", self.urls.error_url()),
            (
                "SuccessUrl",
                request.success_url.clone().unwrap_or_else(|| self.urls.success_url()),
            ),
            (
                "NotifyUrl",
                request.notify_url.clone().unwrap_or_else(|| self.urls.notify_url(SOURCE)),
            ),
            ("IsTest", self.config.is_test.to_string()),
        ];

        let values: Vec<&str> = fields.iter().map(|(_, v)| v.trim()).collect();
        let hash = hash_check(&values, private_key);

        let mut params = fields;
        params.push(("HashCheck", hash));

        Ok(format!("{}?{}", self.config.pay_url, encode_pairs(&params)))
    }
}

#[async_trait]
impl PaymentGateway for OzowGateway {
    #[instrument(skip(self, request), fields(gateway = SOURCE))]
    async fn create_session(
        &self,
        request: &PaymentRequest,
        reference: &str,
    ) -> PaymentResult<GatewaySession> {
        let url = self.build_url(request, reference)?;
        debug!("Built Ozow payment link for {}", reference);
        Ok(GatewaySession::new(url))
    }

    fn gateway(&self) -> Gateway {
        Gateway::Ozow
    }
}

/// Ozow notification body
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct OzowNotification {
    transaction_id: String,
    transaction_reference: String,
    amount: String,
    status: String,
    optional1: String,
    optional2: String,
    optional3: String,
    optional4: String,
    created: String,
    completed: String,
    hash: String,
}

impl OzowNotification {
    fn signed_values(&self) -> [&str; 10] {
        [
            self.transaction_id.as_str(),
            self.transaction_reference.as_str(),
            self.amount.as_str(),
            self.status.as_str(),
            self.optional1.as_str(),
            self.optional2.as_str(),
            self.optional3.as_str(),
            self.optional4.as_str(),
            self.created.as_str(),
            self.completed.as_str(),
        ]
    }
}

/// Verifies Ozow notifications against the private key
pub struct OzowWebhookDecoder {
    private_key: Option<String>,
}

impl OzowWebhookDecoder {
    pub fn new(config: &OzowConfig) -> Self {
        Self {
            private_key: config.private_key.clone(),
        }
    }
}

impl WebhookDecoder for OzowWebhookDecoder {
    fn source(&self) -> &'static str {
        SOURCE
    }

    fn decode(&self, payload: &[u8], _signature: Option<&str>) -> PaymentResult<WebhookOutcome> {
        let notification: OzowNotification = decode_json(payload)?;

        let private_key = self.private_key.as_deref().ok_or_else(|| {
            PaymentError::SignatureVerification("Ozow private key not configured".to_string())
        })?;

        if notification.hash.is_empty() {
            return Err(PaymentError::SignatureVerification(
                "Missing Ozow hash".to_string(),
            ));
        }

        let expected = hash_check(&notification.signed_values(), private_key);
        let received = notification.hash.trim().to_lowercase();
        if !constant_time_compare(&expected, &received) {
            warn!("Ozow hash mismatch for {}", notification.transaction_reference);
            return Err(PaymentError::SignatureVerification(
                "Ozow hash mismatch".to_string(),
            ));
        }

        if notification.transaction_reference.is_empty() {
            return Err(PaymentError::MalformedPayload(
                "Missing transactionReference".to_string(),
            ));
        }

        let timestamp = timestamp_or_now(&[
            notification.completed.as_str(),
            notification.created.as_str(),
        ]);
        let status = notification.status.as_str();

        if status == STATUS_COMPLETE {
            let amount = minor_units_from_major(&notification.amount)?;
            return Ok(WebhookOutcome::Completed(PaymentCompletion {
                reference: notification.transaction_reference,
                amount,
                gateway_status: notification.status,
                gateway_id: notification.transaction_id,
                source: SOURCE.to_string(),
                timestamp,
            }));
        }

        if FAILURE_STATUSES.contains(&status) {
            return Ok(WebhookOutcome::Failed(PaymentFailure {
                reference: notification.transaction_reference,
                gateway_status: notification.status,
                gateway_id: notification.transaction_id,
                source: SOURCE.to_string(),
                timestamp,
            }));
        }

        Ok(WebhookOutcome::Ignored {
            reference: notification.transaction_reference,
            status: notification.status,
        })
    }
}
