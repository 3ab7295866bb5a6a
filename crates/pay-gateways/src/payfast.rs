//! # PayFast
//!
//! First alternate. Sessions are hosted-payment URLs with an MD5
//! `signature`; ITNs (instant transaction notifications) are signed the
//! same way over their own fields.

use crate::config::{require, CallbackUrls, PayFastConfig};
use crate::query::{encode_pairs, encode_value};
use crate::signature::{constant_time_compare, md5_hex};
use async_trait::async_trait;
use chrono::Utc;
use pay_core::money::{format_major, minor_units_from_major};
use pay_core::{
    decode_json, Gateway, GatewaySession, PaymentCompletion, PaymentError, PaymentFailure,
    PaymentGateway, PaymentRequest, PaymentResult, WebhookDecoder, WebhookOutcome,
};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

pub const SOURCE: &str = "payfast";

const STATUS_COMPLETE: &str = "COMPLETE";
const FAILURE_STATUSES: &[&str] = &["FAILED", "CANCELLED"];

/// MD5 over the encoded parameter string, salted with the passphrase
fn sign(param_string: &str, passphrase: Option<&str>) -> String {
    match passphrase {
        Some(passphrase) if !passphrase.is_empty() => md5_hex(&format!(
            "{}&passphrase={}",
            param_string,
            encode_value(passphrase.trim())
        )),
        _ => md5_hex(param_string),
    }
}

/// PayFast hosted-payment adapter
pub struct PayFastGateway {
    config: PayFastConfig,
    urls: CallbackUrls,
}

impl PayFastGateway {
    pub fn new(config: PayFastConfig, urls: CallbackUrls) -> Self {
        Self { config, urls }
    }

    fn build_url(&self, request: &PaymentRequest, reference: &str) -> PaymentResult<String> {
        let merchant_id = require(&self.config.merchant_id, "PAYFAST_MERCHANT_ID")?;
        let merchant_key = require(&self.config.merchant_key, "PAYFAST_MERCHANT_KEY")?;

        let item_name = if request.description.is_empty() {
            self.config.item_name.clone()
        } else {
            request.description.clone()
        };

        let params: Vec<(&str, String)> = vec![
            ("merchant_id", merchant_id.to_string()),
            ("merchant_key", merchant_key.to_string()),
            (
                "return_url",
                request.success_url.clone().unwrap_or_else(|| self.urls.success_url()),
            ),
            (
                "cancel_url",
                request.cancel_url.clone().unwrap_or_else(|| self.urls.cancel_url()),
            ),
            (
                "notify_url",
                request.notify_url.clone().unwrap_or_else(|| self.urls.notify_url(SOURCE)),
            ),
            ("name_first", request.customer.name.clone()),
            ("email_address", request.customer.email.clone()),
            ("m_payment_id", reference.to_string()),
            ("amount", format_major(request.amount)),
            ("item_name", item_name),
        ];

        let param_string = encode_pairs(&params);
        let signature = sign(&param_string, self.config.passphrase.as_deref());

        Ok(format!(
            "{}?{}&signature={}",
            self.config.process_url, param_string, signature
        ))
    }
}

#[async_trait]
impl PaymentGateway for PayFastGateway {
    #[instrument(skip(self, request), fields(gateway = SOURCE))]
    async fn create_session(
        &self,
        request: &PaymentRequest,
        reference: &str,
    ) -> PaymentResult<GatewaySession> {
        let url = self.build_url(request, reference)?;
        debug!("Built PayFast payment link for {}", reference);
        Ok(GatewaySession::new(url))
    }

    fn gateway(&self) -> Gateway {
        Gateway::PayFast
    }
}

/// PayFast ITN body
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PayFastItn {
    m_payment_id: String,
    pf_payment_id: String,
    payment_status: String,
    item_name: String,
    amount_gross: String,
    amount_fee: String,
    amount_net: String,
    email_address: String,
    merchant_id: String,
    signature: String,
}

impl PayFastItn {
    fn param_string(&self) -> String {
        encode_pairs(&[
            ("m_payment_id", self.m_payment_id.clone()),
            ("pf_payment_id", self.pf_payment_id.clone()),
            ("payment_status", self.payment_status.clone()),
            ("item_name", self.item_name.clone()),
            ("amount_gross", self.amount_gross.clone()),
            ("amount_fee", self.amount_fee.clone()),
            ("amount_net", self.amount_net.clone()),
            ("email_address", self.email_address.clone()),
            ("merchant_id", self.merchant_id.clone()),
        ])
    }
}

/// Verifies PayFast ITNs against the passphrase
pub struct PayFastWebhookDecoder {
    merchant_id: Option<String>,
    passphrase: Option<String>,
}

impl PayFastWebhookDecoder {
    pub fn new(config: &PayFastConfig) -> Self {
        Self {
            merchant_id: config.merchant_id.clone(),
            passphrase: config.passphrase.clone(),
        }
    }

    fn verify(&self, itn: &PayFastItn) -> PaymentResult<()> {
        let passphrase = self.passphrase.as_deref().ok_or_else(|| {
            PaymentError::SignatureVerification("PayFast passphrase not configured".to_string())
        })?;

        if itn.signature.is_empty() {
            return Err(PaymentError::SignatureVerification(
                "Missing PayFast signature".to_string(),
            ));
        }

        let expected = sign(&itn.param_string(), Some(passphrase));
        if !constant_time_compare(&expected, &itn.signature.trim().to_lowercase()) {
            warn!("PayFast signature mismatch for {}", itn.m_payment_id);
            return Err(PaymentError::SignatureVerification(
                "PayFast signature mismatch".to_string(),
            ));
        }

        if let Some(ref merchant_id) = self.merchant_id {
            if !itn.merchant_id.is_empty() && &itn.merchant_id != merchant_id {
                warn!("PayFast ITN for foreign merchant {}", itn.merchant_id);
                return Err(PaymentError::SignatureVerification(
                    "PayFast merchant mismatch".to_string(),
                ));
            }
        }

        Ok(())
    }
}

impl WebhookDecoder for PayFastWebhookDecoder {
    fn source(&self) -> &'static str {
        SOURCE
    }

    fn decode(&self, payload: &[u8], _signature: Option<&str>) -> PaymentResult<WebhookOutcome> {
        let itn: PayFastItn = decode_json(payload)?;
        self.verify(&itn)?;

        if itn.m_payment_id.is_empty() {
            return Err(PaymentError::MalformedPayload(
                "Missing m_payment_id".to_string(),
            ));
        }

        match itn.payment_status.as_str() {
            STATUS_COMPLETE => {
                let amount = minor_units_from_major(&itn.amount_gross)?;
                Ok(WebhookOutcome::Completed(PaymentCompletion {
                    reference: itn.m_payment_id,
                    amount,
                    gateway_status: itn.payment_status,
                    gateway_id: itn.pf_payment_id,
                    source: SOURCE.to_string(),
                    timestamp: Utc::now(),
                }))
            }
            status if FAILURE_STATUSES.contains(&status) => {
                Ok(WebhookOutcome::Failed(PaymentFailure {
                    reference: itn.m_payment_id,
                    gateway_status: itn.payment_status,
                    gateway_id: itn.pf_payment_id,
                    source: SOURCE.to_string(),
                    timestamp: Utc::now(),
                }))
            }
            _ => Ok(WebhookOutcome::Ignored {
                reference: itn.m_payment_id,
                status: itn.payment_status,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pay_core::Customer;
    use serde_json::json;

    const PASSPHRASE: &str = "jt7NOE43FZPn";

    /// Signed ITN body as PayFast would post it
    fn signed_itn(reference: &str, status: &str, amount_gross: &str) -> Vec<u8> {
        let itn = PayFastItn {
            m_payment_id: reference.into(),
            pf_payment_id: "1089250".into(),
            payment_status: status.into(),
            item_name: "CIPC Annual Returns Filing".into(),
            amount_gross: amount_gross.into(),
            amount_fee: "-4.58".into(),
            amount_net: "194.42".into(),
            email_address: "a@b.com".into(),
            merchant_id: "10000100".into(),
            signature: String::new(),
        };
        let signature = sign(&itn.param_string(), Some(PASSPHRASE));

        serde_json::to_vec(&json!({
            "m_payment_id": itn.m_payment_id,
            "pf_payment_id": itn.pf_payment_id,
            "payment_status": itn.payment_status,
            "item_name": itn.item_name,
            "amount_gross": itn.amount_gross,
            "amount_fee": itn.amount_fee,
            "amount_net": itn.amount_net,
            "email_address": itn.email_address,
            "merchant_id": itn.merchant_id,
            "signature": signature,
        }))
        .unwrap()
    }

    fn config() -> PayFastConfig {
        PayFastConfig::new("10000100", "46f0cd694581a").with_passphrase(PASSPHRASE)
    }

    fn request() -> PaymentRequest {
        PaymentRequest::new(19900, "ZAR").with_customer(Customer {
            company_number: "202212345".into(),
            email: "a@b.com".into(),
            name: "Thandi".into(),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_session_url() {
        let gateway = PayFastGateway::new(config(), CallbackUrls::default());
        let session = gateway.create_session(&request(), "PAY-1").await.unwrap();
        let url = session.payment_url;

        assert!(url.starts_with("https://www.payfast.co.za/eng/process?merchant_id=10000100"));
        assert!(url.contains("&m_payment_id=PAY-1&amount=199.00"));
        assert!(url.contains("item_name=CIPC+Annual+Returns+Filing"));

        let (params, signature) = url
            .split_once('?')
            .unwrap()
            .1
            .rsplit_once("&signature=")
            .unwrap();
        assert_eq!(signature, sign(params, Some(PASSPHRASE)));
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let gateway = PayFastGateway::new(PayFastConfig::default(), CallbackUrls::default());
        let err = gateway.create_session(&request(), "PAY-1").await.unwrap_err();
        assert!(matches!(err, PaymentError::Configuration(_)));
    }

    #[test]
    fn test_complete_itn() {
        let decoder = PayFastWebhookDecoder::new(&config());
        let outcome = decoder
            .decode(&signed_itn("PAY-1", "COMPLETE", "199.00"), None)
            .unwrap();

        match outcome {
            WebhookOutcome::Completed(c) => {
                assert_eq!(c.reference, "PAY-1");
                assert_eq!(c.amount, 19900);
                assert_eq!(c.gateway_id, "1089250");
                assert_eq!(c.source, "payfast");
            }
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[test]
    fn test_failed_and_other_statuses() {
        let decoder = PayFastWebhookDecoder::new(&config());

        for status in ["FAILED", "CANCELLED"] {
            let outcome = decoder.decode(&signed_itn("PAY-1", status, "199.00"), None);
            assert!(matches!(outcome.unwrap(), WebhookOutcome::Failed(_)));
        }

        let outcome = decoder.decode(&signed_itn("PAY-1", "PENDING", "199.00"), None);
        assert!(outcome.unwrap().is_ignored());
    }

    #[test]
    fn test_rejections() {
        let payload = signed_itn("PAY-1", "COMPLETE", "199.00");

        let no_passphrase = PayFastWebhookDecoder::new(&PayFastConfig::new("10000100", "k"));
        assert!(matches!(
            no_passphrase.decode(&payload, None).unwrap_err(),
            PaymentError::SignatureVerification(_)
        ));

        let other_merchant = PayFastWebhookDecoder::new(
            &PayFastConfig::new("99999999", "k").with_passphrase(PASSPHRASE),
        );
        assert!(matches!(
            other_merchant.decode(&payload, None).unwrap_err(),
            PaymentError::SignatureVerification(_)
        ));

        let tampered = String::from_utf8(payload).unwrap().replace("199.00", "1.00");
        let decoder = PayFastWebhookDecoder::new(&config());
        assert!(matches!(
            decoder.decode(tampered.as_bytes(), None).unwrap_err(),
            PaymentError::SignatureVerification(_)
        ));
    }
}
