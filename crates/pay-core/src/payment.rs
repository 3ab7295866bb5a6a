//! # Payment Types
//!
//! Inbound payment requests, the persisted payment record and the public
//! response returned to clients.

use crate::gateway::Gateway;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel reference asking the orchestrator to generate one
pub const AUTO_REFERENCE: &str = "AUTO";

/// Customer details attached to a payment request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default)]
    pub company_number: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub name: String,
}

/// A request to create a hosted payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Amount in minor units (19900 = R199.00)
    pub amount: i64,

    /// ISO 4217 code
    pub currency: String,

    /// `"AUTO"` or a caller-supplied reference
    #[serde(default = "default_reference")]
    pub reference: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub customer: Customer,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify_url: Option<String>,
}

fn default_reference() -> String {
    AUTO_REFERENCE.to_string()
}

impl PaymentRequest {
    /// Create a request with a generated reference
    pub fn new(amount: i64, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
            reference: default_reference(),
            description: String::new(),
            customer: Customer::default(),
            success_url: None,
            cancel_url: None,
            notify_url: None,
        }
    }

    /// Builder: set customer
    pub fn with_customer(mut self, customer: Customer) -> Self {
        self.customer = customer;
        self
    }

    /// Builder: set a caller-supplied reference
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = reference.into();
        self
    }

    /// Builder: set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Whether the reference should be generated
    pub fn wants_generated_reference(&self) -> bool {
        self.reference == AUTO_REFERENCE
    }
}

/// Lifecycle of a payment record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Hosted session created, customer redirected
    Initiated,
    /// Gateway acknowledged, awaiting outcome
    Pending,
    /// Gateway reported success
    Completed,
    /// Gateway reported failure
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Initiated => "initiated",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }

    /// Terminal states accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Completed | PaymentStatus::Failed)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of asking a record to move to a terminal state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Status changed
    Applied,
    /// Record was already terminal; nothing changed
    AlreadyTerminal,
}

/// A persisted payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: String,
    pub reference: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub description: String,
    pub status: PaymentStatus,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_name: String,
    pub company_number: String,

    /// Gateway that created the hosted session
    pub gateway: Gateway,

    /// Gateway-assigned identifier, when one is known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_reference: Option<String>,

    pub payment_url: String,
    pub created_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl PaymentRecord {
    /// Build an `initiated` record for a session served by `gateway`
    pub fn initiated(
        id: impl Into<String>,
        reference: impl Into<String>,
        request: &PaymentRequest,
        gateway: Gateway,
        payment_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            reference: reference.into(),
            amount: request.amount,
            currency: request.currency.clone(),
            description: request.description.clone(),
            status: PaymentStatus::Initiated,
            customer_email: request.customer.email.clone(),
            customer_phone: request.customer.phone.clone(),
            customer_name: request.customer.name.clone(),
            company_number: request.customer.company_number.clone(),
            gateway,
            gateway_reference: None,
            payment_url: payment_url.into(),
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Move to a terminal status.
    ///
    /// Only `initiated`/`pending` records change; a terminal record is left
    /// untouched and reports `AlreadyTerminal`.
    pub fn finish(
        &mut self,
        status: PaymentStatus,
        at: DateTime<Utc>,
        gateway_reference: Option<&str>,
    ) -> Transition {
        debug_assert!(status.is_terminal());

        if self.status.is_terminal() {
            return Transition::AlreadyTerminal;
        }

        self.status = status;
        if status == PaymentStatus::Completed {
            self.completed_at = Some(at);
        }
        if self.gateway_reference.is_none() {
            self.gateway_reference = gateway_reference
                .filter(|r| !r.is_empty())
                .map(String::from);
        }
        Transition::Applied
    }
}

/// Response returned from payment creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub payment_id: String,
    pub reference: String,
    pub payment_url: String,
    pub expires_at: DateTime<Utc>,
    pub status: PaymentStatus,
}

/// Public projection of a payment record for status lookups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentStatusView {
    pub payment_id: String,
    pub reference: String,
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub gateway: Gateway,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&PaymentRecord> for PaymentStatusView {
    fn from(record: &PaymentRecord) -> Self {
        Self {
            payment_id: record.id.clone(),
            reference: record.reference.clone(),
            amount: record.amount,
            currency: record.currency.clone(),
            status: record.status,
            gateway: record.gateway,
            created_at: record.created_at,
            completed_at: record.completed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> PaymentRecord {
        let request = PaymentRequest::new(19900, "ZAR").with_customer(Customer {
            company_number: "202212345".into(),
            email: "a@b.com".into(),
            ..Default::default()
        });
        PaymentRecord::initiated("pay_1", "PAY-1", &request, Gateway::Ozow, "https://pay.ozow.com/x")
    }

    #[test]
    fn test_request_defaults_to_auto_reference() {
        let request: PaymentRequest =
            serde_json::from_str(r#"{"amount": 19900, "currency": "ZAR"}"#).unwrap();
        assert!(request.wants_generated_reference());
        assert!(request.customer.email.is_empty());
    }

    #[test]
    fn test_completion_sets_completed_at() {
        let mut record = record();
        let now = Utc::now();

        assert_eq!(
            record.finish(PaymentStatus::Completed, now, Some("TXN-9")),
            Transition::Applied
        );
        assert_eq!(record.status, PaymentStatus::Completed);
        assert_eq!(record.completed_at, Some(now));
        assert_eq!(record.gateway_reference.as_deref(), Some("TXN-9"));
    }

    #[test]
    fn test_terminal_record_is_not_changed() {
        let mut record = record();
        record.finish(PaymentStatus::Completed, Utc::now(), None);
        let before = record.clone();

        assert_eq!(
            record.finish(PaymentStatus::Failed, Utc::now(), Some("other")),
            Transition::AlreadyTerminal
        );
        assert_eq!(record, before);
    }

    #[test]
    fn test_failure_leaves_completed_at_empty() {
        let mut record = record();
        record.finish(PaymentStatus::Failed, Utc::now(), None);
        assert_eq!(record.status, PaymentStatus::Failed);
        assert!(record.completed_at.is_none());
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Initiated).unwrap(),
            "\"initiated\""
        );
    }
}
