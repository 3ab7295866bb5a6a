//! # Payment Error Types
//!
//! Typed error handling for the cipc-pay engine.
//! All payment operations return `Result<T, PaymentError>`.

use thiserror::Error;

/// Core error type for all payment operations
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Bad client input (amount bounds, currency, missing fields)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors (missing merchant ids or keys)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A single gateway rejected the request
    #[error("Provider error [{provider}]: {message}")]
    ProviderError { provider: String, message: String },

    /// Network/HTTP error communicating with a gateway
    #[error("Network error: {0}")]
    NetworkError(String),

    /// A single gateway did not answer within its time budget
    #[error("Gateway {provider} timed out after {timeout_secs}s")]
    GatewayTimeout { provider: String, timeout_secs: u64 },

    /// Every configured gateway failed
    #[error("All payment gateways unavailable")]
    AllGatewaysExhausted,

    /// Webhook signature verification failed
    #[error("Webhook verification failed: {0}")]
    SignatureVerification(String),

    /// Payload could not be decoded
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Webhook references a payment we never created
    #[error("Unknown payment reference: {reference}")]
    UnknownReference { reference: String },

    /// Status lookup for an unknown payment
    #[error("Payment not found: {id}")]
    PaymentNotFound { id: String },

    /// Reference already used by another payment
    #[error("Reference already in use: {reference}")]
    DuplicateReference { reference: String },

    /// Workflow engine or notifier failure
    #[error("Collaborator error [{collaborator}]: {message}")]
    Collaborator {
        collaborator: String,
        message: String,
    },

    /// Payment store failure
    #[error("Store error: {0}")]
    Store(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PaymentError {
    /// Returns true if this error came from a single gateway attempt,
    /// so the orchestrator may move on to the next gateway.
    pub fn is_gateway_failure(&self) -> bool {
        matches!(
            self,
            PaymentError::Configuration(_)
                | PaymentError::ProviderError { .. }
                | PaymentError::NetworkError(_)
                | PaymentError::GatewayTimeout { .. }
                | PaymentError::Serialization(_)
        )
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            PaymentError::Validation(_) => 400,
            PaymentError::Configuration(_) => 500,
            PaymentError::ProviderError { .. } => 502,
            PaymentError::NetworkError(_) => 503,
            PaymentError::GatewayTimeout { .. } => 504,
            PaymentError::AllGatewaysExhausted => 503,
            PaymentError::SignatureVerification(_) => 400,
            PaymentError::MalformedPayload(_) => 400,
            PaymentError::UnknownReference { .. } => 404,
            PaymentError::PaymentNotFound { .. } => 404,
            PaymentError::DuplicateReference { .. } => 409,
            PaymentError::Collaborator { .. } => 500,
            PaymentError::Store(_) => 500,
            PaymentError::Serialization(_) => 500,
            PaymentError::Internal(_) => 500,
        }
    }

    /// Message safe to return to a client.
    ///
    /// Client errors carry their reason; server-side failures collapse to a
    /// generic message so gateway diagnostics never leave the service.
    pub fn public_message(&self) -> String {
        match self {
            PaymentError::Validation(_)
            | PaymentError::SignatureVerification(_)
            | PaymentError::MalformedPayload(_)
            | PaymentError::UnknownReference { .. }
            | PaymentError::PaymentNotFound { .. }
            | PaymentError::DuplicateReference { .. }
            | PaymentError::AllGatewaysExhausted => self.to_string(),
            PaymentError::ProviderError { .. }
            | PaymentError::NetworkError(_)
            | PaymentError::GatewayTimeout { .. } => "Payment gateway unavailable".to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

/// Result type alias for payment operations
pub type PaymentResult<T> = Result<T, PaymentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_failures() {
        assert!(PaymentError::NetworkError("timeout".into()).is_gateway_failure());
        assert!(PaymentError::GatewayTimeout {
            provider: "ozow".into(),
            timeout_secs: 10
        }
        .is_gateway_failure());
        assert!(PaymentError::Configuration("OZOW_SITE_CODE not set".into()).is_gateway_failure());
        assert!(!PaymentError::Validation("bad data".into()).is_gateway_failure());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(PaymentError::Validation("test".into()).status_code(), 400);
        assert_eq!(PaymentError::AllGatewaysExhausted.status_code(), 503);
        assert_eq!(
            PaymentError::SignatureVerification("bad".into()).status_code(),
            400
        );
        assert_eq!(
            PaymentError::DuplicateReference {
                reference: "PAY-1".into()
            }
            .status_code(),
            409
        );
    }

    #[test]
    fn test_public_message_hides_gateway_details() {
        let err = PaymentError::ProviderError {
            provider: "paystack".into(),
            message: "Invalid key sk_live_abc".into(),
        };
        assert!(!err.public_message().contains("sk_live_abc"));

        let err = PaymentError::Configuration("PAYFAST_MERCHANT_KEY not set".into());
        assert_eq!(err.public_message(), "Internal server error");

        let err = PaymentError::Validation("Only ZAR currency is supported".into());
        assert!(err.public_message().contains("Only ZAR"));
    }
}
