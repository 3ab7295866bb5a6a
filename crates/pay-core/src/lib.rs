//! # pay-core
//!
//! Core types and traits for the cipc-pay payment engine.
//!
//! This crate provides:
//! - `PaymentGateway` trait and `GatewayChain` for priority-ordered fallback
//! - `PaymentService`, the orchestrator that creates payments and applies
//!   webhook outcomes
//! - `WebhookDecoder` and the canonical `WebhookOutcome`/`PaymentCompletion`
//! - `PaymentStore` with an in-memory implementation
//! - `WorkflowEngine` and `Notifier` collaborator seams
//! - `PaymentError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use pay_core::{PaymentConfig, PaymentRequest, PaymentService, GatewayChain};
//!
//! let service = PaymentService::new(config, chain, store, notifier);
//! let response = service.create_payment(&PaymentRequest::new(19900, "ZAR")).await?;
//!
//! // Redirect the customer to response.payment_url
//! ```

pub mod config;
pub mod error;
pub mod fulfillment;
pub mod gateway;
pub mod money;
pub mod payment;
pub mod reference;
pub mod service;
pub mod store;
pub mod webhook;

// Re-exports for convenience
pub use config::PaymentConfig;
pub use error::{PaymentError, PaymentResult};
pub use fulfillment::{
    BoxedNotifier, BoxedWorkflowEngine, CustomerContact, LeadData, LoggingNotifier,
    LoggingWorkflowEngine, Notifier, WorkflowEngine,
};
pub use gateway::{BoxedPaymentGateway, Gateway, GatewayChain, GatewaySession, PaymentGateway};
pub use payment::{
    Customer, PaymentRecord, PaymentRequest, PaymentResponse, PaymentStatus, PaymentStatusView,
    Transition, AUTO_REFERENCE,
};
pub use service::{PaymentService, WebhookDisposition};
pub use store::{BoxedPaymentStore, InMemoryPaymentStore, PaymentStore};
pub use webhook::{
    decode_json, BoxedWebhookDecoder, PaymentCompletion, PaymentFailure, WebhookDecoder,
    WebhookOutcome, WebhookRegistry,
};
