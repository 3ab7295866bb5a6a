//! # Payment Orchestrator
//!
//! Validates payment requests, walks the gateway chain until one gateway
//! opens a hosted session, and owns every status transition of the
//! resulting payment record.

use crate::config::PaymentConfig;
use crate::error::{PaymentError, PaymentResult};
use crate::fulfillment::{BoxedNotifier, CustomerContact};
use crate::gateway::{Gateway, GatewayChain, GatewaySession};
use crate::money::format_major;
use crate::payment::{
    PaymentRecord, PaymentRequest, PaymentResponse, PaymentStatus, Transition,
};
use crate::reference::{generate_payment_id, generate_reference};
use crate::store::BoxedPaymentStore;
use crate::webhook::WebhookOutcome;
use tracing::{error, info, instrument, warn};

/// What applying a webhook outcome did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookDisposition {
    /// Record moved to `completed` and the completion was emitted
    Completed,
    /// Record moved to `failed`
    Failed,
    /// Record was already terminal; nothing changed or emitted
    Duplicate(PaymentStatus),
    /// Outcome carried no business effect
    Ignored,
}

/// The payment orchestrator
pub struct PaymentService {
    config: PaymentConfig,
    gateways: GatewayChain,
    store: BoxedPaymentStore,
    notifier: BoxedNotifier,
}

impl PaymentService {
    pub fn new(
        config: PaymentConfig,
        gateways: GatewayChain,
        store: BoxedPaymentStore,
        notifier: BoxedNotifier,
    ) -> Self {
        Self {
            config,
            gateways,
            store,
            notifier,
        }
    }

    pub fn config(&self) -> &PaymentConfig {
        &self.config
    }

    pub fn gateways(&self) -> &GatewayChain {
        &self.gateways
    }

    /// Check amount bounds, currency and reference
    pub fn validate(&self, request: &PaymentRequest) -> PaymentResult<()> {
        if !self.config.accepts_amount(request.amount) {
            return Err(PaymentError::Validation(format!(
                "Amount must be between {} and {} {}",
                format_major(self.config.min_amount),
                format_major(self.config.max_amount),
                self.config.currency
            )));
        }

        if request.currency != self.config.currency {
            return Err(PaymentError::Validation(format!(
                "Only {} currency is supported",
                self.config.currency
            )));
        }

        if request.customer.email.trim().is_empty() {
            return Err(PaymentError::Validation(
                "Customer email is required".to_string(),
            ));
        }

        if request.reference.trim().is_empty() {
            return Err(PaymentError::Validation(
                "Reference must be \"AUTO\" or a non-empty value".to_string(),
            ));
        }

        Ok(())
    }

    /// Create a hosted payment, falling back across gateways in priority order
    #[instrument(skip(self, request), fields(amount = request.amount, company = %request.customer.company_number))]
    pub async fn create_payment(&self, request: &PaymentRequest) -> PaymentResult<PaymentResponse> {
        self.validate(request)?;

        let reference = self.resolve_reference(request).await?;

        let created = self.open_and_record(request, &reference).await;
        if created.is_err() {
            if let Err(e) = self.store.release(&reference).await {
                error!(reference = %reference, error = %e, "Failed to release payment reference");
            }
        }
        let (gateway, record) = created?;

        info!(
            payment_id = %record.id,
            "Payment created: {} via {}",
            record.reference, gateway
        );

        Ok(PaymentResponse {
            payment_id: record.id,
            reference: record.reference,
            payment_url: record.payment_url,
            expires_at: record.created_at + self.config.session_ttl(),
            status: PaymentStatus::Initiated,
        })
    }

    /// Pick the reference and claim it in the store
    async fn resolve_reference(&self, request: &PaymentRequest) -> PaymentResult<String> {
        let reference = if request.wants_generated_reference() {
            generate_reference(&self.config.reference_prefix, &request.customer.company_number)
        } else {
            request.reference.trim().to_string()
        };

        self.store.reserve(&reference).await?;
        Ok(reference)
    }

    async fn open_and_record(
        &self,
        request: &PaymentRequest,
        reference: &str,
    ) -> PaymentResult<(Gateway, PaymentRecord)> {
        let (gateway, session) = self.open_session(request, reference).await?;

        let mut record = PaymentRecord::initiated(
            generate_payment_id(),
            reference,
            request,
            gateway,
            session.payment_url,
        );
        record.gateway_reference = session.gateway_reference;

        self.store.insert(record.clone()).await?;
        Ok((gateway, record))
    }

    /// Try each gateway in turn; the first session wins.
    ///
    /// Attempts are sequential: every attempt may open a session on the
    /// gateway side, so racing them would create duplicates.
    async fn open_session(
        &self,
        request: &PaymentRequest,
        reference: &str,
    ) -> PaymentResult<(Gateway, GatewaySession)> {
        let timeout = self.config.gateway_timeout();

        for gateway in self.gateways.iter() {
            let name = gateway.gateway();

            match tokio::time::timeout(timeout, gateway.create_session(request, reference)).await {
                Ok(Ok(session)) if !session.payment_url.is_empty() => {
                    info!(gateway = %name, reference = %reference, "Gateway session created");
                    return Ok((name, session));
                }
                Ok(Ok(_)) => {
                    warn!(gateway = %name, "Gateway returned an empty payment URL, trying next");
                }
                Ok(Err(e)) => {
                    warn!(gateway = %name, error = %e, "Gateway attempt failed, trying next");
                }
                Err(_) => {
                    let e = PaymentError::GatewayTimeout {
                        provider: name.to_string(),
                        timeout_secs: self.config.gateway_timeout_secs,
                    };
                    warn!(gateway = %name, error = %e, "Gateway attempt failed, trying next");
                }
            }
        }

        error!(reference = %reference, "All payment gateways unavailable");
        Err(PaymentError::AllGatewaysExhausted)
    }

    /// Look up a payment by id, falling back to its reference
    pub async fn payment_status(&self, id_or_reference: &str) -> PaymentResult<PaymentRecord> {
        if let Some(record) = self.store.get_by_id(id_or_reference).await? {
            return Ok(record);
        }

        self.store
            .get_by_reference(id_or_reference)
            .await?
            .ok_or_else(|| PaymentError::PaymentNotFound {
                id: id_or_reference.to_string(),
            })
    }

    /// Apply a verified webhook outcome to its payment record.
    ///
    /// A completion is emitted to the notifier only when this call performed
    /// the `completed` transition, so redelivered webhooks emit nothing.
    #[instrument(skip(self, outcome), fields(reference = %outcome.reference()))]
    pub async fn apply_webhook(&self, outcome: WebhookOutcome) -> PaymentResult<WebhookDisposition> {
        match outcome {
            WebhookOutcome::Ignored { status, .. } => {
                info!(status = %status, "Webhook acknowledged without status change");
                Ok(WebhookDisposition::Ignored)
            }
            WebhookOutcome::Completed(completion) => {
                let (transition, record) = self
                    .store
                    .finish(
                        &completion.reference,
                        PaymentStatus::Completed,
                        completion.timestamp,
                        Some(&completion.gateway_id),
                    )
                    .await?;

                if transition == Transition::AlreadyTerminal {
                    info!(status = %record.status, "Duplicate terminal webhook ignored");
                    return Ok(WebhookDisposition::Duplicate(record.status));
                }

                if record.amount != completion.amount {
                    warn!(
                        expected = record.amount,
                        reported = completion.amount,
                        "Completed amount differs from payment record"
                    );
                }

                info!(
                    source = %completion.source,
                    "Payment completed: {}",
                    format_major(completion.amount)
                );

                let contact = CustomerContact::from(&record);
                if let Err(e) = self.notifier.notify(&contact, &completion).await {
                    // The gateway must still get its acknowledgement.
                    error!(error = %e, "Completion notification failed");
                }

                Ok(WebhookDisposition::Completed)
            }
            WebhookOutcome::Failed(failure) => {
                let (transition, record) = self
                    .store
                    .finish(
                        &failure.reference,
                        PaymentStatus::Failed,
                        failure.timestamp,
                        Some(&failure.gateway_id),
                    )
                    .await?;

                if transition == Transition::AlreadyTerminal {
                    info!(status = %record.status, "Duplicate terminal webhook ignored");
                    return Ok(WebhookDisposition::Duplicate(record.status));
                }

                warn!(
                    source = %failure.source,
                    gateway_status = %failure.gateway_status,
                    "Payment failed"
                );
                Ok(WebhookDisposition::Failed)
            }
        }
    }
}
