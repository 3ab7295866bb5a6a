//! # Fulfillment Collaborators
//!
//! Interfaces to the systems that act on a paid filing: the workflow engine
//! that runs the annual-return filing and the notifier that tells the
//! customer. Default implementations only log.

use crate::error::PaymentResult;
use crate::payment::PaymentRecord;
use crate::webhook::PaymentCompletion;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Company lead captured by the onboarding flow
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadData {
    pub company_number: String,
    pub company_name: String,
    pub financial_year_end: String,
    pub email: String,
    pub phone: String,
    pub contact_name: String,
    pub address: String,
    pub business_activity: String,
    pub director_name: String,
    pub director_id: String,
}

impl LeadData {
    /// Names of required fields that are blank
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.company_number.trim().is_empty() {
            missing.push("company_number");
        }
        if self.email.trim().is_empty() {
            missing.push("email");
        }
        missing
    }
}

/// Who to tell about a payment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerContact {
    pub email: String,
    pub phone: String,
    pub name: String,
    pub company_number: String,
}

impl From<&PaymentRecord> for CustomerContact {
    fn from(record: &PaymentRecord) -> Self {
        Self {
            email: record.customer_email.clone(),
            phone: record.customer_phone.clone(),
            name: record.customer_name.clone(),
            company_number: record.company_number.clone(),
        }
    }
}

/// Starts filing workflows
#[async_trait]
pub trait WorkflowEngine: Send + Sync {
    /// Hand off a validated lead and return the workflow id
    async fn start_filing_workflow(
        &self,
        lead: &LeadData,
        payment_reference: &str,
    ) -> PaymentResult<String>;
}

/// Sends customer notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Called once per applied payment completion
    async fn notify(
        &self,
        contact: &CustomerContact,
        completion: &PaymentCompletion,
    ) -> PaymentResult<()>;
}

pub type BoxedWorkflowEngine = Arc<dyn WorkflowEngine>;
pub type BoxedNotifier = Arc<dyn Notifier>;

/// Workflow engine that assigns an id and logs the hand-off
pub struct LoggingWorkflowEngine;

#[async_trait]
impl WorkflowEngine for LoggingWorkflowEngine {
    async fn start_filing_workflow(
        &self,
        lead: &LeadData,
        payment_reference: &str,
    ) -> PaymentResult<String> {
        let workflow_id = format!("wf_{}", Uuid::new_v4().simple());
        info!(
            workflow_id = %workflow_id,
            company_number = %lead.company_number,
            payment_reference = %payment_reference,
            "New onboarding request: {}",
            lead.company_name
        );
        Ok(workflow_id)
    }
}

/// Notifier that only logs
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn notify(
        &self,
        contact: &CustomerContact,
        completion: &PaymentCompletion,
    ) -> PaymentResult<()> {
        info!(
            reference = %completion.reference,
            email = %contact.email,
            "Payment completed: {} via {}",
            crate::money::format_major(completion.amount),
            completion.source
        );
        Ok(())
    }
}
