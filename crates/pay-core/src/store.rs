//! # Payment Store
//!
//! Persistence seam for payment records. The in-memory implementation backs
//! the service today; a database-backed store plugs in behind the same trait.

use crate::error::{PaymentError, PaymentResult};
use crate::payment::{PaymentRecord, PaymentStatus, Transition};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Storage for payment records, keyed by reference.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Claim a reference before any gateway is contacted.
    ///
    /// Fails with `DuplicateReference` if the reference is stored or already
    /// claimed. A successful `insert` consumes the claim.
    async fn reserve(&self, reference: &str) -> PaymentResult<()>;

    /// Drop a claim that never became a record
    async fn release(&self, reference: &str) -> PaymentResult<()>;

    /// Insert a new record; fails with `DuplicateReference` if the reference exists
    async fn insert(&self, record: PaymentRecord) -> PaymentResult<()>;

    /// Insert or replace a record by reference
    async fn upsert(&self, record: PaymentRecord) -> PaymentResult<()>;

    async fn get_by_reference(&self, reference: &str) -> PaymentResult<Option<PaymentRecord>>;

    async fn get_by_id(&self, id: &str) -> PaymentResult<Option<PaymentRecord>>;

    /// Atomically move the record to a terminal `status`.
    ///
    /// The check and the write happen under one lock per reference, so two
    /// concurrent deliveries produce exactly one `Transition::Applied`.
    /// Unknown references fail with `UnknownReference`.
    async fn finish(
        &self,
        reference: &str,
        status: PaymentStatus,
        at: DateTime<Utc>,
        gateway_reference: Option<&str>,
    ) -> PaymentResult<(Transition, PaymentRecord)>;
}

/// Type alias for a shared store
pub type BoxedPaymentStore = Arc<dyn PaymentStore>;

#[derive(Default)]
struct Records {
    by_reference: HashMap<String, PaymentRecord>,
    reference_by_id: HashMap<String, String>,
    reserved: HashSet<String>,
}

impl Records {
    fn put(&mut self, record: PaymentRecord) {
        self.reserved.remove(&record.reference);
        self.reference_by_id
            .insert(record.id.clone(), record.reference.clone());
        self.by_reference.insert(record.reference.clone(), record);
    }
}

/// Process-local store
#[derive(Clone, Default)]
pub struct InMemoryPaymentStore {
    records: Arc<RwLock<Records>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.by_reference.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn reserve(&self, reference: &str) -> PaymentResult<()> {
        let mut records = self.records.write().await;
        if records.by_reference.contains_key(reference)
            || !records.reserved.insert(reference.to_string())
        {
            return Err(PaymentError::DuplicateReference {
                reference: reference.to_string(),
            });
        }
        Ok(())
    }

    async fn release(&self, reference: &str) -> PaymentResult<()> {
        self.records.write().await.reserved.remove(reference);
        Ok(())
    }

    async fn insert(&self, record: PaymentRecord) -> PaymentResult<()> {
        let mut records = self.records.write().await;
        if records.by_reference.contains_key(&record.reference) {
            return Err(PaymentError::DuplicateReference {
                reference: record.reference,
            });
        }
        records.put(record);
        Ok(())
    }

    async fn upsert(&self, record: PaymentRecord) -> PaymentResult<()> {
        self.records.write().await.put(record);
        Ok(())
    }

    async fn get_by_reference(&self, reference: &str) -> PaymentResult<Option<PaymentRecord>> {
        Ok(self.records.read().await.by_reference.get(reference).cloned())
    }

    async fn get_by_id(&self, id: &str) -> PaymentResult<Option<PaymentRecord>> {
        let records = self.records.read().await;
        Ok(records
            .reference_by_id
            .get(id)
            .and_then(|reference| records.by_reference.get(reference))
            .cloned())
    }

    async fn finish(
        &self,
        reference: &str,
        status: PaymentStatus,
        at: DateTime<Utc>,
        gateway_reference: Option<&str>,
    ) -> PaymentResult<(Transition, PaymentRecord)> {
        let mut records = self.records.write().await;
        let record = records
            .by_reference
            .get_mut(reference)
            .ok_or_else(|| PaymentError::UnknownReference {
                reference: reference.to_string(),
            })?;

        let transition = record.finish(status, at, gateway_reference);
        Ok((transition, record.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::Gateway;
    use crate::payment::{Customer, PaymentRequest};

    fn record(id: &str, reference: &str) -> PaymentRecord {
        let request = PaymentRequest::new(19900, "ZAR").with_customer(Customer {
            email: "a@b.com".into(),
            ..Default::default()
        });
        PaymentRecord::initiated(id, reference, &request, Gateway::Ozow, "https://pay.ozow.com/x")
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let store = InMemoryPaymentStore::new();
        store.insert(record("pay_1", "PAY-1")).await.unwrap();

        assert_eq!(store.get_by_id("pay_1").await.unwrap().unwrap().reference, "PAY-1");
        assert_eq!(store.get_by_reference("PAY-1").await.unwrap().unwrap().id, "pay_1");
        assert!(store.get_by_id("pay_2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_reference() {
        let store = InMemoryPaymentStore::new();
        store.insert(record("pay_1", "PAY-1")).await.unwrap();

        let err = store.insert(record("pay_2", "PAY-1")).await.unwrap_err();
        assert!(matches!(err, PaymentError::DuplicateReference { .. }));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_reserve_claims_reference() {
        let store = InMemoryPaymentStore::new();
        store.reserve("INV-42").await.unwrap();

        let err = store.reserve("INV-42").await.unwrap_err();
        assert!(matches!(err, PaymentError::DuplicateReference { .. }));
        assert!(store.get_by_reference("INV-42").await.unwrap().is_none());

        store.release("INV-42").await.unwrap();
        store.reserve("INV-42").await.unwrap();

        store.insert(record("pay_1", "INV-42")).await.unwrap();
        assert!(matches!(
            store.reserve("INV-42").await.unwrap_err(),
            PaymentError::DuplicateReference { .. }
        ));

        store.release("INV-42").await.unwrap();
        assert_eq!(store.get_by_reference("INV-42").await.unwrap().unwrap().id, "pay_1");
    }

    #[tokio::test]
    async fn test_upsert_replaces() {
        let store = InMemoryPaymentStore::new();
        store.upsert(record("pay_1", "PAY-1")).await.unwrap();

        let mut updated = record("pay_1", "PAY-1");
        updated.amount = 25000;
        store.upsert(updated).await.unwrap();

        assert_eq!(store.get_by_reference("PAY-1").await.unwrap().unwrap().amount, 25000);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_finish_unknown_reference() {
        let store = InMemoryPaymentStore::new();
        let err = store
            .finish("PAY-404", PaymentStatus::Completed, Utc::now(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::UnknownReference { .. }));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_concurrent_finish_applies_once() {
        let store = InMemoryPaymentStore::new();
        store.insert(record("pay_1", "PAY-1")).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            let status = if i % 2 == 0 {
                PaymentStatus::Completed
            } else {
                PaymentStatus::Failed
            };
            handles.push(tokio::spawn(async move {
                store.finish("PAY-1", status, Utc::now(), None).await.unwrap().0
            }));
        }

        let mut applied = 0;
        for handle in handles {
            if handle.await.unwrap() == Transition::Applied {
                applied += 1;
            }
        }

        assert_eq!(applied, 1);
        let status = store.get_by_reference("PAY-1").await.unwrap().unwrap().status;
        assert!(status.is_terminal());
    }
}
