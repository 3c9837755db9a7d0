//! In-memory ledger store.
//!
//! Used by the integration tests and as the automatic fallback when no
//! `DATABASE_URL` is configured in development, the same way the disabled
//! SMTP provider falls back to the mock sender.

use crate::models::{ClientLedger, NewClient, NewPayment, PaymentRecord, PaymentStatus};
use crate::services::store::{LedgerStore, PaymentCommit};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    clients: HashMap<Uuid, ClientLedger>,
    payments: HashMap<Uuid, Vec<PaymentRecord>>,
}

/// Process-local store. The single mutex serializes commits, which gives the
/// same per-client atomicity the Postgres transaction provides.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, AppError> {
        self.inner
            .lock()
            .map_err(|_| AppError::InternalError(anyhow::anyhow!("Ledger store lock poisoned")))
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn insert_client(
        &self,
        input: &NewClient,
        status: PaymentStatus,
    ) -> Result<ClientLedger, AppError> {
        let ledger = ClientLedger {
            client_id: Uuid::new_v4(),
            name: input.name.clone(),
            email: input.email.clone(),
            address: input.address.clone(),
            service_type: input.service_type.clone(),
            service_date: input.service_date,
            total_price: input.total_price,
            paid_amount: input.paid_amount,
            balance: input.total_price - input.paid_amount,
            status: status.as_str().to_string(),
            notes: input.notes.clone(),
            created_utc: Utc::now(),
        };

        let mut inner = self.lock()?;
        inner.payments.insert(ledger.client_id, Vec::new());
        inner.clients.insert(ledger.client_id, ledger.clone());
        Ok(ledger)
    }

    async fn get_client(&self, client_id: Uuid) -> Result<Option<ClientLedger>, AppError> {
        Ok(self.lock()?.clients.get(&client_id).cloned())
    }

    async fn list_clients(&self) -> Result<Vec<ClientLedger>, AppError> {
        let mut clients: Vec<ClientLedger> = self.lock()?.clients.values().cloned().collect();
        clients.sort_by(|a, b| b.created_utc.cmp(&a.created_utc));
        Ok(clients)
    }

    async fn delete_client(&self, client_id: Uuid) -> Result<bool, AppError> {
        let mut inner = self.lock()?;
        inner.payments.remove(&client_id);
        Ok(inner.clients.remove(&client_id).is_some())
    }

    async fn set_status(
        &self,
        client_id: Uuid,
        status: PaymentStatus,
    ) -> Result<Option<ClientLedger>, AppError> {
        let mut inner = self.lock()?;
        Ok(inner.clients.get_mut(&client_id).map(|ledger| {
            ledger.status = status.as_str().to_string();
            ledger.clone()
        }))
    }

    async fn commit_payment(
        &self,
        input: &NewPayment,
        expected_paid: Decimal,
        expected_status: &str,
        new_paid: Decimal,
        new_balance: Decimal,
        new_status: PaymentStatus,
    ) -> Result<PaymentCommit, AppError> {
        let mut inner = self.lock()?;

        let ledger = match inner.clients.get_mut(&input.client_id) {
            Some(ledger) => ledger,
            None => {
                return Err(AppError::NotFound(anyhow::anyhow!(
                    "Client {} not found",
                    input.client_id
                )))
            }
        };

        if ledger.paid_amount != expected_paid || ledger.status != expected_status {
            return Ok(PaymentCommit::Stale);
        }

        ledger.paid_amount = new_paid;
        ledger.balance = new_balance;
        ledger.status = new_status.as_str().to_string();
        let updated = ledger.clone();

        let record = PaymentRecord {
            payment_id: Uuid::new_v4(),
            client_id: input.client_id,
            amount: input.amount,
            method: input.method.as_str().to_string(),
            notes: input.notes.clone(),
            created_utc: Utc::now(),
        };
        inner
            .payments
            .entry(input.client_id)
            .or_default()
            .push(record.clone());

        Ok(PaymentCommit::Committed {
            record,
            ledger: updated,
        })
    }

    async fn list_payments(&self, client_id: Uuid) -> Result<Vec<PaymentRecord>, AppError> {
        let mut payments = self
            .lock()?
            .payments
            .get(&client_id)
            .cloned()
            .unwrap_or_default();
        payments.sort_by(|a, b| {
            b.created_utc
                .cmp(&a.created_utc)
                .then(b.payment_id.cmp(&a.payment_id))
        });
        Ok(payments)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}
