//! Client ledger lifecycle operations.

use crate::models::{ClientLedger, NewClient, PaymentRecord, PaymentStatus};
use crate::services::status::classify;
use crate::services::store::LedgerStore;
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// CRUD and status transitions for client ledgers.
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
}

impl LedgerService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Create a new ledger. Initial status comes from the classifier so an
    /// advance payment is reflected immediately.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_client(&self, input: NewClient) -> Result<ClientLedger, AppError> {
        if input.total_price < Decimal::ZERO {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Total price must not be negative"
            )));
        }
        if input.paid_amount < Decimal::ZERO {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Paid amount must not be negative"
            )));
        }

        let status = classify(input.total_price, input.paid_amount);
        let ledger = self.store.insert_client(&input, status).await?;

        info!(client_id = %ledger.client_id, status = %ledger.status, "Client created");

        Ok(ledger)
    }

    pub async fn get_client(&self, client_id: Uuid) -> Result<ClientLedger, AppError> {
        self.store
            .get_client(client_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Client {} not found", client_id)))
    }

    pub async fn list_clients(&self) -> Result<Vec<ClientLedger>, AppError> {
        self.store.list_clients().await
    }

    #[instrument(skip(self), fields(client_id = %client_id))]
    pub async fn delete_client(&self, client_id: Uuid) -> Result<(), AppError> {
        let deleted = self.store.delete_client(client_id).await?;
        if !deleted {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Client {} not found",
                client_id
            )));
        }
        info!(client_id = %client_id, "Client deleted with payment history");
        Ok(())
    }

    /// Change a ledger's status explicitly.
    ///
    /// `Completed`/`Cancelled` are persisted as manual overrides and freeze
    /// the status across subsequent payments. Requesting any automatic-band
    /// value instead re-derives it from the amounts; the cached status is
    /// recomputed, not trusted.
    #[instrument(skip(self), fields(client_id = %client_id))]
    pub async fn set_status(
        &self,
        client_id: Uuid,
        requested: PaymentStatus,
    ) -> Result<ClientLedger, AppError> {
        let ledger = self.get_client(client_id).await?;

        let status = if requested.is_manual_override() {
            requested
        } else {
            classify(ledger.total_price, ledger.paid_amount)
        };

        let updated = self
            .store
            .set_status(client_id, status)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Client {} not found", client_id)))?;

        info!(client_id = %client_id, status = %updated.status, "Status changed");

        Ok(updated)
    }

    pub async fn list_payments(&self, client_id: Uuid) -> Result<Vec<PaymentRecord>, AppError> {
        // NotFound beats an empty history for an unknown id.
        self.get_client(client_id).await?;
        self.store.list_payments(client_id).await
    }
}
