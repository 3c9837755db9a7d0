//! Ledger storage seam.
//!
//! Services receive a `LedgerStore` explicitly; there is no ambient global
//! store. Two implementations exist: `Database` (Postgres) and `MemoryStore`
//! (tests and database-less development).

use crate::models::{ClientLedger, NewClient, NewPayment, PaymentRecord, PaymentStatus};
use async_trait::async_trait;
use rust_decimal::Decimal;
use service_core::error::AppError;
use uuid::Uuid;

/// Outcome of an attempted payment commit.
#[derive(Debug)]
pub enum PaymentCommit {
    /// Everything written atomically; the record and the updated ledger.
    Committed {
        record: PaymentRecord,
        ledger: ClientLedger,
    },
    /// `paid_amount` no longer matched the expected value: a concurrent
    /// payment won the race. Nothing was written; the caller re-reads and
    /// retries.
    Stale,
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Insert a new client ledger. `status` is pre-classified by the caller;
    /// the store derives `balance = total_price - paid_amount`.
    async fn insert_client(
        &self,
        input: &NewClient,
        status: PaymentStatus,
    ) -> Result<ClientLedger, AppError>;

    async fn get_client(&self, client_id: Uuid) -> Result<Option<ClientLedger>, AppError>;

    /// All ledgers, newest first.
    async fn list_clients(&self) -> Result<Vec<ClientLedger>, AppError>;

    /// Delete a client and, by cascade, all its payment records.
    async fn delete_client(&self, client_id: Uuid) -> Result<bool, AppError>;

    /// Overwrite the persisted status. Used for manual overrides and the
    /// explicit recompute path, never by payment application directly.
    async fn set_status(
        &self,
        client_id: Uuid,
        status: PaymentStatus,
    ) -> Result<Option<ClientLedger>, AppError>;

    /// Atomically insert the payment record and advance the ledger, but only
    /// if the row still matches `expected_paid` and `expected_status`
    /// (compare-and-swap). Guarding the status catches an operator override
    /// landing between the caller's read and this commit, which would
    /// otherwise pass on `paid_amount` alone and be overwritten.
    /// Fails with NotFound if the client vanished.
    async fn commit_payment(
        &self,
        input: &NewPayment,
        expected_paid: Decimal,
        expected_status: &str,
        new_paid: Decimal,
        new_balance: Decimal,
        new_status: PaymentStatus,
    ) -> Result<PaymentCommit, AppError>;

    /// Payment history for a client, newest first.
    async fn list_payments(&self, client_id: Uuid) -> Result<Vec<PaymentRecord>, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}
