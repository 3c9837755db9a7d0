//! Payment application.

use crate::models::{ClientLedger, NewPayment, PaymentRecord};
use crate::services::metrics::{PAYMENTS_TOTAL, PAYMENT_AMOUNT_TOTAL, PAYMENT_CONFLICTS_TOTAL};
use crate::services::status::classify;
use crate::services::store::{LedgerStore, PaymentCommit};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Commit attempts per payment before giving up with Busy.
const MAX_COMMIT_ATTEMPTS: u32 = 5;

/// Applies payments to client ledgers.
///
/// Each payment is an atomic read-modify-write: the record is inserted and
/// `paid_amount`/`balance`/`status` advance together or not at all. Lost
/// updates under concurrent admin sessions, including a status override
/// racing the payment, are prevented by an optimistic compare-and-swap on
/// `paid_amount` and `status` with bounded retry.
#[derive(Clone)]
pub struct PaymentService {
    store: Arc<dyn LedgerStore>,
}

impl PaymentService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, input), fields(client_id = %input.client_id, amount = %input.amount))]
    pub async fn apply_payment(
        &self,
        input: NewPayment,
    ) -> Result<(PaymentRecord, ClientLedger), AppError> {
        if input.amount <= Decimal::ZERO {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Payment amount must be positive"
            )));
        }

        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let ledger = self
                .store
                .get_client(input.client_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(anyhow::anyhow!("Client {} not found", input.client_id))
                })?;

            let new_paid = ledger.paid_amount + input.amount;
            let new_balance = ledger.total_price - new_paid;
            // A manual completed/cancelled override stays frozen; otherwise
            // the classifier is the single source of the new status.
            let new_status = match ledger.parsed_status() {
                Some(current) if current.is_manual_override() => current,
                _ => classify(ledger.total_price, new_paid),
            };

            match self
                .store
                .commit_payment(
                    &input,
                    ledger.paid_amount,
                    &ledger.status,
                    new_paid,
                    new_balance,
                    new_status,
                )
                .await?
            {
                PaymentCommit::Committed { record, ledger } => {
                    PAYMENTS_TOTAL
                        .with_label_values(&[input.method.as_str()])
                        .inc();
                    PAYMENT_AMOUNT_TOTAL
                        .with_label_values(&[input.method.as_str()])
                        .inc_by(input.amount.to_f64().unwrap_or(0.0));

                    info!(
                        payment_id = %record.payment_id,
                        paid_amount = %ledger.paid_amount,
                        balance = %ledger.balance,
                        status = %ledger.status,
                        "Payment applied"
                    );

                    return Ok((record, ledger));
                }
                PaymentCommit::Stale => {
                    PAYMENT_CONFLICTS_TOTAL.inc();
                    debug!(attempt, "Concurrent ledger update, retrying");
                }
            }
        }

        warn!(
            client_id = %input.client_id,
            "Payment commit contention exhausted {} attempts",
            MAX_COMMIT_ATTEMPTS
        );

        Err(AppError::Busy(anyhow::anyhow!(
            "Ledger for client {} is under contention, try again",
            input.client_id
        )))
    }
}
