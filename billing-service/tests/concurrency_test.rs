//! Concurrent payment application against a shared store.

mod common;

use async_trait::async_trait;
use billing_service::models::{
    ClientLedger, NewClient, NewPayment, PaymentMethod, PaymentRecord, PaymentStatus,
};
use billing_service::services::{
    classify, LedgerStore, MemoryStore, PaymentCommit, PaymentService,
};
use chrono::Utc;
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::sync::Arc;
use uuid::Uuid;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

async fn seed_client(store: &Arc<MemoryStore>, total: &str) -> Uuid {
    let input = NewClient {
        name: "Concurrent AG".into(),
        email: None,
        address: None,
        service_type: "Umzug".into(),
        service_date: None,
        total_price: dec(total),
        paid_amount: Decimal::ZERO,
        notes: None,
    };
    let status = classify(input.total_price, input.paid_amount);
    let ledger = store.insert_client(&input, status).await.unwrap();
    ledger.client_id
}

fn payment(client_id: Uuid, amount: &str, method: PaymentMethod) -> NewPayment {
    NewPayment {
        client_id,
        amount: dec(amount),
        method,
        notes: None,
    }
}

#[tokio::test]
async fn two_simultaneous_payments_both_land() {
    let store = Arc::new(MemoryStore::new());
    let service = PaymentService::new(store.clone());
    let client_id = seed_client(&store, "1000").await;

    let a = {
        let service = service.clone();
        tokio::spawn(async move {
            service
                .apply_payment(payment(client_id, "100", PaymentMethod::Transfer))
                .await
        })
    };
    let b = {
        let service = service.clone();
        tokio::spawn(async move {
            service
                .apply_payment(payment(client_id, "100", PaymentMethod::Cash))
                .await
        })
    };

    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    let ledger = store.get_client(client_id).await.unwrap().unwrap();
    assert_eq!(ledger.paid_amount, dec("200"));
    assert_eq!(ledger.balance, dec("800"));
    assert_eq!(ledger.status, "partial");

    let history = store.list_payments(client_id).await.unwrap();
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn many_contending_payments_converge() {
    let store = Arc::new(MemoryStore::new());
    let service = PaymentService::new(store.clone());
    let client_id = seed_client(&store, "500").await;

    let mut handles = Vec::new();
    for _ in 0..5 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .apply_payment(payment(client_id, "100", PaymentMethod::Card))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let ledger = store.get_client(client_id).await.unwrap().unwrap();
    assert_eq!(ledger.paid_amount, dec("500"));
    assert_eq!(ledger.balance, dec("0"));
    assert_eq!(ledger.status, "paid");

    let history = store.list_payments(client_id).await.unwrap();
    assert_eq!(history.len(), 5);
}

#[tokio::test]
async fn override_set_mid_payment_is_not_overwritten() {
    let store = Arc::new(MemoryStore::new());
    let client_id = seed_client(&store, "900").await;

    // A payment in flight has read the ledger...
    let ledger = store.get_client(client_id).await.unwrap().unwrap();

    // ...when an operator cancels the client before the commit lands.
    store
        .set_status(client_id, PaymentStatus::Cancelled)
        .await
        .unwrap();

    // paid_amount is unchanged, so only the status guard can reject this.
    let outcome = store
        .commit_payment(
            &payment(client_id, "100", PaymentMethod::Transfer),
            ledger.paid_amount,
            &ledger.status,
            dec("100"),
            dec("800"),
            classify(dec("900"), dec("100")),
        )
        .await
        .unwrap();
    assert!(matches!(outcome, PaymentCommit::Stale));

    // The full service path retries, re-reads the override and freezes it.
    let service = PaymentService::new(store.clone());
    service
        .apply_payment(payment(client_id, "100", PaymentMethod::Transfer))
        .await
        .unwrap();

    let ledger = store.get_client(client_id).await.unwrap().unwrap();
    assert_eq!(ledger.status, "cancelled");
    assert_eq!(ledger.paid_amount, dec("100"));
}

/// Store whose commits always lose the race.
struct ContendedStore {
    ledger: ClientLedger,
}

#[async_trait]
impl LedgerStore for ContendedStore {
    async fn insert_client(
        &self,
        _input: &NewClient,
        _status: PaymentStatus,
    ) -> Result<ClientLedger, AppError> {
        unimplemented!("not exercised")
    }

    async fn get_client(&self, _client_id: Uuid) -> Result<Option<ClientLedger>, AppError> {
        Ok(Some(self.ledger.clone()))
    }

    async fn list_clients(&self) -> Result<Vec<ClientLedger>, AppError> {
        Ok(vec![self.ledger.clone()])
    }

    async fn delete_client(&self, _client_id: Uuid) -> Result<bool, AppError> {
        Ok(false)
    }

    async fn set_status(
        &self,
        _client_id: Uuid,
        _status: PaymentStatus,
    ) -> Result<Option<ClientLedger>, AppError> {
        Ok(None)
    }

    async fn commit_payment(
        &self,
        _input: &NewPayment,
        _expected_paid: Decimal,
        _expected_status: &str,
        _new_paid: Decimal,
        _new_balance: Decimal,
        _new_status: PaymentStatus,
    ) -> Result<PaymentCommit, AppError> {
        Ok(PaymentCommit::Stale)
    }

    async fn list_payments(&self, _client_id: Uuid) -> Result<Vec<PaymentRecord>, AppError> {
        Ok(Vec::new())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[tokio::test]
async fn exhausted_commit_attempts_surface_as_busy() {
    let client_id = Uuid::new_v4();
    let store = Arc::new(ContendedStore {
        ledger: ClientLedger {
            client_id,
            name: "Concurrent AG".into(),
            email: None,
            address: None,
            service_type: "Umzug".into(),
            service_date: None,
            total_price: dec("900"),
            paid_amount: Decimal::ZERO,
            balance: dec("900"),
            status: "unpaid".into(),
            notes: None,
            created_utc: Utc::now(),
        },
    });
    let service = PaymentService::new(store);

    let err = service
        .apply_payment(payment(client_id, "100", PaymentMethod::Cash))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Busy(_)), "got {err:?}");
}
