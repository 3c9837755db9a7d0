//! Shared test harness: in-process app on a random port, in-memory store,
//! mock mailer.

#![allow(dead_code)]

use billing_service::config::{BillingConfig, DatabaseConfig, OrgConfig, SmtpConfig};
use billing_service::models::ClientLedger;
use billing_service::services::{MemoryStore, MockEmailSender};
use billing_service::startup::{build_router, AppState};
use serde_json::json;
use std::sync::Arc;

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub mailer: Arc<MockEmailSender>,
    pub state: AppState,
}

pub fn test_config() -> BillingConfig {
    BillingConfig {
        common: service_core::config::Config {
            port: 0,
            log_level: "info".into(),
        },
        database: DatabaseConfig {
            url: None,
            max_connections: 5,
            min_connections: 1,
        },
        smtp: SmtpConfig {
            host: "localhost".into(),
            port: 587,
            user: String::new(),
            password: String::new(),
            from_email: "billing@test.local".into(),
            from_name: "Billing Test".into(),
            enabled: false,
        },
        org: OrgConfig {
            name: "Helvetia Umzug & Reinigung GmbH".into(),
            address: "Werkstrasse 12".into(),
            locality: "8004 Zürich".into(),
            email: "info@helvetia-umzug.ch".into(),
            slip_account: "CH93 0076 2011 6238 5295 7".into(),
            slip_reference: "RF18 5390 0754 7034".into(),
        },
    }
}

pub async fn spawn_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let mailer = Arc::new(MockEmailSender::new(true));
    let state = AppState::new(test_config(), store, mailer.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let address = format!("http://127.0.0.1:{}", listener.local_addr().unwrap().port());

    let router = build_router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp {
        address,
        client: reqwest::Client::new(),
        mailer,
        state,
    }
}

impl TestApp {
    /// Create a client ledger over HTTP and return the parsed row.
    pub async fn create_client(&self, total_price: &str, paid_amount: &str) -> ClientLedger {
        self.create_client_with(json!({
            "name": "Anna Muster",
            "email": "anna@example.ch",
            "address": "Seestrasse 3, 6004 Luzern",
            "service_type": "Umzug 3.5-Zimmer-Wohnung",
            "total_price": total_price,
            "paid_amount": paid_amount,
        }))
        .await
    }

    pub async fn create_client_with(&self, body: serde_json::Value) -> ClientLedger {
        let response = self
            .client
            .post(format!("{}/clients", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 201, "client creation failed");
        response.json().await.expect("Invalid client response")
    }

    pub async fn apply_payment(
        &self,
        client_id: uuid::Uuid,
        amount: &str,
        method: &str,
    ) -> reqwest::Response {
        self.client
            .post(format!("{}/clients/{}/payments", self.address, client_id))
            .json(&json!({ "amount": amount, "method": method }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get_client(&self, client_id: uuid::Uuid) -> ClientLedger {
        self.client
            .get(format!("{}/clients/{}", self.address, client_id))
            .send()
            .await
            .expect("Failed to execute request")
            .json()
            .await
            .expect("Invalid client response")
    }

    pub async fn set_status(&self, client_id: uuid::Uuid, status: &str) -> reqwest::Response {
        self.client
            .put(format!("{}/clients/{}/status", self.address, client_id))
            .json(&json!({ "status": status }))
            .send()
            .await
            .expect("Failed to execute request")
    }
}
