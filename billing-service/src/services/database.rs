//! Postgres ledger store.

use crate::models::{ClientLedger, NewClient, NewPayment, PaymentRecord, PaymentStatus};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::store::{LedgerStore, PaymentCommit};
use async_trait::async_trait;
use rust_decimal::Decimal;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

const CLIENT_COLUMNS: &str = "client_id, name, email, address, service_type, service_date, \
     total_price, paid_amount, balance, status, notes, created_utc";

const PAYMENT_COLUMNS: &str = "payment_id, client_id, amount, method, notes, created_utc";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "billing-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for Database {
    #[instrument(skip(self, input), fields(name = %input.name))]
    async fn insert_client(
        &self,
        input: &NewClient,
        status: PaymentStatus,
    ) -> Result<ClientLedger, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_client"])
            .start_timer();

        let client_id = Uuid::new_v4();
        let balance = input.total_price - input.paid_amount;
        let ledger = sqlx::query_as::<_, ClientLedger>(&format!(
            r#"
            INSERT INTO clients (client_id, name, email, address, service_type, service_date,
                total_price, paid_amount, balance, status, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {CLIENT_COLUMNS}
            "#
        ))
        .bind(client_id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.address)
        .bind(&input.service_type)
        .bind(input.service_date)
        .bind(input.total_price)
        .bind(input.paid_amount)
        .bind(balance)
        .bind(status.as_str())
        .bind(&input.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to insert client: {}", e)))?;

        timer.observe_duration();

        info!(
            client_id = %ledger.client_id,
            status = %ledger.status,
            "Client ledger created"
        );

        Ok(ledger)
    }

    #[instrument(skip(self), fields(client_id = %client_id))]
    async fn get_client(&self, client_id: Uuid) -> Result<Option<ClientLedger>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_client"])
            .start_timer();

        let ledger = sqlx::query_as::<_, ClientLedger>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE client_id = $1"
        ))
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get client: {}", e)))?;

        timer.observe_duration();

        Ok(ledger)
    }

    #[instrument(skip(self))]
    async fn list_clients(&self) -> Result<Vec<ClientLedger>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_clients"])
            .start_timer();

        let clients = sqlx::query_as::<_, ClientLedger>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients ORDER BY created_utc DESC, client_id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list clients: {}", e)))?;

        timer.observe_duration();

        Ok(clients)
    }

    #[instrument(skip(self), fields(client_id = %client_id))]
    async fn delete_client(&self, client_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_client"])
            .start_timer();

        // Payment records go with the client via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM clients WHERE client_id = $1")
            .bind(client_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete client: {}", e))
            })?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(client_id = %client_id, status = %status))]
    async fn set_status(
        &self,
        client_id: Uuid,
        status: PaymentStatus,
    ) -> Result<Option<ClientLedger>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["set_status"])
            .start_timer();

        let ledger = sqlx::query_as::<_, ClientLedger>(&format!(
            "UPDATE clients SET status = $2 WHERE client_id = $1 RETURNING {CLIENT_COLUMNS}"
        ))
        .bind(client_id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to set status: {}", e)))?;

        timer.observe_duration();

        Ok(ledger)
    }

    #[instrument(skip(self, input), fields(client_id = %input.client_id, amount = %input.amount))]
    async fn commit_payment(
        &self,
        input: &NewPayment,
        expected_paid: Decimal,
        expected_status: &str,
        new_paid: Decimal,
        new_balance: Decimal,
        new_status: PaymentStatus,
    ) -> Result<PaymentCommit, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["commit_payment"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        // Compare-and-swap on paid_amount and status: zero rows means a
        // concurrent payment or a status override landed first (or the
        // client is gone).
        let updated = sqlx::query_as::<_, ClientLedger>(&format!(
            r#"
            UPDATE clients
            SET paid_amount = $4, balance = $5, status = $6
            WHERE client_id = $1 AND paid_amount = $2 AND status = $3
            RETURNING {CLIENT_COLUMNS}
            "#
        ))
        .bind(input.client_id)
        .bind(expected_paid)
        .bind(expected_status)
        .bind(new_paid)
        .bind(new_balance)
        .bind(new_status.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update ledger: {}", e)))?;

        let ledger = match updated {
            Some(ledger) => ledger,
            None => {
                tx.rollback().await.ok();
                timer.observe_duration();

                let exists = sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM clients WHERE client_id = $1",
                )
                .bind(input.client_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to check client: {}", e))
                })?;

                if exists == 0 {
                    return Err(AppError::NotFound(anyhow::anyhow!(
                        "Client {} not found",
                        input.client_id
                    )));
                }
                return Ok(PaymentCommit::Stale);
            }
        };

        let payment_id = Uuid::new_v4();
        let record = sqlx::query_as::<_, PaymentRecord>(&format!(
            r#"
            INSERT INTO payments (payment_id, client_id, amount, method, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(payment_id)
        .bind(input.client_id)
        .bind(input.amount)
        .bind(input.method.as_str())
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to insert payment: {}", e)))?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(
            payment_id = %record.payment_id,
            client_id = %record.client_id,
            amount = %record.amount,
            "Payment committed"
        );

        Ok(PaymentCommit::Committed { record, ledger })
    }

    #[instrument(skip(self), fields(client_id = %client_id))]
    async fn list_payments(&self, client_id: Uuid) -> Result<Vec<PaymentRecord>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_payments"])
            .start_timer();

        let payments = sqlx::query_as::<_, PaymentRecord>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM payments
            WHERE client_id = $1
            ORDER BY created_utc DESC, payment_id DESC
            "#
        ))
        .bind(client_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list payments: {}", e)))?;

        timer.observe_duration();

        Ok(payments)
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }
}
