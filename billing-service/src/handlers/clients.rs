use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::{ClientLedger, NewClient, PaymentStatus};
use crate::startup::AppState;
use service_core::error::AppError;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateClientRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub address: Option<String>,
    #[validate(length(min = 1, message = "Service type cannot be empty"))]
    pub service_type: String,
    pub service_date: Option<NaiveDate>,
    pub total_price: Decimal,
    #[serde(default)]
    pub paid_amount: Decimal,
    pub notes: Option<String>,
}

#[tracing::instrument(skip(state, request))]
pub async fn create_client(
    State(state): State<AppState>,
    Json(request): Json<CreateClientRequest>,
) -> Result<(StatusCode, Json<ClientLedger>), AppError> {
    request.validate()?;

    let ledger = state
        .ledger
        .create_client(NewClient {
            name: request.name,
            email: request.email,
            address: request.address,
            service_type: request.service_type,
            service_date: request.service_date,
            total_price: request.total_price,
            paid_amount: request.paid_amount,
            notes: request.notes,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ledger)))
}

#[tracing::instrument(skip(state))]
pub async fn get_client(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
) -> Result<Json<ClientLedger>, AppError> {
    Ok(Json(state.ledger.get_client(client_id).await?))
}

#[tracing::instrument(skip(state))]
pub async fn list_clients(
    State(state): State<AppState>,
) -> Result<Json<Vec<ClientLedger>>, AppError> {
    Ok(Json(state.ledger.list_clients().await?))
}

#[tracing::instrument(skip(state))]
pub async fn delete_client(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.ledger.delete_client(client_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: String,
}

#[tracing::instrument(skip(state, request))]
pub async fn set_status(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
    Json(request): Json<SetStatusRequest>,
) -> Result<Json<ClientLedger>, AppError> {
    let status = PaymentStatus::from_string(&request.status).ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!("Unknown status '{}'", request.status))
    })?;

    Ok(Json(state.ledger.set_status(client_id, status).await?))
}
