use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ClientLedger, NewPayment, PaymentMethod, PaymentRecord};
use crate::startup::AppState;
use service_core::error::AppError;

#[derive(Debug, Deserialize)]
pub struct ApplyPaymentRequest {
    pub amount: Decimal,
    pub method: String,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApplyPaymentResponse {
    pub payment: PaymentRecord,
    pub client: ClientLedger,
}

#[tracing::instrument(skip(state, request), fields(client_id = %client_id))]
pub async fn apply_payment(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
    Json(request): Json<ApplyPaymentRequest>,
) -> Result<(StatusCode, Json<ApplyPaymentResponse>), AppError> {
    let method = PaymentMethod::from_string(&request.method).ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!(
            "Unknown payment method '{}'",
            request.method
        ))
    })?;

    let (payment, client) = state
        .payments
        .apply_payment(NewPayment {
            client_id,
            amount: request.amount,
            method,
            notes: request.notes,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApplyPaymentResponse { payment, client }),
    ))
}

#[tracing::instrument(skip(state))]
pub async fn list_payments(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
) -> Result<Json<Vec<PaymentRecord>>, AppError> {
    Ok(Json(state.ledger.list_payments(client_id).await?))
}
