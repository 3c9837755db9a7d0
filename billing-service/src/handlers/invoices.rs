use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{InvoiceDocument, InvoiceLanguage};
use crate::services::metrics::INVOICE_EMAILS_TOTAL;
use crate::services::EmailMessage;
use crate::startup::AppState;
use service_core::error::AppError;

#[derive(Debug, Deserialize)]
pub struct InvoiceQuery {
    pub language: Option<String>,
}

/// Build the invoice document for a client. The document is composed fresh
/// from the ledger and payment history on every call.
#[tracing::instrument(skip(state))]
pub async fn build_invoice(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
    Query(query): Query<InvoiceQuery>,
) -> Result<Json<InvoiceDocument>, AppError> {
    let ledger = state.ledger.get_client(client_id).await?;
    let payments = state.ledger.list_payments(client_id).await?;

    let language = InvoiceLanguage::from_code(query.language.as_deref().unwrap_or_default());
    let document = state.invoices.build(&ledger, &payments, language);

    Ok(Json(document))
}

#[derive(Debug, Deserialize)]
pub struct SendInvoiceRequest {
    pub language: Option<String>,
    /// Overrides the recipient; defaults to the client's email address.
    pub to: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SendInvoiceResponse {
    pub invoice_number: String,
    pub delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Build the invoice and email it to the client.
///
/// Delivery failure is a partial success: the document was still built, so
/// the response reports `delivered: false` with the error instead of failing
/// the request. Nothing is ever rolled back here.
#[tracing::instrument(skip(state, request), fields(client_id = %client_id))]
pub async fn send_invoice(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
    Json(request): Json<SendInvoiceRequest>,
) -> Result<Json<SendInvoiceResponse>, AppError> {
    let ledger = state.ledger.get_client(client_id).await?;
    let payments = state.ledger.list_payments(client_id).await?;

    let language = InvoiceLanguage::from_code(request.language.as_deref().unwrap_or_default());
    let document = state.invoices.build(&ledger, &payments, language);

    let recipient = request
        .to
        .or_else(|| ledger.email.clone())
        .ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!(
                "Client {} has no email address and no recipient was given",
                client_id
            ))
        })?;

    let subject = document.subject();
    let message = EmailMessage {
        to: recipient,
        subject: subject.clone(),
        body_text: format!("{}\nCHF {:.2}", subject, document.balance),
        body_html: document.html.clone(),
    };

    match state.mailer.send(&message).await {
        Ok(()) => {
            INVOICE_EMAILS_TOTAL.with_label_values(&["sent"]).inc();
            Ok(Json(SendInvoiceResponse {
                invoice_number: document.invoice_number,
                delivered: true,
                error: None,
            }))
        }
        Err(e) => {
            tracing::warn!(client_id = %client_id, error = %e, "Invoice delivery failed");
            INVOICE_EMAILS_TOTAL.with_label_values(&["failed"]).inc();
            Ok(Json(SendInvoiceResponse {
                invoice_number: document.invoice_number,
                delivered: false,
                error: Some(e.to_string()),
            }))
        }
    }
}
