//! Invoice document model.
//!
//! Invoice documents are ephemeral: rebuilt from the client ledger and its
//! payment history on every request, never persisted or cached.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Invoice language. Unknown codes fall back to German, the default
/// correspondence language of the business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceLanguage {
    De,
    Fr,
    En,
}

impl InvoiceLanguage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::De => "de",
            Self::Fr => "fr",
            Self::En => "en",
        }
    }

    /// Parse a language code, falling back to `De` for anything unknown.
    pub fn from_code(code: &str) -> Self {
        match code {
            "fr" => Self::Fr,
            "en" => Self::En,
            _ => Self::De,
        }
    }
}

/// VAT breakdown for a total that already includes VAT.
/// All three values are rounded to 2 decimal places at render time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatBreakdown {
    pub net: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub rate_pct: Decimal,
}

/// The single service line item of an invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub description: String,
    pub amount: Decimal,
}

/// One row of the payment history table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentHistoryRow {
    pub date: String,
    pub method: String,
    pub amount: Decimal,
}

/// Structured payment slip printed alongside the invoice so the client can
/// transfer the outstanding balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSlip {
    pub account: String,
    pub payable_to: String,
    pub reference: String,
    pub debtor: String,
    pub amount: Decimal,
    pub currency: String,
}

/// A fully composed, language-specific invoice document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceDocument {
    pub invoice_number: String,
    pub client_id: Uuid,
    pub client_name: String,
    pub client_address: Option<String>,
    pub language: InvoiceLanguage,
    pub line: InvoiceLine,
    pub vat: VatBreakdown,
    pub payments: Vec<PaymentHistoryRow>,
    pub paid_amount: Decimal,
    pub balance: Decimal,
    pub slip: PaymentSlip,
    pub html: String,
}

impl InvoiceDocument {
    /// Localized subject line for email delivery.
    pub fn subject(&self) -> String {
        let title = match self.language {
            InvoiceLanguage::De => "Rechnung",
            InvoiceLanguage::Fr => "Facture",
            InvoiceLanguage::En => "Invoice",
        };
        format!("{} {}", title, self.invoice_number)
    }
}
