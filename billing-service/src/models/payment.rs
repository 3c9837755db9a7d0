//! Payment record model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::Transfer => "transfer",
        }
    }

    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(Self::Cash),
            "card" => Some(Self::Card),
            "transfer" => Some(Self::Transfer),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One committed payment. Append-only: records are never edited or deleted
/// (a correction is a new record). Deleting the owning client cascades.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub payment_id: Uuid,
    pub client_id: Uuid,
    pub amount: Decimal,
    pub method: String,
    pub notes: Option<String>,
    pub created_utc: DateTime<Utc>,
}

/// Input for applying a payment to a client ledger.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub client_id: Uuid,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub notes: Option<String>,
}
