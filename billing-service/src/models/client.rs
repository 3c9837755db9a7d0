//! Client ledger model.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Payment status of a client ledger.
///
/// `Unpaid`/`Partial`/`Paid` are derived from `(total_price, paid_amount)`
/// by the status classifier. `Completed` and `Cancelled` are manual operator
/// overrides: they are persisted explicitly and survive payment application
/// until the operator changes status again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
    Completed,
    Cancelled,
}

impl PaymentStatus {
    /// Get string representation for database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Partial => "partial",
            Self::Paid => "paid",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "unpaid" => Some(Self::Unpaid),
            "partial" => Some(Self::Partial),
            "paid" => Some(Self::Paid),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Whether this status is a manual operator override rather than a
    /// value derivable from the ledger amounts.
    pub fn is_manual_override(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One client ledger row. Currency is fixed to CHF.
///
/// Invariant: `balance == total_price - paid_amount` after every committed
/// write, and `paid_amount` never decreases.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ClientLedger {
    pub client_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub service_type: String,
    pub service_date: Option<NaiveDate>,
    pub total_price: Decimal,
    pub paid_amount: Decimal,
    pub balance: Decimal,
    pub status: String,
    pub notes: Option<String>,
    pub created_utc: DateTime<Utc>,
}

impl ClientLedger {
    /// Get parsed payment status.
    pub fn parsed_status(&self) -> Option<PaymentStatus> {
        PaymentStatus::from_string(&self.status)
    }

    /// Whether a manual override is currently in effect.
    pub fn has_manual_override(&self) -> bool {
        self.parsed_status()
            .map(|s| s.is_manual_override())
            .unwrap_or(false)
    }
}

/// Input for creating a new client ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClient {
    pub name: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub service_type: String,
    pub service_date: Option<NaiveDate>,
    pub total_price: Decimal,
    pub paid_amount: Decimal,
    pub notes: Option<String>,
}
