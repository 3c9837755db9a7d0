//! Data models for billing-service.

pub mod client;
pub mod invoice;
pub mod payment;

pub use client::{ClientLedger, NewClient, PaymentStatus};
pub use invoice::{
    InvoiceDocument, InvoiceLanguage, InvoiceLine, PaymentHistoryRow, PaymentSlip, VatBreakdown,
};
pub use payment::{NewPayment, PaymentMethod, PaymentRecord};
