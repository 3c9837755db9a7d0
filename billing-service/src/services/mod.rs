//! Business services for billing-service.

pub mod analytics;
pub mod database;
pub mod email;
pub mod invoice;
pub mod ledger;
pub mod memory;
pub mod metrics;
pub mod payments;
pub mod slip;
pub mod status;
pub mod store;

pub use analytics::{aggregate, AnalyticsSummary, PeriodBucket, TimeRange};
pub use database::Database;
pub use email::{EmailMessage, EmailSender, MockEmailSender, SmtpSender};
pub use invoice::InvoiceBuilder;
pub use ledger::LedgerService;
pub use memory::MemoryStore;
pub use metrics::{get_metrics, init_metrics};
pub use payments::PaymentService;
pub use slip::compute_slip;
pub use status::classify;
pub use store::{LedgerStore, PaymentCommit};
