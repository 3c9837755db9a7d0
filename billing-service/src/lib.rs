//! billing-service: client billing ledger, invoices and analytics.
pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
