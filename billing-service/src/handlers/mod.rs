//! HTTP handlers for the admin-facing billing API.

pub mod analytics;
pub mod clients;
pub mod health;
pub mod invoices;
pub mod payments;
