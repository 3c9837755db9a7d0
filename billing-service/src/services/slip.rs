//! Payment slip computation.

use crate::config::OrgConfig;
use crate::models::{ClientLedger, PaymentSlip};

/// Currency is fixed; the business bills in CHF only.
pub const SLIP_CURRENCY: &str = "CHF";

/// Compute the payment slip for a ledger.
///
/// The payable amount is the outstanding balance recomputed from the ledger
/// amounts at render time, never the historical total and never the cached
/// `balance` column. Account and reference are organization-wide values from
/// configuration.
pub fn compute_slip(org: &OrgConfig, ledger: &ClientLedger) -> PaymentSlip {
    let debtor = match &ledger.address {
        Some(address) => format!("{}, {}", ledger.name, address),
        None => ledger.name.clone(),
    };

    PaymentSlip {
        account: org.slip_account.clone(),
        payable_to: format!("{}, {}, {}", org.name, org.address, org.locality),
        reference: org.slip_reference.clone(),
        debtor,
        amount: ledger.total_price - ledger.paid_amount,
        currency: SLIP_CURRENCY.to_string(),
    }
}
