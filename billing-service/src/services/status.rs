//! Payment status classification.

use crate::models::PaymentStatus;
use rust_decimal::Decimal;

/// Derive the payment status of a ledger from its amounts.
///
/// This is the only place the automatic {unpaid, partial, paid} band is
/// computed. Ledger creation, payment application and the status repair
/// path all call it; nothing else recomputes status.
///
/// A zero total is fully paid by definition, whatever has been paid so far.
/// Negative totals are rejected at ledger creation and never reach here.
pub fn classify(total_price: Decimal, paid_amount: Decimal) -> PaymentStatus {
    if paid_amount >= total_price {
        PaymentStatus::Paid
    } else if paid_amount <= Decimal::ZERO {
        PaymentStatus::Unpaid
    } else {
        PaymentStatus::Partial
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(v: i64) -> Decimal {
        Decimal::from(v)
    }

    #[test]
    fn nothing_paid_is_unpaid() {
        assert_eq!(classify(dec(900), dec(0)), PaymentStatus::Unpaid);
    }

    #[test]
    fn partial_payment_is_partial() {
        assert_eq!(classify(dec(900), dec(400)), PaymentStatus::Partial);
    }

    #[test]
    fn full_payment_is_paid() {
        assert_eq!(classify(dec(900), dec(900)), PaymentStatus::Paid);
    }

    #[test]
    fn overpayment_is_paid() {
        assert_eq!(classify(dec(100), dec(150)), PaymentStatus::Paid);
    }

    #[test]
    fn zero_total_is_always_paid() {
        assert_eq!(classify(dec(0), dec(0)), PaymentStatus::Paid);
        assert_eq!(classify(dec(0), dec(50)), PaymentStatus::Paid);
    }

    #[test]
    fn fractional_remainder_is_partial() {
        let total = Decimal::new(10050, 2); // 100.50
        let paid = Decimal::new(10049, 2); // 100.49
        assert_eq!(classify(total, paid), PaymentStatus::Partial);
    }
}
