//! Ledger analytics.
//!
//! Pure, read-only rollups over client ledgers: period-bucketed revenue,
//! status distribution and growth. Runs on an "as of" snapshot and never
//! blocks payment application.

use crate::models::{ClientLedger, PaymentStatus};
use chrono::Datelike;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    Monthly,
    Annual,
}

impl TimeRange {
    /// Parse a range code; anything unknown means monthly.
    pub fn from_code(code: &str) -> Self {
        match code {
            "annual" => Self::Annual,
            _ => Self::Monthly,
        }
    }
}

/// One revenue bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodBucket {
    pub period: String,
    pub revenue: Decimal,
    pub paid_sum: Decimal,
    pub client_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub time_range: TimeRange,
    pub year: i32,
    pub periods: Vec<PeriodBucket>,
    pub status_distribution: BTreeMap<String, u64>,
    pub growth_pct: Decimal,
    pub completion_rate: Decimal,
}

/// Roll up ledgers into period buckets keyed by creation date.
///
/// `Monthly` produces the 12 calendar months of `year`; `Annual` the
/// trailing 5 calendar years ending at `year`. Growth compares the revenue
/// of the last bucket against the one before it and is zero when the
/// preceding bucket is zero, never a division by zero.
pub fn aggregate(ledgers: &[ClientLedger], time_range: TimeRange, year: i32) -> AnalyticsSummary {
    let periods = match time_range {
        TimeRange::Monthly => (1..=12u32)
            .map(|month| {
                bucket(
                    format!("{year}-{month:02}"),
                    ledgers.iter().filter(|l| {
                        l.created_utc.year() == year && l.created_utc.month() == month
                    }),
                )
            })
            .collect::<Vec<_>>(),
        TimeRange::Annual => (year.saturating_sub(4)..=year)
            .map(|y| {
                bucket(
                    y.to_string(),
                    ledgers.iter().filter(|l| l.created_utc.year() == y),
                )
            })
            .collect::<Vec<_>>(),
    };

    let growth_pct = match periods.as_slice() {
        [.., previous, current] if !previous.revenue.is_zero() => ((current.revenue
            - previous.revenue)
            / previous.revenue
            * Decimal::from(100))
        .round_dp(2),
        _ => Decimal::ZERO,
    };

    let mut status_distribution: BTreeMap<String, u64> = BTreeMap::new();
    for ledger in ledgers {
        *status_distribution.entry(ledger.status.clone()).or_insert(0) += 1;
    }

    let completed = ledgers
        .iter()
        .filter(|l| {
            matches!(
                l.parsed_status(),
                Some(PaymentStatus::Completed) | Some(PaymentStatus::Paid)
            )
        })
        .count();
    let completion_rate = if ledgers.is_empty() {
        Decimal::ZERO
    } else {
        (Decimal::from(completed) / Decimal::from(ledgers.len()) * Decimal::from(100)).round_dp(2)
    };

    AnalyticsSummary {
        time_range,
        year,
        periods,
        status_distribution,
        growth_pct,
        completion_rate,
    }
}

fn bucket<'a>(
    period: String,
    ledgers: impl Iterator<Item = &'a ClientLedger>,
) -> PeriodBucket {
    let mut revenue = Decimal::ZERO;
    let mut paid_sum = Decimal::ZERO;
    let mut client_count = 0u64;
    for ledger in ledgers {
        revenue += ledger.total_price;
        paid_sum += ledger.paid_amount;
        client_count += 1;
    }
    PeriodBucket {
        period,
        revenue,
        paid_sum,
        client_count,
    }
}
