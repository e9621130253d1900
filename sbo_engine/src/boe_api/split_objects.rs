use chrono::NaiveDate;
use sbo_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::db_types::TransactionId;

/// The date range a split run covers. Both bounds are inclusive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReportingPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportingPeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }
}

/// One line item of a registered transaction, joined with the transaction fields the split engine needs.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BillableLine {
    pub transaction_id: TransactionId,
    /// The invoice date the config date-range check runs against.
    pub transaction_date: NaiveDate,
    pub organization: String,
    pub product_id: String,
    pub amount: Money,
    pub currency: String,
}

/// The allocation of a single billable line between the partner organization and the platform operator.
#[derive(Debug, Clone, Serialize)]
pub struct SplitEntry {
    pub transaction_id: TransactionId,
    pub transaction_date: NaiveDate,
    pub organization: String,
    pub product_id: String,
    pub amount: Money,
    /// The partner share that was applied, in basis points. 0 when no config matched.
    pub partner_bps: i64,
    pub partner_amount: Money,
    pub platform_amount: Money,
    pub currency: String,
}

/// Per-organization totals over a split run.
#[derive(Debug, Clone, Serialize)]
pub struct OrganizationSummary {
    pub organization: String,
    pub line_count: u64,
    pub gross: Money,
    pub partner_total: Money,
    pub platform_total: Money,
}

#[derive(Debug, Clone, Serialize)]
pub struct SplitReport {
    pub period: ReportingPeriod,
    pub entries: Vec<SplitEntry>,
    pub summaries: Vec<OrganizationSummary>,
}

/// Splits an amount into (partner, platform) shares. The partner share is rounded down to the cent; the platform
/// operator absorbs the remainder, so the two shares always sum back to the original amount.
pub fn split_amount(amount: Money, partner_bps: i64) -> (Money, Money) {
    let partner = ((amount.value() as i128 * partner_bps as i128).div_euclid(10_000)) as i64;
    let partner = Money::from(partner);
    (partner, amount - partner)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn partner_share_rounds_down() {
        // 33.33% of 0.01 is below one cent
        let (partner, platform) = split_amount(Money::from(1), 3333);
        assert_eq!(partner.value(), 0);
        assert_eq!(platform.value(), 1);

        let (partner, platform) = split_amount(Money::from(9999), 7000);
        assert_eq!(partner.value(), 6999);
        assert_eq!(platform.value(), 3000);
    }

    #[test]
    fn shares_always_sum_to_the_amount() {
        for amount in [0i64, 1, 99, 100, 12345, 999_999_999] {
            for bps in [0i64, 1, 250, 3333, 5000, 9999, 10_000] {
                let amount = Money::from(amount);
                let (partner, platform) = split_amount(amount, bps);
                assert_eq!(partner + platform, amount, "amount={amount} bps={bps}");
            }
        }
    }

    #[test]
    fn full_share_goes_to_the_partner() {
        let (partner, platform) = split_amount(Money::from(5000), 10_000);
        assert_eq!(partner.value(), 5000);
        assert_eq!(platform.value(), 0);
    }
}
