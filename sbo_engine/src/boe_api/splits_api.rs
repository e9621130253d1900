use std::{collections::BTreeMap, fmt::Debug, path::Path};

use log::*;
use sbo_common::Money;

use crate::{
    boe_api::errors::SplitError,
    db_types::{NewRevenueShareConfig, RevenueShareConfig},
    split_objects::{split_amount, BillableLine, OrganizationSummary, ReportingPeriod, SplitEntry, SplitReport},
    traits::{BackOfficeError, RevenueShareManagement},
};

/// `SplitApi` manages revenue-share configurations and executes split runs: every billable line in the period is
/// allocated between its partner organization and the platform operator according to the config in force on the
/// transaction date.
pub struct SplitApi<B> {
    db: B,
}

impl<B> Debug for SplitApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SplitApi")
    }
}

impl<B> SplitApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> SplitApi<B>
where B: RevenueShareManagement
{
    pub async fn add_config(&self, config: NewRevenueShareConfig) -> Result<RevenueShareConfig, BackOfficeError> {
        if !(0..=10_000).contains(&config.partner_bps) {
            return Err(BackOfficeError::ValidationError(format!(
                "partner_bps must lie in 0..=10000, got {}",
                config.partner_bps
            )));
        }
        if config.start_date > config.end_date {
            return Err(BackOfficeError::ValidationError(format!(
                "start_date {} is after end_date {}",
                config.start_date, config.end_date
            )));
        }
        let config = self.db.insert_share_config(config).await?;
        info!(
            "📊️ Share config #{} added: {} keeps {}bps of {} from {} to {}",
            config.id, config.organization, config.partner_bps, config.product_id, config.start_date, config.end_date
        );
        Ok(config)
    }

    pub async fn configs(&self) -> Result<Vec<RevenueShareConfig>, BackOfficeError> {
        self.db.fetch_share_configs().await
    }

    pub async fn delete_config(&self, id: i64) -> Result<(), BackOfficeError> {
        self.db.delete_share_config(id).await?;
        info!("📊️ Share config #{id} deleted");
        Ok(())
    }

    /// Runs a split over the period and returns the full report.
    pub async fn execute(&self, period: ReportingPeriod) -> Result<SplitReport, BackOfficeError> {
        if period.start > period.end {
            return Err(BackOfficeError::ValidationError(format!(
                "period start {} is after period end {}",
                period.start, period.end
            )));
        }
        let configs = self.db.fetch_configs_active_between(period.start, period.end).await?;
        let lines = self.db.fetch_billable_lines(period.start, period.end).await?;
        debug!("📊️ Split run over {} - {}: {} lines, {} configs", period.start, period.end, lines.len(), configs.len());
        let report = compute_split(period, &lines, &configs);
        info!(
            "📊️ Split run complete: {} entries across {} organizations",
            report.entries.len(),
            report.summaries.len()
        );
        Ok(report)
    }

    /// Runs a split and writes the per-line entries to a CSV spreadsheet at `path`.
    pub async fn execute_and_export(&self, period: ReportingPeriod, path: &Path) -> Result<SplitReport, SplitError> {
        let report = self.execute(period).await?;
        export_csv(&report, path)?;
        info!("📊️ Split export written to {}", path.display());
        Ok(report)
    }
}

/// The split calculation itself: a single pass over the billable lines. For each line the config matching the
/// organization and product whose date range contains the transaction date is applied; when several match, the one
/// with the latest start_date wins. Lines without a matching config allocate fully to the platform operator.
pub fn compute_split(period: ReportingPeriod, lines: &[BillableLine], configs: &[RevenueShareConfig]) -> SplitReport {
    let mut entries = Vec::with_capacity(lines.len());
    let mut totals: BTreeMap<String, OrganizationSummary> = BTreeMap::new();
    for line in lines {
        let config = configs
            .iter()
            .filter(|c| {
                c.organization == line.organization
                    && c.product_id == line.product_id
                    && c.is_active_on(line.transaction_date)
            })
            .max_by_key(|c| c.start_date);
        let partner_bps = config.map(|c| c.partner_bps).unwrap_or(0);
        if config.is_none() {
            trace!(
                "📊️ No share config for {}/{} on {}; line goes to the platform operator",
                line.organization,
                line.product_id,
                line.transaction_date
            );
        }
        let (partner_amount, platform_amount) = split_amount(line.amount, partner_bps);
        let summary = totals.entry(line.organization.clone()).or_insert_with(|| OrganizationSummary {
            organization: line.organization.clone(),
            line_count: 0,
            gross: Money::default(),
            partner_total: Money::default(),
            platform_total: Money::default(),
        });
        summary.line_count += 1;
        summary.gross = summary.gross + line.amount;
        summary.partner_total = summary.partner_total + partner_amount;
        summary.platform_total = summary.platform_total + platform_amount;
        entries.push(SplitEntry {
            transaction_id: line.transaction_id.clone(),
            transaction_date: line.transaction_date,
            organization: line.organization.clone(),
            product_id: line.product_id.clone(),
            amount: line.amount,
            partner_bps,
            partner_amount,
            platform_amount,
            currency: line.currency.clone(),
        });
    }
    SplitReport { period, entries, summaries: totals.into_values().collect() }
}

/// Writes the report's entries as a CSV spreadsheet, one row per split entry.
pub fn export_csv(report: &SplitReport, path: &Path) -> Result<(), SplitError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "transaction_id",
        "date",
        "organization",
        "product_id",
        "currency",
        "amount",
        "partner_bps",
        "partner_amount",
        "platform_amount",
    ])?;
    for entry in &report.entries {
        writer.write_record([
            entry.transaction_id.to_string(),
            entry.transaction_date.to_string(),
            entry.organization.clone(),
            entry.product_id.clone(),
            entry.currency.clone(),
            entry.amount.to_string(),
            entry.partner_bps.to_string(),
            entry.partner_amount.to_string(),
            entry.platform_amount.to_string(),
        ])?;
    }
    writer.flush().map_err(SplitError::from)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use chrono::NaiveDate;

    use super::*;
    use crate::db_types::TransactionId;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn config(id: i64, org: &str, product: &str, bps: i64, start: NaiveDate, end: NaiveDate) -> RevenueShareConfig {
        RevenueShareConfig {
            id,
            organization: org.to_string(),
            product_id: product.to_string(),
            partner_bps: bps,
            start_date: start,
            end_date: end,
            created_at: Default::default(),
        }
    }

    fn line(txid: &str, day: NaiveDate, org: &str, product: &str, cents: i64) -> BillableLine {
        BillableLine {
            transaction_id: TransactionId(txid.to_string()),
            transaction_date: day,
            organization: org.to_string(),
            product_id: product.to_string(),
            amount: Money::from(cents),
            currency: "EUR".to_string(),
        }
    }

    fn q1() -> ReportingPeriod {
        ReportingPeriod::new(date(2024, 1, 1), date(2024, 3, 31))
    }

    #[test]
    fn matched_lines_are_split_per_config() {
        let configs = vec![config(1, "uni-x", "COURSE-101", 7000, date(2024, 1, 1), date(2024, 12, 31))];
        let lines = vec![line("TX-1", date(2024, 2, 1), "uni-x", "COURSE-101", 10_000)];
        let report = compute_split(q1(), &lines, &configs);
        assert_eq!(report.entries.len(), 1);
        let entry = &report.entries[0];
        assert_eq!(entry.partner_bps, 7000);
        assert_eq!(entry.partner_amount.value(), 7000);
        assert_eq!(entry.platform_amount.value(), 3000);
    }

    #[test]
    fn unmatched_lines_go_to_the_platform() {
        // Config is for a different product
        let configs = vec![config(1, "uni-x", "COURSE-102", 7000, date(2024, 1, 1), date(2024, 12, 31))];
        let lines = vec![line("TX-1", date(2024, 2, 1), "uni-x", "COURSE-101", 10_000)];
        let report = compute_split(q1(), &lines, &configs);
        let entry = &report.entries[0];
        assert_eq!(entry.partner_bps, 0);
        assert_eq!(entry.partner_amount.value(), 0);
        assert_eq!(entry.platform_amount.value(), 10_000);
    }

    #[test]
    fn config_outside_its_date_range_does_not_apply() {
        let configs = vec![config(1, "uni-x", "COURSE-101", 7000, date(2024, 3, 1), date(2024, 12, 31))];
        let lines = vec![line("TX-1", date(2024, 2, 1), "uni-x", "COURSE-101", 10_000)];
        let report = compute_split(q1(), &lines, &configs);
        assert_eq!(report.entries[0].partner_amount.value(), 0);
    }

    #[test]
    fn latest_starting_config_wins_on_overlap() {
        let configs = vec![
            config(1, "uni-x", "COURSE-101", 5000, date(2024, 1, 1), date(2024, 12, 31)),
            config(2, "uni-x", "COURSE-101", 8000, date(2024, 2, 1), date(2024, 12, 31)),
        ];
        let lines = vec![line("TX-1", date(2024, 2, 15), "uni-x", "COURSE-101", 10_000)];
        let report = compute_split(q1(), &lines, &configs);
        assert_eq!(report.entries[0].partner_bps, 8000);
    }

    #[test]
    fn summaries_aggregate_per_organization() {
        let configs = vec![
            config(1, "uni-x", "COURSE-101", 7000, date(2024, 1, 1), date(2024, 12, 31)),
            config(2, "uni-y", "COURSE-201", 6000, date(2024, 1, 1), date(2024, 12, 31)),
        ];
        let lines = vec![
            line("TX-1", date(2024, 2, 1), "uni-x", "COURSE-101", 10_000),
            line("TX-2", date(2024, 2, 2), "uni-x", "COURSE-101", 5_000),
            line("TX-3", date(2024, 2, 3), "uni-y", "COURSE-201", 20_000),
            line("TX-4", date(2024, 2, 4), "uni-y", "UNLISTED", 1_000),
        ];
        let report = compute_split(q1(), &lines, &configs);
        assert_eq!(report.summaries.len(), 2);
        let x = report.summaries.iter().find(|s| s.organization == "uni-x").unwrap();
        assert_eq!(x.line_count, 2);
        assert_eq!(x.gross.value(), 15_000);
        assert_eq!(x.partner_total.value(), 10_500);
        assert_eq!(x.platform_total.value(), 4_500);
        let y = report.summaries.iter().find(|s| s.organization == "uni-y").unwrap();
        assert_eq!(y.line_count, 2);
        assert_eq!(y.partner_total.value(), 12_000);
        assert_eq!(y.platform_total.value(), 9_000);
    }

    #[test]
    fn csv_export_writes_one_row_per_entry() {
        let configs = vec![config(1, "uni-x", "COURSE-101", 7000, date(2024, 1, 1), date(2024, 12, 31))];
        let lines = vec![
            line("TX-1", date(2024, 2, 1), "uni-x", "COURSE-101", 10_000),
            line("TX-2", date(2024, 2, 2), "uni-x", "COURSE-101", 9_999),
        ];
        let report = compute_split(q1(), &lines, &configs);
        let path = std::env::temp_dir().join("sbo_split_export_test.csv");
        export_csv(&report, &path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        let rows: Vec<&str> = contents.lines().collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].starts_with("transaction_id,date,organization"));
        assert_eq!(rows[1], "TX-1,2024-02-01,uni-x,COURSE-101,EUR,100.00,7000,70.00,30.00");
        assert_eq!(rows[2], "TX-2,2024-02-02,uni-x,COURSE-101,EUR,99.99,7000,69.99,30.00");
    }
}
