use chrono::NaiveDate;

use crate::{
    db_types::{NewRevenueShareConfig, RevenueShareConfig},
    split_objects::BillableLine,
    traits::BackOfficeError,
};

/// Revenue-share configuration records and the period queries the split engine runs on.
#[allow(async_fn_in_trait)]
pub trait RevenueShareManagement: Clone {
    async fn insert_share_config(&self, config: NewRevenueShareConfig) -> Result<RevenueShareConfig, BackOfficeError>;

    async fn fetch_share_configs(&self) -> Result<Vec<RevenueShareConfig>, BackOfficeError>;

    /// Deletes the config with the given id. Returns an error if it does not exist.
    async fn delete_share_config(&self, id: i64) -> Result<(), BackOfficeError>;

    /// All configs whose [start_date, end_date] range intersects the given period.
    async fn fetch_configs_active_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RevenueShareConfig>, BackOfficeError>;

    /// Line items of registered transactions whose invoice date falls inside the period, the raw material of a split
    /// run.
    async fn fetch_billable_lines(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<BillableLine>, BackOfficeError>;
}
