//! `SqliteDatabase` is a concrete implementation of a back-office storage backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use chrono::NaiveDate;
use log::*;
use sqlx::SqlitePool;

use super::db::{db_url, line_items, new_pool, receipts, revenue_shares, transactions};
use crate::{
    db_types::{
        LineItem,
        NewLineItem,
        NewRevenueShareConfig,
        NewTransaction,
        Receipt,
        RevenueShareConfig,
        Transaction,
        TransactionId,
        TransactionStatus,
    },
    split_objects::BillableLine,
    traits::{BackOfficeDatabase, BackOfficeError, RevenueShareManagement},
    transaction_objects::TransactionQueryFilter,
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL from the environment.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    /// Creates a new database API object against the given URL and brings the schema up to date.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl BackOfficeDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_transaction(
        &self,
        transaction: NewTransaction,
        lines: Vec<NewLineItem>,
    ) -> Result<(Transaction, bool), BackOfficeError> {
        let mut tx = self.pool.begin().await?;
        let (transaction, inserted) = transactions::idempotent_insert(transaction, &mut tx).await?;
        if inserted {
            line_items::insert_line_items(&transaction.transaction_id, lines, &mut *tx).await?;
        }
        tx.commit().await?;
        Ok((transaction, inserted))
    }

    async fn fetch_transaction(&self, reference: &TransactionId) -> Result<Option<Transaction>, BackOfficeError> {
        let mut conn = self.pool.acquire().await?;
        let transaction = transactions::fetch_transaction_by_reference(reference, &mut conn).await?;
        Ok(transaction)
    }

    async fn fetch_line_items(&self, reference: &TransactionId) -> Result<Vec<LineItem>, BackOfficeError> {
        let mut conn = self.pool.acquire().await?;
        let lines = line_items::fetch_line_items_for_transaction(reference, &mut conn).await?;
        Ok(lines)
    }

    async fn search_transactions(&self, query: TransactionQueryFilter) -> Result<Vec<Transaction>, BackOfficeError> {
        let mut conn = self.pool.acquire().await?;
        let transactions = transactions::search_transactions(query, &mut conn).await?;
        Ok(transactions)
    }

    async fn update_transaction_status(
        &self,
        reference: &TransactionId,
        status: TransactionStatus,
    ) -> Result<Transaction, BackOfficeError> {
        let mut conn = self.pool.acquire().await?;
        let transaction = transactions::update_status(reference, status, &mut conn).await?;
        Ok(transaction)
    }

    async fn attach_document(
        &self,
        reference: &TransactionId,
        document_number: &str,
        status: TransactionStatus,
    ) -> Result<Receipt, BackOfficeError> {
        let mut tx = self.pool.begin().await?;
        let transaction = transactions::set_document(reference, document_number, status, &mut tx).await?;
        let receipt = receipts::idempotent_insert(&transaction.transaction_id, document_number, &mut tx).await?;
        tx.commit().await?;
        Ok(receipt)
    }

    async fn fetch_receipt(&self, reference: &TransactionId) -> Result<Option<Receipt>, BackOfficeError> {
        let mut conn = self.pool.acquire().await?;
        let receipt = receipts::fetch_receipt_by_reference(reference, &mut conn).await?;
        Ok(receipt)
    }

    async fn fetch_registrable_transactions(&self, limit: i64) -> Result<Vec<Transaction>, BackOfficeError> {
        let mut conn = self.pool.acquire().await?;
        let transactions = transactions::fetch_registrable(limit, &mut conn).await?;
        Ok(transactions)
    }
}

impl RevenueShareManagement for SqliteDatabase {
    async fn insert_share_config(&self, config: NewRevenueShareConfig) -> Result<RevenueShareConfig, BackOfficeError> {
        let mut conn = self.pool.acquire().await?;
        let config = revenue_shares::insert_config(config, &mut conn).await?;
        Ok(config)
    }

    async fn fetch_share_configs(&self) -> Result<Vec<RevenueShareConfig>, BackOfficeError> {
        let mut conn = self.pool.acquire().await?;
        let configs = revenue_shares::fetch_configs(&mut conn).await?;
        Ok(configs)
    }

    async fn delete_share_config(&self, id: i64) -> Result<(), BackOfficeError> {
        let mut conn = self.pool.acquire().await?;
        revenue_shares::delete_config(id, &mut conn).await
    }

    async fn fetch_configs_active_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RevenueShareConfig>, BackOfficeError> {
        let mut conn = self.pool.acquire().await?;
        let configs = revenue_shares::fetch_configs_active_between(start, end, &mut conn).await?;
        Ok(configs)
    }

    async fn fetch_billable_lines(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<BillableLine>, BackOfficeError> {
        let mut conn = self.pool.acquire().await?;
        let lines = revenue_shares::fetch_billable_lines(start, end, &mut conn).await?;
        Ok(lines)
    }
}
