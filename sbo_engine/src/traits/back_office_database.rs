use thiserror::Error;

use crate::{
    db_types::{LineItem, NewLineItem, NewTransaction, Receipt, Transaction, TransactionId, TransactionStatus},
    transaction_objects::TransactionQueryFilter,
};

/// Transaction recording and invoice-registration bookkeeping.
#[allow(async_fn_in_trait)]
pub trait BackOfficeDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a transaction together with its line items in a single atomic transaction. The call is idempotent:
    /// if a record with the same `transaction_id` already exists, it is returned unchanged and the second tuple
    /// member is `false`.
    async fn insert_transaction(
        &self,
        transaction: NewTransaction,
        lines: Vec<NewLineItem>,
    ) -> Result<(Transaction, bool), BackOfficeError>;

    async fn fetch_transaction(&self, reference: &TransactionId) -> Result<Option<Transaction>, BackOfficeError>;

    async fn fetch_line_items(&self, reference: &TransactionId) -> Result<Vec<LineItem>, BackOfficeError>;

    /// Fetches transactions according to the criteria in the given filter, ordered by `created_at` ascending.
    async fn search_transactions(&self, query: TransactionQueryFilter) -> Result<Vec<Transaction>, BackOfficeError>;

    /// Moves a transaction to the given status. Registered transactions are final and may not transition away.
    async fn update_transaction_status(
        &self,
        reference: &TransactionId,
        status: TransactionStatus,
    ) -> Result<Transaction, BackOfficeError>;

    /// Atomically stores the Sage document number on the transaction, moves it to the given status and writes the
    /// receipt record. Idempotent on the receipt: a second call with the same document number returns the existing
    /// receipt.
    async fn attach_document(
        &self,
        reference: &TransactionId,
        document_number: &str,
        status: TransactionStatus,
    ) -> Result<Receipt, BackOfficeError>;

    async fn fetch_receipt(&self, reference: &TransactionId) -> Result<Option<Receipt>, BackOfficeError>;

    /// Transactions the registration worker should pick up: status `New` or `Failed`, oldest first.
    async fn fetch_registrable_transactions(&self, limit: i64) -> Result<Vec<Transaction>, BackOfficeError>;
}

#[derive(Debug, Error)]
pub enum BackOfficeError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Transaction {0} was not found")]
    TransactionNotFound(TransactionId),
    #[error("Invalid record: {0}")]
    ValidationError(String),
    #[error("Illegal status transition: {0}")]
    IllegalStatusTransition(String),
    #[error("Revenue share configuration {0} was not found")]
    ShareConfigNotFound(i64),
}

impl From<sqlx::Error> for BackOfficeError {
    fn from(e: sqlx::Error) -> Self {
        BackOfficeError::DatabaseError(e.to_string())
    }
}
