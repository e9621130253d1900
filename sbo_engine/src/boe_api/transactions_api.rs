use std::fmt::Debug;

use log::*;
use sbo_common::Money;

use crate::{
    db_types::{
        LineItem,
        NewLineItem,
        NewTransaction,
        Receipt,
        Transaction,
        TransactionId,
        TransactionStatus,
    },
    traits::{BackOfficeDatabase, BackOfficeError},
    transaction_objects::TransactionQueryFilter,
};

/// `TransactionApi` is the primary API for recording transactions and walking them through the invoice registration
/// flow (`New` -> `Submitted` -> `Registered`/`Duplicate`/`Failed`).
pub struct TransactionApi<B> {
    db: B,
}

impl<B> Debug for TransactionApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TransactionApi")
    }
}

impl<B> TransactionApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> TransactionApi<B>
where B: BackOfficeDatabase
{
    /// Records a transaction with its line items. The call is idempotent: re-submitting an existing reference
    /// returns the stored record and `false`.
    ///
    /// The line amounts must be internally consistent (quantity x unit price) and sum to the transaction total.
    pub async fn record_transaction(
        &self,
        transaction: NewTransaction,
        lines: Vec<NewLineItem>,
    ) -> Result<(Transaction, bool), BackOfficeError> {
        if lines.is_empty() {
            return Err(BackOfficeError::ValidationError("a transaction needs at least one line item".to_string()));
        }
        for line in &lines {
            // checked_mul: quantity and unit price are caller-supplied and may overflow
            let expected = line.unit_price.checked_mul(line.quantity);
            if expected != Some(line.amount) {
                return Err(BackOfficeError::ValidationError(format!(
                    "line amount {} for {} does not match quantity {} x unit price {}",
                    line.amount, line.product_id, line.quantity, line.unit_price
                )));
            }
        }
        let line_total: Money = lines.iter().map(|l| l.amount).sum();
        if line_total != transaction.total_amount {
            return Err(BackOfficeError::ValidationError(format!(
                "line items sum to {line_total} but the transaction total is {}",
                transaction.total_amount
            )));
        }
        let reference = transaction.transaction_id.clone();
        let (transaction, inserted) = self.db.insert_transaction(transaction, lines).await?;
        if inserted {
            info!("🧾️ Transaction [{reference}] recorded with id {}", transaction.id);
        } else {
            debug!("🧾️ Transaction [{reference}] was already recorded");
        }
        Ok((transaction, inserted))
    }

    pub async fn transaction(&self, reference: &TransactionId) -> Result<Option<Transaction>, BackOfficeError> {
        self.db.fetch_transaction(reference).await
    }

    pub async fn line_items(&self, reference: &TransactionId) -> Result<Vec<LineItem>, BackOfficeError> {
        self.db.fetch_line_items(reference).await
    }

    pub async fn search(&self, query: TransactionQueryFilter) -> Result<Vec<Transaction>, BackOfficeError> {
        self.db.search_transactions(query).await
    }

    pub async fn receipt(&self, reference: &TransactionId) -> Result<Option<Receipt>, BackOfficeError> {
        self.db.fetch_receipt(reference).await
    }

    /// Transactions the registration worker should pick up next.
    pub async fn registrable_transactions(&self, limit: i64) -> Result<Vec<Transaction>, BackOfficeError> {
        self.db.fetch_registrable_transactions(limit).await
    }

    /// Marks a transaction as sent to Sage X3.
    pub async fn mark_submitted(&self, reference: &TransactionId) -> Result<Transaction, BackOfficeError> {
        self.db.update_transaction_status(reference, TransactionStatus::Submitted).await
    }

    /// Stores the assigned document number, finalizes the transaction as `Registered` and writes the receipt.
    pub async fn mark_registered(
        &self,
        reference: &TransactionId,
        document_number: &str,
    ) -> Result<Receipt, BackOfficeError> {
        let receipt = self.db.attach_document(reference, document_number, TransactionStatus::Registered).await?;
        info!("🧾️ Transaction [{reference}] registered as Sage document {document_number}");
        Ok(receipt)
    }

    /// Marks a transaction as a duplicate on the Sage side. When the status check recovered the original document
    /// number, it is stored and a receipt is written, exactly as for a fresh registration.
    pub async fn mark_duplicate(
        &self,
        reference: &TransactionId,
        document_number: Option<&str>,
    ) -> Result<Option<Receipt>, BackOfficeError> {
        match document_number {
            Some(num) => {
                let receipt = self.db.attach_document(reference, num, TransactionStatus::Duplicate).await?;
                info!("🧾️ Transaction [{reference}] already registered as Sage document {num}");
                Ok(Some(receipt))
            },
            None => {
                warn!("🧾️ Transaction [{reference}] is a duplicate, but Sage did not return its document number");
                self.db.update_transaction_status(reference, TransactionStatus::Duplicate).await?;
                Ok(None)
            },
        }
    }

    pub async fn mark_failed(&self, reference: &TransactionId) -> Result<Transaction, BackOfficeError> {
        warn!("🧾️ Transaction [{reference}] failed to register");
        self.db.update_transaction_status(reference, TransactionStatus::Failed).await
    }
}
