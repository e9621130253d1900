use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Receipt, TransactionId},
    traits::BackOfficeError,
};

/// Inserts the receipt for a transaction, returning the existing record if one has already been written.
pub async fn idempotent_insert(
    reference: &TransactionId,
    document_number: &str,
    conn: &mut SqliteConnection,
) -> Result<Receipt, BackOfficeError> {
    if let Some(receipt) = fetch_receipt_by_reference(reference, conn).await? {
        debug!("🧾️ Receipt for [{reference}] already exists, document {}", receipt.document_number);
        return Ok(receipt);
    }
    let receipt =
        sqlx::query_as("INSERT INTO receipts (transaction_id, document_number) VALUES ($1, $2) RETURNING *")
            .bind(reference.as_str())
            .bind(document_number)
            .fetch_one(conn)
            .await?;
    Ok(receipt)
}

pub async fn fetch_receipt_by_reference(
    reference: &TransactionId,
    conn: &mut SqliteConnection,
) -> Result<Option<Receipt>, sqlx::Error> {
    let receipt = sqlx::query_as("SELECT * FROM receipts WHERE transaction_id = $1")
        .bind(reference.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(receipt)
}
