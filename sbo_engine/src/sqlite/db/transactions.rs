use log::debug;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewTransaction, Transaction, TransactionId, TransactionStatus},
    traits::BackOfficeError,
    transaction_objects::TransactionQueryFilter,
};

/// Inserts the transaction into the database, returning `false` in the second parameter if a record with the same
/// reference already exists.
pub async fn idempotent_insert(
    transaction: NewTransaction,
    conn: &mut SqliteConnection,
) -> Result<(Transaction, bool), BackOfficeError> {
    let inserted = match fetch_transaction_by_reference(&transaction.transaction_id, conn).await? {
        Some(transaction) => (transaction, false),
        None => {
            let transaction = insert_transaction(transaction, conn).await?;
            debug!("🧾️ Transaction [{}] inserted with id {}", transaction.transaction_id, transaction.id);
            (transaction, true)
        },
    };
    Ok(inserted)
}

/// Inserts a new transaction record using the given connection. This is not atomic. You can embed this call inside a
/// transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
async fn insert_transaction(
    transaction: NewTransaction,
    conn: &mut SqliteConnection,
) -> Result<Transaction, BackOfficeError> {
    let transaction = sqlx::query_as(
        r#"
            INSERT INTO transactions (
                transaction_id,
                customer_code,
                payer_name,
                payer_email,
                address_line,
                postal_code,
                city,
                country,
                vat_number,
                total_amount,
                total_vat,
                currency,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *;
        "#,
    )
    .bind(transaction.transaction_id)
    .bind(transaction.customer_code)
    .bind(transaction.payer_name)
    .bind(transaction.payer_email)
    .bind(transaction.address_line)
    .bind(transaction.postal_code)
    .bind(transaction.city)
    .bind(transaction.country)
    .bind(transaction.vat_number)
    .bind(transaction.total_amount.value())
    .bind(transaction.total_vat.value())
    .bind(transaction.currency)
    .bind(transaction.created_at)
    .fetch_one(conn)
    .await?;
    Ok(transaction)
}

pub async fn fetch_transaction_by_reference(
    reference: &TransactionId,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, sqlx::Error> {
    let transaction = sqlx::query_as("SELECT * FROM transactions WHERE transaction_id = $1")
        .bind(reference.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(transaction)
}

/// Fetches transactions according to criteria specified in the `TransactionQueryFilter`
///
/// Resulting transactions are ordered by `created_at` in ascending order
pub async fn search_transactions(
    query: TransactionQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Transaction>, sqlx::Error> {
    let mut builder = QueryBuilder::new(
        r#"
    SELECT * FROM transactions
    "#,
    );
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(status) = query.status {
        where_clause.push("status = ");
        where_clause.push_bind_unseparated(status.to_string());
    }
    if let Some(customer_code) = query.customer_code {
        where_clause.push("customer_code = ");
        where_clause.push_bind_unseparated(customer_code);
    }
    if let Some(currency) = query.currency {
        where_clause.push("currency = ");
        where_clause.push_bind_unseparated(currency);
    }
    if let Some(organization) = query.organization {
        where_clause.push(
            "EXISTS (SELECT 1 FROM line_items WHERE line_items.transaction_id = transactions.transaction_id AND \
             line_items.organization = ",
        );
        where_clause.push_bind_unseparated(organization);
        where_clause.push_unseparated(")");
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY created_at ASC");
    let query = builder.build_query_as::<Transaction>();
    let transactions = query.fetch_all(conn).await?;
    Ok(transactions)
}

/// Moves the transaction to the given status. `Registered` is a final status, so any attempt to move a registered
/// transaction elsewhere is rejected.
pub async fn update_status(
    reference: &TransactionId,
    status: TransactionStatus,
    conn: &mut SqliteConnection,
) -> Result<Transaction, BackOfficeError> {
    let current = fetch_transaction_by_reference(reference, conn)
        .await?
        .ok_or_else(|| BackOfficeError::TransactionNotFound(reference.clone()))?;
    if current.status == TransactionStatus::Registered && status != TransactionStatus::Registered {
        return Err(BackOfficeError::IllegalStatusTransition(format!(
            "transaction {reference} is Registered and cannot move to {status}"
        )));
    }
    let transaction =
        sqlx::query_as("UPDATE transactions SET status = $1 WHERE transaction_id = $2 RETURNING *")
            .bind(status.to_string())
            .bind(reference.as_str())
            .fetch_one(conn)
            .await?;
    Ok(transaction)
}

/// Stores the Sage document number on the transaction record and moves it to the given status. The same finality
/// rule as [`update_status`] applies.
pub async fn set_document(
    reference: &TransactionId,
    document_number: &str,
    status: TransactionStatus,
    conn: &mut SqliteConnection,
) -> Result<Transaction, BackOfficeError> {
    let current = fetch_transaction_by_reference(reference, conn)
        .await?
        .ok_or_else(|| BackOfficeError::TransactionNotFound(reference.clone()))?;
    if current.status == TransactionStatus::Registered && status != TransactionStatus::Registered {
        return Err(BackOfficeError::IllegalStatusTransition(format!(
            "transaction {reference} is Registered and cannot move to {status}"
        )));
    }
    let transaction = sqlx::query_as(
        "UPDATE transactions SET document_number = $1, status = $2 WHERE transaction_id = $3 RETURNING *",
    )
    .bind(document_number)
    .bind(status.to_string())
    .bind(reference.as_str())
    .fetch_one(conn)
    .await?;
    Ok(transaction)
}

/// Transactions waiting to be sent to Sage X3, oldest first. Failed transactions are included, so a transient error
/// is retried on a later run.
pub async fn fetch_registrable(limit: i64, conn: &mut SqliteConnection) -> Result<Vec<Transaction>, sqlx::Error> {
    let transactions = sqlx::query_as(
        "SELECT * FROM transactions WHERE status IN ('New', 'Failed') ORDER BY created_at ASC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(conn)
    .await?;
    Ok(transactions)
}
