use sqlx::SqliteConnection;

use crate::{
    db_types::{LineItem, NewLineItem, TransactionId},
    traits::BackOfficeError,
};

/// Inserts the line items for a transaction. This is not atomic on its own; callers wrap it in the same database
/// transaction as the header insert.
pub async fn insert_line_items(
    reference: &TransactionId,
    lines: Vec<NewLineItem>,
    conn: &mut SqliteConnection,
) -> Result<(), BackOfficeError> {
    for line in lines {
        sqlx::query(
            r#"
            INSERT INTO line_items (
                transaction_id,
                product_id,
                description,
                organization,
                quantity,
                unit_price,
                vat_rate_bps,
                amount
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8);
        "#,
        )
        .bind(reference.as_str())
        .bind(line.product_id)
        .bind(line.description)
        .bind(line.organization)
        .bind(line.quantity)
        .bind(line.unit_price.value())
        .bind(line.vat_rate_bps)
        .bind(line.amount.value())
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub async fn fetch_line_items_for_transaction(
    reference: &TransactionId,
    conn: &mut SqliteConnection,
) -> Result<Vec<LineItem>, sqlx::Error> {
    let lines = sqlx::query_as("SELECT * FROM line_items WHERE transaction_id = $1 ORDER BY id ASC")
        .bind(reference.as_str())
        .fetch_all(conn)
        .await?;
    Ok(lines)
}
