use chrono::NaiveDate;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewRevenueShareConfig, RevenueShareConfig},
    split_objects::BillableLine,
    traits::BackOfficeError,
};

pub async fn insert_config(
    config: NewRevenueShareConfig,
    conn: &mut SqliteConnection,
) -> Result<RevenueShareConfig, BackOfficeError> {
    let config = sqlx::query_as(
        r#"
            INSERT INTO revenue_share_configs (
                organization,
                product_id,
                partner_bps,
                start_date,
                end_date
            ) VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(config.organization)
    .bind(config.product_id)
    .bind(config.partner_bps)
    .bind(config.start_date)
    .bind(config.end_date)
    .fetch_one(conn)
    .await?;
    Ok(config)
}

pub async fn fetch_configs(conn: &mut SqliteConnection) -> Result<Vec<RevenueShareConfig>, sqlx::Error> {
    let configs = sqlx::query_as("SELECT * FROM revenue_share_configs ORDER BY organization, product_id, start_date")
        .fetch_all(conn)
        .await?;
    Ok(configs)
}

pub async fn delete_config(id: i64, conn: &mut SqliteConnection) -> Result<(), BackOfficeError> {
    let result = sqlx::query("DELETE FROM revenue_share_configs WHERE id = $1").bind(id).execute(conn).await?;
    if result.rows_affected() == 0 {
        return Err(BackOfficeError::ShareConfigNotFound(id));
    }
    Ok(())
}

/// Configs whose date range intersects [start, end].
pub async fn fetch_configs_active_between(
    start: NaiveDate,
    end: NaiveDate,
    conn: &mut SqliteConnection,
) -> Result<Vec<RevenueShareConfig>, sqlx::Error> {
    let configs =
        sqlx::query_as("SELECT * FROM revenue_share_configs WHERE start_date <= $1 AND end_date >= $2")
            .bind(end)
            .bind(start)
            .fetch_all(conn)
            .await?;
    Ok(configs)
}

/// Line items of registered transactions dated inside [start, end]. The transaction date is the invoice date, taken
/// from the transaction header.
pub async fn fetch_billable_lines(
    start: NaiveDate,
    end: NaiveDate,
    conn: &mut SqliteConnection,
) -> Result<Vec<BillableLine>, sqlx::Error> {
    let lines = sqlx::query_as(
        r#"
            SELECT
                li.transaction_id AS transaction_id,
                date(t.created_at) AS transaction_date,
                li.organization AS organization,
                li.product_id AS product_id,
                li.amount AS amount,
                t.currency AS currency
            FROM line_items li
            JOIN transactions t ON t.transaction_id = li.transaction_id
            WHERE t.status = 'Registered' AND date(t.created_at) BETWEEN $1 AND $2
            ORDER BY t.created_at ASC, li.id ASC;
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(conn)
    .await?;
    Ok(lines)
}
