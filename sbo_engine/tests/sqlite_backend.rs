//! Integration tests for the SQLite backend, running against an in-memory database.
use chrono::{NaiveDate, TimeZone, Utc};
use sbo_common::Money;
use sbo_engine::{
    db_types::{NewLineItem, NewRevenueShareConfig, NewTransaction, TransactionId, TransactionStatus},
    split_objects::ReportingPeriod,
    traits::{BackOfficeError, RevenueShareManagement},
    transaction_objects::TransactionQueryFilter,
    SplitApi,
    SqliteDatabase,
    TransactionApi,
};

async fn new_db() -> SqliteDatabase {
    // A single connection keeps the in-memory database alive for the whole test
    SqliteDatabase::new_with_url("sqlite::memory:", 1).await.expect("Error creating in-memory database")
}

fn new_transaction(reference: &str, day: NaiveDate, total_cents: i64) -> NewTransaction {
    NewTransaction {
        transaction_id: TransactionId(reference.to_string()),
        customer_code: "WEBSHOP".to_string(),
        payer_name: "Ada Lovelace".to_string(),
        payer_email: "ada@example.com".to_string(),
        address_line: "12 Analytical Way".to_string(),
        postal_code: "75001".to_string(),
        city: "Paris".to_string(),
        country: "France".to_string(),
        vat_number: None,
        total_amount: Money::from(total_cents),
        total_vat: Money::from(total_cents / 6),
        currency: "EUR".to_string(),
        created_at: Utc.from_utc_datetime(&day.and_hms_opt(10, 30, 0).unwrap()),
    }
}

fn new_line(product: &str, org: &str, qty: i64, unit_cents: i64) -> NewLineItem {
    NewLineItem {
        product_id: product.to_string(),
        description: format!("{product} enrolment"),
        organization: org.to_string(),
        quantity: qty,
        unit_price: Money::from(unit_cents),
        vat_rate_bps: 2000,
        amount: Money::from(qty * unit_cents),
    }
}

fn feb(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 2, day).unwrap()
}

#[tokio::test]
async fn recording_a_transaction_is_idempotent() {
    let db = new_db().await;
    let api = TransactionApi::new(db);
    let tx = new_transaction("TX-1000", feb(1), 10_000);
    let lines = vec![new_line("COURSE-101", "uni-x", 2, 5_000)];
    let (stored, inserted) = api.record_transaction(tx.clone(), lines.clone()).await.unwrap();
    assert!(inserted);
    assert_eq!(stored.status, TransactionStatus::New);
    assert_eq!(stored.total_amount.value(), 10_000);
    let (again, inserted) = api.record_transaction(tx, lines).await.unwrap();
    assert!(!inserted);
    assert_eq!(again.id, stored.id);
    let items = api.line_items(&stored.transaction_id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].organization, "uni-x");
    assert_eq!(items[0].amount.value(), 10_000);
}

#[tokio::test]
async fn inconsistent_line_amounts_are_rejected() {
    let db = new_db().await;
    let api = TransactionApi::new(db);
    let tx = new_transaction("TX-1001", feb(1), 10_000);
    let mut bad_line = new_line("COURSE-101", "uni-x", 2, 5_000);
    bad_line.amount = Money::from(9_999);
    let err = api.record_transaction(tx.clone(), vec![bad_line]).await.unwrap_err();
    assert!(matches!(err, BackOfficeError::ValidationError(_)));
    // Lines that are internally consistent but do not sum to the header total
    let short_line = new_line("COURSE-101", "uni-x", 1, 5_000);
    let err = api.record_transaction(tx, vec![short_line]).await.unwrap_err();
    assert!(matches!(err, BackOfficeError::ValidationError(_)));
}

#[tokio::test]
async fn overflowing_line_amounts_are_rejected() {
    let db = new_db().await;
    let api = TransactionApi::new(db);
    let tx = new_transaction("TX-1006", feb(6), 5_000);
    let mut line = new_line("COURSE-101", "uni-x", 1, 5_000);
    line.quantity = i64::MAX;
    line.unit_price = Money::from(2);
    let err = api.record_transaction(tx, vec![line]).await.unwrap_err();
    assert!(matches!(err, BackOfficeError::ValidationError(_)));
}

#[tokio::test]
async fn registration_flow_attaches_document_and_receipt() {
    let db = new_db().await;
    let api = TransactionApi::new(db);
    let tx = new_transaction("TX-1002", feb(2), 5_000);
    let reference = tx.transaction_id.clone();
    api.record_transaction(tx, vec![new_line("COURSE-101", "uni-x", 1, 5_000)]).await.unwrap();
    let submitted = api.mark_submitted(&reference).await.unwrap();
    assert_eq!(submitted.status, TransactionStatus::Submitted);
    let receipt = api.mark_registered(&reference, "FAC-0042").await.unwrap();
    assert_eq!(receipt.document_number, "FAC-0042");
    let stored = api.transaction(&reference).await.unwrap().unwrap();
    assert_eq!(stored.status, TransactionStatus::Registered);
    assert_eq!(stored.document_number.as_deref(), Some("FAC-0042"));
    // A second registration returns the same receipt
    let again = api.mark_registered(&reference, "FAC-0042").await.unwrap();
    assert_eq!(again.id, receipt.id);
}

#[tokio::test]
async fn registered_transactions_cannot_change_status() {
    let db = new_db().await;
    let api = TransactionApi::new(db);
    let tx = new_transaction("TX-1003", feb(3), 5_000);
    let reference = tx.transaction_id.clone();
    api.record_transaction(tx, vec![new_line("COURSE-101", "uni-x", 1, 5_000)]).await.unwrap();
    api.mark_registered(&reference, "FAC-0001").await.unwrap();
    let err = api.mark_failed(&reference).await.unwrap_err();
    assert!(matches!(err, BackOfficeError::IllegalStatusTransition(_)));
}

#[tokio::test]
async fn duplicates_without_a_document_number_only_move_status() {
    let db = new_db().await;
    let api = TransactionApi::new(db);
    let tx = new_transaction("TX-1004", feb(4), 5_000);
    let reference = tx.transaction_id.clone();
    api.record_transaction(tx, vec![new_line("COURSE-101", "uni-x", 1, 5_000)]).await.unwrap();
    let receipt = api.mark_duplicate(&reference, None).await.unwrap();
    assert!(receipt.is_none());
    let stored = api.transaction(&reference).await.unwrap().unwrap();
    assert_eq!(stored.status, TransactionStatus::Duplicate);
    assert!(api.receipt(&reference).await.unwrap().is_none());
    // When the status check recovers the number, the receipt is written after all
    let receipt = api.mark_duplicate(&reference, Some("FAC-0077")).await.unwrap().unwrap();
    assert_eq!(receipt.document_number, "FAC-0077");
}

#[tokio::test]
async fn search_filters_by_status_and_organization() {
    let db = new_db().await;
    let api = TransactionApi::new(db.clone());
    api.record_transaction(new_transaction("TX-1", feb(1), 5_000), vec![new_line("COURSE-101", "uni-x", 1, 5_000)])
        .await
        .unwrap();
    api.record_transaction(new_transaction("TX-2", feb(2), 7_000), vec![new_line("COURSE-201", "uni-y", 1, 7_000)])
        .await
        .unwrap();
    api.mark_registered(&TransactionId("TX-2".to_string()), "FAC-0002").await.unwrap();

    let new_only = api.search(TransactionQueryFilter::default().with_status(TransactionStatus::New)).await.unwrap();
    assert_eq!(new_only.len(), 1);
    assert_eq!(new_only[0].transaction_id.as_str(), "TX-1");

    let uni_y = api.search(TransactionQueryFilter::default().with_organization("uni-y")).await.unwrap();
    assert_eq!(uni_y.len(), 1);
    assert_eq!(uni_y[0].transaction_id.as_str(), "TX-2");

    let all = api.search(TransactionQueryFilter::default()).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn registrable_transactions_come_oldest_first() {
    let db = new_db().await;
    let api = TransactionApi::new(db);
    api.record_transaction(new_transaction("TX-NEW-2", feb(10), 5_000), vec![new_line("C-1", "uni-x", 1, 5_000)])
        .await
        .unwrap();
    api.record_transaction(new_transaction("TX-NEW-1", feb(5), 5_000), vec![new_line("C-1", "uni-x", 1, 5_000)])
        .await
        .unwrap();
    let batch = api.registrable_transactions(10).await.unwrap();
    assert_eq!(batch.len(), 2);
    assert_eq!(batch[0].transaction_id.as_str(), "TX-NEW-1");
    let batch = api.registrable_transactions(1).await.unwrap();
    assert_eq!(batch.len(), 1);
}

#[tokio::test]
async fn failed_transactions_are_registrable_again() {
    let db = new_db().await;
    let api = TransactionApi::new(db);
    let tx = new_transaction("TX-1005", feb(5), 5_000);
    let reference = tx.transaction_id.clone();
    api.record_transaction(tx, vec![new_line("COURSE-101", "uni-x", 1, 5_000)]).await.unwrap();
    api.mark_failed(&reference).await.unwrap();
    let batch = api.registrable_transactions(10).await.unwrap();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].transaction_id, reference);
    assert_eq!(batch[0].status, TransactionStatus::Failed);
    // Once registered, it drops out of the worker's view
    api.mark_registered(&reference, "FAC-0005").await.unwrap();
    assert!(api.registrable_transactions(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn share_config_lifecycle() {
    let db = new_db().await;
    let api = SplitApi::new(db);
    let config = api
        .add_config(NewRevenueShareConfig {
            organization: "uni-x".to_string(),
            product_id: "COURSE-101".to_string(),
            partner_bps: 7000,
            start_date: feb(1),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        })
        .await
        .unwrap();
    assert_eq!(api.configs().await.unwrap().len(), 1);
    api.delete_config(config.id).await.unwrap();
    assert!(api.configs().await.unwrap().is_empty());
    let err = api.delete_config(config.id).await.unwrap_err();
    assert!(matches!(err, BackOfficeError::ShareConfigNotFound(_)));
}

#[tokio::test]
async fn split_run_only_sees_registered_transactions_in_period() {
    let db = new_db().await;
    let tx_api = TransactionApi::new(db.clone());
    let split_api = SplitApi::new(db.clone());
    split_api
        .add_config(NewRevenueShareConfig {
            organization: "uni-x".to_string(),
            product_id: "COURSE-101".to_string(),
            partner_bps: 6000,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        })
        .await
        .unwrap();
    // Registered, inside the period
    tx_api
        .record_transaction(new_transaction("TX-IN", feb(10), 10_000), vec![new_line("COURSE-101", "uni-x", 1, 10_000)])
        .await
        .unwrap();
    tx_api.mark_registered(&TransactionId("TX-IN".to_string()), "FAC-0100").await.unwrap();
    // Registered, outside the period
    let march = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    tx_api
        .record_transaction(new_transaction("TX-OUT", march, 4_000), vec![new_line("COURSE-101", "uni-x", 1, 4_000)])
        .await
        .unwrap();
    tx_api.mark_registered(&TransactionId("TX-OUT".to_string()), "FAC-0101").await.unwrap();
    // In the period but never registered
    tx_api
        .record_transaction(new_transaction("TX-NEW", feb(11), 2_000), vec![new_line("COURSE-101", "uni-x", 1, 2_000)])
        .await
        .unwrap();

    let lines = db.fetch_billable_lines(feb(1), feb(29)).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].transaction_id.as_str(), "TX-IN");

    let report = split_api.execute(ReportingPeriod::new(feb(1), feb(29))).await.unwrap();
    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[0].partner_amount.value(), 6_000);
    assert_eq!(report.entries[0].platform_amount.value(), 4_000);
}
