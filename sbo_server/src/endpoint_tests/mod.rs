use actix_web::{
    dev::Service,
    http::StatusCode,
    test::{self, TestRequest},
    web,
    App,
};
use chrono::{TimeZone, Utc};
use futures::future::{ok, Either};
use sbo_common::{Money, Secret};
use sbo_engine::{
    db_types::{NewLineItem, NewTransaction, TransactionId},
    SplitApi,
    SqliteDatabase,
    TransactionApi,
};
use serde_json::json;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    routes::{
        health,
        AddShareConfigRoute,
        DeleteShareConfigRoute,
        ExportSplitRoute,
        RecordTransactionRoute,
        RunSplitRoute,
        SearchTransactionsRoute,
        ShareConfigsRoute,
        TransactionByReferenceRoute,
    },
};

async fn new_db() -> SqliteDatabase {
    SqliteDatabase::new_with_url("sqlite::memory:", 1).await.expect("Error creating in-memory database")
}

fn submission(reference: &str) -> serde_json::Value {
    let transaction = NewTransaction {
        transaction_id: TransactionId(reference.to_string()),
        customer_code: "WEBSHOP".to_string(),
        payer_name: "Ada Lovelace".to_string(),
        payer_email: "ada@example.com".to_string(),
        address_line: "12 Analytical Way".to_string(),
        postal_code: "75001".to_string(),
        city: "Paris".to_string(),
        country: "FR".to_string(),
        vat_number: None,
        total_amount: Money::from(9900),
        total_vat: Money::from(1650),
        currency: "EUR".to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap(),
    };
    let line = NewLineItem {
        product_id: "COURSE-101".to_string(),
        description: "Intro course".to_string(),
        organization: "uni-x".to_string(),
        quantity: 2,
        unit_price: Money::from(4950),
        vat_rate_bps: 2000,
        amount: Money::from(9900),
    };
    json!({ "transaction": transaction, "line_items": [line] })
}

#[actix_web::test]
async fn health_check() {
    let app = test::init_service(App::new().service(health)).await;
    let req = TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn record_and_fetch_transaction() {
    let db = new_db().await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(TransactionApi::new(db)))
            .service(RecordTransactionRoute::<SqliteDatabase>::new())
            .service(TransactionByReferenceRoute::<SqliteDatabase>::new())
            .service(SearchTransactionsRoute::<SqliteDatabase>::new()),
    )
    .await;

    let req = TestRequest::post().uri("/transactions").set_json(submission("TX-100")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // Idempotent re-submission
    let req = TestRequest::post().uri("/transactions").set_json(submission("TX-100")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = TestRequest::get().uri("/transactions/TX-100").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["transaction"]["transaction_id"], "TX-100");
    assert_eq!(body["transaction"]["status"], "New");
    assert_eq!(body["line_items"][0]["organization"], "uni-x");

    let req = TestRequest::get().uri("/transactions/TX-999").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = TestRequest::get().uri("/transactions?status=New").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn inconsistent_submission_is_a_bad_request() {
    let db = new_db().await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(TransactionApi::new(db)))
            .service(RecordTransactionRoute::<SqliteDatabase>::new()),
    )
    .await;
    let mut body = submission("TX-101");
    body["line_items"][0]["amount"] = json!(1234);
    let req = TestRequest::post().uri("/transactions").set_json(body).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn share_config_endpoints() {
    let db = new_db().await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(SplitApi::new(db)))
            .service(AddShareConfigRoute::<SqliteDatabase>::new())
            .service(ShareConfigsRoute::<SqliteDatabase>::new())
            .service(DeleteShareConfigRoute::<SqliteDatabase>::new())
            .service(RunSplitRoute::<SqliteDatabase>::new()),
    )
    .await;

    let config = json!({
        "organization": "uni-x",
        "product_id": "COURSE-101",
        "partner_bps": 7000,
        "start_date": "2024-01-01",
        "end_date": "2024-12-31"
    });
    let req = TestRequest::post().uri("/share_configs").set_json(&config).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // Out of range share
    let mut bad = config.clone();
    bad["partner_bps"] = json!(10_001);
    let req = TestRequest::post().uri("/share_configs").set_json(&bad).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = TestRequest::get().uri("/share_configs").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let configs = body.as_array().unwrap();
    assert_eq!(configs.len(), 1);
    let id = configs[0]["id"].as_i64().unwrap();

    // Empty period still returns a well-formed report
    let req = TestRequest::post()
        .uri("/splits")
        .set_json(json!({ "start": "2024-02-01", "end": "2024-02-29" }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["entries"].as_array().unwrap().len(), 0);

    let req = TestRequest::delete().uri(&format!("/share_configs/{id}")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = TestRequest::delete().uri(&format!("/share_configs/{id}")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn split_export_only_accepts_plain_file_names() {
    let db = new_db().await;
    let config = ServerConfig {
        export_dir: std::env::temp_dir().join("sbo_export_endpoint_tests"),
        ..Default::default()
    };
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(SplitApi::new(db)))
            .app_data(web::Data::new(config))
            .service(ExportSplitRoute::<SqliteDatabase>::new()),
    )
    .await;

    for name in ["..", "../report.csv", "sub/report.csv", "sub\\report.csv", ""] {
        let req = TestRequest::post()
            .uri("/splits/export")
            .set_json(json!({ "start": "2024-02-01", "end": "2024-02-29", "filename": name }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "filename {name:?} should be rejected");
    }

    let req = TestRequest::post()
        .uri("/splits/export")
        .set_json(json!({ "start": "2024-02-01", "end": "2024-02-29", "filename": "report.csv" }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["entries"].as_u64(), Some(0));
    assert!(body["path"].as_str().unwrap().ends_with("report.csv"));
}

#[actix_web::test]
async fn api_key_guard_rejects_bad_keys() {
    let db = new_db().await;
    let api_key = Some(Secret::new("sekrit".to_string()));
    let app = test::init_service(
        App::new().app_data(web::Data::new(TransactionApi::new(db))).service(
            web::scope("/api")
                .wrap_fn(move |req, srv| {
                    let authorized = match &api_key {
                        Some(key) => req
                            .headers()
                            .get("sbo-api-key")
                            .and_then(|v| v.to_str().ok())
                            .map(|v| v == key.reveal())
                            .unwrap_or(false),
                        None => true,
                    };
                    if authorized {
                        Either::Left(srv.call(req))
                    } else {
                        let err = ServerError::AuthenticationError("Invalid or missing API key".to_string());
                        Either::Right(ok(req.error_response(err)))
                    }
                })
                .service(SearchTransactionsRoute::<SqliteDatabase>::new()),
        ),
    )
    .await;

    let req = TestRequest::get().uri("/api/transactions").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = TestRequest::get().uri("/api/transactions").insert_header(("sbo-api-key", "wrong")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = TestRequest::get().uri("/api/transactions").insert_header(("sbo-api-key", "sekrit")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn split_run_validates_the_period() {
    let db = new_db().await;
    let app = test::init_service(
        App::new().app_data(web::Data::new(SplitApi::new(db))).service(RunSplitRoute::<SqliteDatabase>::new()),
    )
    .await;
    let req = TestRequest::post()
        .uri("/splits")
        .set_json(json!({ "start": "2024-03-01", "end": "2024-02-01" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
