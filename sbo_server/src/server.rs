use std::time::Duration;

use actix_web::{
    dev::{Server, Service},
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    HttpServer,
};
use dochost_tools::DocumentHostApi;
use futures::future::{ok, Either};
use log::warn;
use sagex3_tools::SageX3Api;
use sbo_engine::{SplitApi, SqliteDatabase, TransactionApi};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::sage_x3::InvoiceRegistrar,
    registration_worker::start_registration_worker,
    routes::{
        health,
        AddShareConfigRoute,
        DeleteShareConfigRoute,
        ExportSplitRoute,
        RecordTransactionRoute,
        RegisterTransactionRoute,
        RunSplitRoute,
        SearchTransactionsRoute,
        ShareConfigsRoute,
        TransactionByReferenceRoute,
        TransactionInvoiceRoute,
        TransactionReceiptRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    start_registration_worker(
        db.clone(),
        config.sage_config.clone(),
        config.registration_interval,
        config.registration_batch,
    );
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let sage = SageX3Api::new(config.sage_config.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let documents =
        DocumentHostApi::new(config.dochost_config.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let transactions_api = TransactionApi::new(db.clone());
        let splits_api = SplitApi::new(db.clone());
        let registrar = InvoiceRegistrar::new(TransactionApi::new(db.clone()), sage.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("sbo::access_log"))
            .app_data(web::Data::new(transactions_api))
            .app_data(web::Data::new(splits_api))
            .app_data(web::Data::new(registrar))
            .app_data(web::Data::new(documents.clone()))
            .app_data(web::Data::new(config.clone()));
        let api_key = config.api_key.clone();
        let api_scope = web::scope("/api")
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
                    warn!("💻️ Rejecting API request without a valid key");
                    let err = ServerError::AuthenticationError("Invalid or missing API key".to_string());
                    Either::Right(ok(req.error_response(err)))
                }
            })
            .service(RecordTransactionRoute::<SqliteDatabase>::new())
            .service(SearchTransactionsRoute::<SqliteDatabase>::new())
            .service(TransactionByReferenceRoute::<SqliteDatabase>::new())
            .service(RegisterTransactionRoute::<SqliteDatabase>::new())
            .service(TransactionReceiptRoute::<SqliteDatabase>::new())
            .service(TransactionInvoiceRoute::<SqliteDatabase>::new())
            .service(AddShareConfigRoute::<SqliteDatabase>::new())
            .service(ShareConfigsRoute::<SqliteDatabase>::new())
            .service(DeleteShareConfigRoute::<SqliteDatabase>::new())
            .service(RunSplitRoute::<SqliteDatabase>::new())
            .service(ExportSplitRoute::<SqliteDatabase>::new());
        app.service(health).service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
