//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. For this reason, any long, non-cpu-bound operation (e.g. I/O,
//! database operations, calls to Sage) should be expressed as futures or asynchronous functions. Async handlers get
//! executed concurrently by worker threads and thus don't block execution.
use actix_web::{get, http::StatusCode, web, HttpResponse, Responder};
use dochost_tools::DocumentHostApi;
use log::*;
use sbo_engine::{
    db_types::{NewRevenueShareConfig, TransactionId},
    split_objects::ReportingPeriod,
    traits::{BackOfficeDatabase, RevenueShareManagement},
    transaction_objects::TransactionQueryFilter,
    SplitApi,
    TransactionApi,
};

use crate::{
    config::ServerConfig,
    data_objects::{DocumentResult, ExportResult, JsonResponse, SplitExportRequest, TransactionSubmission, TransactionWithLines},
    errors::ServerError,
    integrations::sage_x3::InvoiceRegistrar,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Transactions  ----------------------------------------------------

route!(record_transaction => Post "/transactions" impl BackOfficeDatabase);
/// Route handler for the transaction submission endpoint
///
/// Records a transaction and its line items. Submissions are idempotent on the transaction reference: re-submitting
/// an existing reference returns the stored record with a 200 instead of a 201.
pub async fn record_transaction<B: BackOfficeDatabase>(
    body: web::Json<TransactionSubmission>,
    api: web::Data<TransactionApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let TransactionSubmission { transaction, line_items } = body.into_inner();
    debug!("💻️ POST transaction [{}] with {} lines", transaction.transaction_id, line_items.len());
    let (transaction, inserted) = api.record_transaction(transaction, line_items).await?;
    let status = if inserted { StatusCode::CREATED } else { StatusCode::OK };
    Ok(HttpResponse::build(status).json(transaction))
}

route!(search_transactions => Get "/transactions" impl BackOfficeDatabase);
pub async fn search_transactions<B: BackOfficeDatabase>(
    query: web::Query<TransactionQueryFilter>,
    api: web::Data<TransactionApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET transactions search");
    let transactions = api.search(query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(transactions))
}

route!(transaction_by_reference => Get "/transactions/{reference}" impl BackOfficeDatabase);
pub async fn transaction_by_reference<B: BackOfficeDatabase>(
    path: web::Path<String>,
    api: web::Data<TransactionApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let reference = TransactionId(path.into_inner());
    debug!("💻️ GET transaction [{reference}]");
    let transaction = api
        .transaction(&reference)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Transaction {reference}")))?;
    let line_items = api.line_items(&reference).await?;
    Ok(HttpResponse::Ok().json(TransactionWithLines { transaction, line_items }))
}

route!(register_transaction => Post "/transactions/{reference}/register" impl BackOfficeDatabase);
/// Route handler for on-demand invoice registration
///
/// Sends the transaction to Sage X3 immediately rather than waiting for the registration worker to pick it up.
pub async fn register_transaction<B: BackOfficeDatabase>(
    path: web::Path<String>,
    registrar: web::Data<InvoiceRegistrar<B>>,
) -> Result<HttpResponse, ServerError> {
    let reference = TransactionId(path.into_inner());
    debug!("💻️ POST register [{reference}]");
    let result = registrar.register(&reference).await?;
    Ok(HttpResponse::Ok().json(result))
}

//----------------------------------------------   Documents  ----------------------------------------------------

route!(transaction_receipt => Get "/transactions/{reference}/receipt" impl BackOfficeDatabase);
pub async fn transaction_receipt<B: BackOfficeDatabase>(
    path: web::Path<String>,
    api: web::Data<TransactionApi<B>>,
    documents: web::Data<DocumentHostApi>,
) -> Result<HttpResponse, ServerError> {
    let reference = TransactionId(path.into_inner());
    debug!("💻️ GET receipt for [{reference}]");
    let receipt = api
        .receipt(&reference)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("No receipt for transaction {reference}")))?;
    let link = documents.receipt_link(&receipt.document_number).await?;
    Ok(HttpResponse::Ok().json(DocumentResult {
        document_number: receipt.document_number,
        url: link.url,
        expires_at: link.expires_at,
    }))
}

route!(transaction_invoice => Get "/transactions/{reference}/invoice" impl BackOfficeDatabase);
pub async fn transaction_invoice<B: BackOfficeDatabase>(
    path: web::Path<String>,
    api: web::Data<TransactionApi<B>>,
    documents: web::Data<DocumentHostApi>,
) -> Result<HttpResponse, ServerError> {
    let reference = TransactionId(path.into_inner());
    debug!("💻️ GET invoice for [{reference}]");
    let receipt = api
        .receipt(&reference)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("No registered invoice for transaction {reference}")))?;
    let link = documents.invoice_link(&receipt.document_number).await?;
    Ok(HttpResponse::Ok().json(DocumentResult {
        document_number: receipt.document_number,
        url: link.url,
        expires_at: link.expires_at,
    }))
}

//----------------------------------------------   Revenue shares  ----------------------------------------------------

route!(add_share_config => Post "/share_configs" impl RevenueShareManagement);
pub async fn add_share_config<B: RevenueShareManagement>(
    body: web::Json<NewRevenueShareConfig>,
    api: web::Data<SplitApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let config = api.add_config(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(config))
}

route!(share_configs => Get "/share_configs" impl RevenueShareManagement);
pub async fn share_configs<B: RevenueShareManagement>(
    api: web::Data<SplitApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let configs = api.configs().await?;
    Ok(HttpResponse::Ok().json(configs))
}

route!(delete_share_config => Delete "/share_configs/{id}" impl RevenueShareManagement);
pub async fn delete_share_config<B: RevenueShareManagement>(
    path: web::Path<i64>,
    api: web::Data<SplitApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    api.delete_config(id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Share config {id} deleted"))))
}

route!(run_split => Post "/splits" impl RevenueShareManagement);
/// Route handler for split runs
///
/// Computes the revenue split over the given period and returns the full report, without writing anything to disk.
pub async fn run_split<B: RevenueShareManagement>(
    body: web::Json<ReportingPeriod>,
    api: web::Data<SplitApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let period = body.into_inner();
    debug!("💻️ POST split run over {} - {}", period.start, period.end);
    let report = api.execute(period).await?;
    Ok(HttpResponse::Ok().json(report))
}

route!(export_split => Post "/splits/export" impl RevenueShareManagement);
/// Route handler for split exports
///
/// Runs a split and writes the result as a CSV spreadsheet into the configured export directory.
pub async fn export_split<B: RevenueShareManagement>(
    body: web::Json<SplitExportRequest>,
    api: web::Data<SplitApi<B>>,
    config: web::Data<ServerConfig>,
) -> Result<HttpResponse, ServerError> {
    let SplitExportRequest { start, end, filename } = body.into_inner();
    let filename = filename.unwrap_or_else(|| format!("split_{start}_{end}.csv"));
    if filename.is_empty() || filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        return Err(ServerError::InvalidRequestBody(format!("{filename:?} is not a plain file name")));
    }
    std::fs::create_dir_all(&config.export_dir)?;
    let path = config.export_dir.join(filename);
    debug!("💻️ POST split export over {start} - {end} to {}", path.display());
    let report = api.execute_and_export(ReportingPeriod::new(start, end), &path).await?;
    Ok(HttpResponse::Ok().json(ExportResult { path: path.display().to_string(), entries: report.entries.len() }))
}
