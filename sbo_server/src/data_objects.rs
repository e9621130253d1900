use std::fmt::Display;

use chrono::{DateTime, NaiveDate, Utc};
use sbo_engine::db_types::{LineItem, NewLineItem, NewTransaction, Transaction, TransactionId, TransactionStatus};
use serde::{Deserialize, Serialize};

/// The body of a `POST /api/transactions` request: the transaction header plus its line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionSubmission {
    pub transaction: NewTransaction,
    #[serde(default)]
    pub line_items: Vec<NewLineItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionWithLines {
    pub transaction: Transaction,
    pub line_items: Vec<LineItem>,
}

/// The outcome of a registration attempt, as reported back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationResult {
    pub reference: TransactionId,
    pub status: TransactionStatus,
    pub document_number: Option<String>,
    /// Vendor messages, present when Sage rejected the invoice.
    #[serde(default)]
    pub messages: Vec<String>,
}

/// A receipt or invoice download link, combined with the Sage document it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResult {
    pub document_number: String,
    pub url: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// The body of a `POST /api/splits/export` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitExportRequest {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// File name of the export inside the configured export directory. A name is derived from the period when
    /// omitted.
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResult {
    pub path: String,
    pub entries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}
