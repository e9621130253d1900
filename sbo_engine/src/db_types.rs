use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use sbo_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------    TransactionId     ---------------------------------------------------------
/// The business reference of a transaction, assigned by the storefront. This is the value Sage X3 receives as INVREF.
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct TransactionId(pub String);

impl FromStr for TransactionId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for TransactionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TransactionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------  TransactionStatus   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// The transaction has been recorded and is waiting to be sent to Sage X3.
    New,
    /// The transaction has been sent to Sage X3 and we are waiting for the outcome.
    Submitted,
    /// Sage X3 accepted the invoice and assigned a document number.
    Registered,
    /// Sage X3 reported that an invoice with this reference already exists.
    Duplicate,
    /// Sage X3 rejected the invoice. The registration can be retried after the data is fixed.
    Failed,
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::New => write!(f, "New"),
            TransactionStatus::Submitted => write!(f, "Submitted"),
            TransactionStatus::Registered => write!(f, "Registered"),
            TransactionStatus::Duplicate => write!(f, "Duplicate"),
            TransactionStatus::Failed => write!(f, "Failed"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid transaction status: {0}")]
pub struct StatusConversionError(String);

impl FromStr for TransactionStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "New" => Ok(Self::New),
            "Submitted" => Ok(Self::Submitted),
            "Registered" => Ok(Self::Registered),
            "Duplicate" => Ok(Self::Duplicate),
            "Failed" => Ok(Self::Failed),
            s => Err(StatusConversionError(s.to_string())),
        }
    }
}

//--------------------------------------     Transaction      ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Transaction {
    pub id: i64,
    pub transaction_id: TransactionId,
    /// The Sage customer code (BPCINV) the invoice is registered under.
    pub customer_code: String,
    pub payer_name: String,
    pub payer_email: String,
    pub address_line: String,
    pub postal_code: String,
    pub city: String,
    pub country: String,
    pub vat_number: Option<String>,
    pub total_amount: Money,
    pub total_vat: Money,
    pub currency: String,
    pub status: TransactionStatus,
    /// The Sage X3 document number, once the invoice has been registered.
    pub document_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------    NewTransaction    ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub transaction_id: TransactionId,
    pub customer_code: String,
    pub payer_name: String,
    pub payer_email: String,
    #[serde(default)]
    pub address_line: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub vat_number: Option<String>,
    pub total_amount: Money,
    #[serde(default)]
    pub total_vat: Money,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------       LineItem       ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LineItem {
    pub id: i64,
    pub transaction_id: TransactionId,
    /// Product (course) identifier, used both in the Sage payload (ITMREF) and for revenue-split matching.
    pub product_id: String,
    pub description: String,
    /// Short name of the partner organization that owns the product.
    pub organization: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub vat_rate_bps: i64,
    /// Total line amount (quantity x unit price), stored explicitly so split maths never re-derives it.
    pub amount: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLineItem {
    pub product_id: String,
    #[serde(default)]
    pub description: String,
    pub organization: String,
    pub quantity: i64,
    pub unit_price: Money,
    #[serde(default)]
    pub vat_rate_bps: i64,
    pub amount: Money,
}

//--------------------------------------       Receipt        ---------------------------------------------------------
/// Links a transaction to the Sage X3 document that was registered for it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Receipt {
    pub id: i64,
    pub transaction_id: TransactionId,
    pub document_number: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------  RevenueShareConfig  ---------------------------------------------------------
/// A time-bounded revenue share agreement: within [start_date, end_date], sales of `product_id` give the partner
/// organization `partner_bps` basis points of every line amount; the remainder goes to the platform operator.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RevenueShareConfig {
    pub id: i64,
    pub organization: String,
    pub product_id: String,
    pub partner_bps: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl RevenueShareConfig {
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRevenueShareConfig {
    pub organization: String,
    pub product_id: String,
    pub partner_bps: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}
