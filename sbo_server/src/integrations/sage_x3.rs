//! Glue between the transaction store and the Sage X3 web service.
//!
//! Registration follows a send-then-check pattern. A `save` call either succeeds (Sage assigns a document number),
//! or fails. When the failure says the invoice already exists, a `read` call recovers the document number that was
//! assigned the first time round. Any other failure marks the transaction as `Failed` so it can be fixed and retried.
use log::*;
use sagex3_tools::{InvoiceLine, InvoiceOutcome, InvoicePayload, PayerDetails, SageX3Api};
use sbo_engine::{
    db_types::{LineItem, Transaction, TransactionId, TransactionStatus},
    traits::BackOfficeDatabase,
    TransactionApi,
};

use crate::{data_objects::RegistrationResult, errors::ServerError};

pub struct InvoiceRegistrar<B> {
    transactions: TransactionApi<B>,
    sage: SageX3Api,
}

impl<B> InvoiceRegistrar<B> {
    pub fn new(transactions: TransactionApi<B>, sage: SageX3Api) -> Self {
        Self { transactions, sage }
    }
}

impl<B> InvoiceRegistrar<B>
where B: BackOfficeDatabase
{
    /// Registers the transaction as a sales invoice in Sage X3 and records the outcome.
    ///
    /// Transactions that already carry a document number are not sent again.
    pub async fn register(&self, reference: &TransactionId) -> Result<RegistrationResult, ServerError> {
        let transaction = self
            .transactions
            .transaction(reference)
            .await?
            .ok_or_else(|| ServerError::NoRecordFound(format!("Transaction {reference}")))?;
        if transaction.document_number.is_some() {
            debug!("🧾️ Transaction [{reference}] already has a document number, skipping registration");
            return Ok(RegistrationResult {
                reference: reference.clone(),
                status: transaction.status,
                document_number: transaction.document_number,
                messages: Vec::new(),
            });
        }
        let lines = self.transactions.line_items(reference).await?;
        let payload = invoice_payload(&transaction, &lines);
        self.transactions.mark_submitted(reference).await?;
        let outcome = match self.sage.register_invoice(&payload).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.transactions.mark_failed(reference).await?;
                return Err(e.into());
            },
        };
        match outcome {
            InvoiceOutcome::Registered { document_number } => {
                self.transactions.mark_registered(reference, &document_number).await?;
                Ok(RegistrationResult {
                    reference: reference.clone(),
                    status: TransactionStatus::Registered,
                    document_number: Some(document_number),
                    messages: Vec::new(),
                })
            },
            InvoiceOutcome::Duplicate => {
                // Recover the number Sage assigned the first time round
                let document_number = self.sage.query_invoice(reference.as_str()).await?;
                self.transactions.mark_duplicate(reference, document_number.as_deref()).await?;
                Ok(RegistrationResult {
                    reference: reference.clone(),
                    status: TransactionStatus::Duplicate,
                    document_number,
                    messages: Vec::new(),
                })
            },
            InvoiceOutcome::Rejected { messages } => {
                self.transactions.mark_failed(reference).await?;
                Ok(RegistrationResult {
                    reference: reference.clone(),
                    status: TransactionStatus::Failed,
                    document_number: None,
                    messages,
                })
            },
        }
    }
}

/// Maps a stored transaction onto the Sage X3 invoice payload.
pub fn invoice_payload(transaction: &Transaction, lines: &[LineItem]) -> InvoicePayload {
    InvoicePayload {
        invoice_ref: transaction.transaction_id.to_string(),
        invoice_date: transaction.created_at.date_naive(),
        customer_code: transaction.customer_code.clone(),
        currency: transaction.currency.clone(),
        payer: PayerDetails {
            name: transaction.payer_name.clone(),
            address_line: transaction.address_line.clone(),
            postal_code: transaction.postal_code.clone(),
            city: transaction.city.clone(),
            country: transaction.country.clone(),
            vat_number: transaction.vat_number.clone(),
        },
        lines: lines
            .iter()
            .map(|line| InvoiceLine {
                product_id: line.product_id.clone(),
                description: line.description.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
                vat_rate_bps: line.vat_rate_bps,
            })
            .collect(),
    }
}

#[cfg(test)]
mod test {
    use chrono::{TimeZone, Utc};
    use sbo_common::Money;

    use super::*;

    #[test]
    fn payload_carries_all_transaction_fields() {
        let transaction = Transaction {
            id: 1,
            transaction_id: TransactionId("TX-2024-00042".to_string()),
            customer_code: "WEB001".to_string(),
            payer_name: "Ada Lovelace".to_string(),
            payer_email: "ada@example.com".to_string(),
            address_line: "12 Analytical Way".to_string(),
            postal_code: "75001".to_string(),
            city: "Paris".to_string(),
            country: "FR".to_string(),
            vat_number: Some("FR12345678901".to_string()),
            total_amount: Money::from(9900),
            total_vat: Money::from(1650),
            currency: "EUR".to_string(),
            status: TransactionStatus::New,
            document_number: None,
            created_at: Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap(),
        };
        let lines = vec![LineItem {
            id: 1,
            transaction_id: transaction.transaction_id.clone(),
            product_id: "COURSE-101".to_string(),
            description: "Intro course".to_string(),
            organization: "uni-x".to_string(),
            quantity: 2,
            unit_price: Money::from(4950),
            vat_rate_bps: 2000,
            amount: Money::from(9900),
        }];
        let payload = invoice_payload(&transaction, &lines);
        assert_eq!(payload.invoice_ref, "TX-2024-00042");
        assert_eq!(payload.invoice_date.to_string(), "2024-03-15");
        assert_eq!(payload.customer_code, "WEB001");
        assert_eq!(payload.payer.vat_number.as_deref(), Some("FR12345678901"));
        assert_eq!(payload.lines.len(), 1);
        assert_eq!(payload.lines[0].product_id, "COURSE-101");
        assert_eq!(payload.lines[0].quantity, 2);
    }
}
