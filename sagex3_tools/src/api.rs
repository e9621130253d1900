use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};

use crate::{
    config::SageX3Config,
    error::SageX3Error,
    payload::{build_input_xml, build_key_xml, soap_envelope, InvoicePayload, SoapOperation},
    response::{parse_response, InvoiceOutcome, SageResponse},
};

/// HTTP client for the Sage X3 generic web service.
#[derive(Clone)]
pub struct SageX3Api {
    config: SageX3Config,
    client: Arc<Client>,
}

impl SageX3Api {
    pub fn new(config: SageX3Config) -> Result<Self, SageX3Error> {
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert("Content-Type", HeaderValue::from_static("text/xml; charset=utf-8"));
        let client =
            Client::builder().default_headers(headers).build().map_err(|e| SageX3Error::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    /// Sends one SOAP call and parses the vendor response. Transport and HTTP-level failures are errors; vendor-level
    /// failures (status 0) are reported inside the returned [`SageResponse`].
    pub async fn call(&self, op: SoapOperation, inner_xml: &str) -> Result<SageResponse, SageX3Error> {
        let envelope = soap_envelope(op, &self.config, inner_xml);
        trace!("Sending Sage X3 {} call: {envelope}", op.name());
        let response = self
            .client
            .post(&self.config.endpoint)
            .basic_auth(self.config.username.reveal(), Some(self.config.password.reveal()))
            .header("SOAPAction", op.name())
            .body(envelope)
            .send()
            .await
            .map_err(|e| SageX3Error::RequestError(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| SageX3Error::RequestError(e.to_string()))?;
            return Err(SageX3Error::QueryError { status, message });
        }
        let body = response.text().await.map_err(|e| SageX3Error::RequestError(e.to_string()))?;
        trace!("Sage X3 {} response: {body}", op.name());
        parse_response(&body)
    }

    /// Registers an invoice with a `save` call and classifies the outcome.
    pub async fn register_invoice(&self, payload: &InvoicePayload) -> Result<InvoiceOutcome, SageX3Error> {
        let inner = build_input_xml(payload, &self.config)?;
        debug!("Registering invoice [{}] with Sage X3", payload.invoice_ref);
        let response = self.call(SoapOperation::Save, &inner).await?;
        let outcome = response.outcome()?;
        match &outcome {
            InvoiceOutcome::Registered { document_number } => {
                info!("Invoice [{}] registered as document {document_number}", payload.invoice_ref)
            },
            InvoiceOutcome::Duplicate => {
                info!("Invoice [{}] was already registered with Sage X3", payload.invoice_ref)
            },
            InvoiceOutcome::Rejected { messages } => {
                warn!("Sage X3 rejected invoice [{}]: {}", payload.invoice_ref, messages.join("; "))
            },
        }
        Ok(outcome)
    }

    /// Looks an invoice up by our reference with a `read` call. Returns the assigned document number, or `None` if
    /// Sage does not know the invoice.
    pub async fn query_invoice(&self, invoice_ref: &str) -> Result<Option<String>, SageX3Error> {
        let inner = build_key_xml(invoice_ref)?;
        debug!("Querying Sage X3 for invoice [{invoice_ref}]");
        let response = self.call(SoapOperation::Read, &inner).await?;
        if !response.is_success() {
            debug!("Sage X3 does not know invoice [{invoice_ref}]");
            return Ok(None);
        }
        Ok(response.document_number().map(|s| s.to_string()))
    }
}
