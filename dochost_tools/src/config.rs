use log::*;
use sbo_common::Secret;

#[derive(Debug, Clone, Default)]
pub struct DocumentHostConfig {
    pub receipt_base_url: String,
    pub invoice_base_url: String,
    pub access_token: Secret<String>,
}

impl DocumentHostConfig {
    pub fn new_from_env_or_default() -> Self {
        let receipt_base_url = std::env::var("SBO_DOCHOST_RECEIPT_URL").unwrap_or_else(|_| {
            warn!("SBO_DOCHOST_RECEIPT_URL not set, using (probably useless) default");
            "http://localhost:9000/receipts".to_string()
        });
        let invoice_base_url = std::env::var("SBO_DOCHOST_INVOICE_URL").unwrap_or_else(|_| {
            warn!("SBO_DOCHOST_INVOICE_URL not set, using (probably useless) default");
            "http://localhost:9000/invoices".to_string()
        });
        let access_token = Secret::new(std::env::var("SBO_DOCHOST_TOKEN").unwrap_or_else(|_| {
            warn!("SBO_DOCHOST_TOKEN not set, using (probably useless) default");
            "dochost_00000000".to_string()
        }));
        Self { receipt_base_url, invoice_base_url, access_token }
    }
}
