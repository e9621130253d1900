use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::{config::DocumentHostConfig, error::DocumentHostError};

/// A short-lived download link returned by the document host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentLink {
    pub url: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct DocumentHostApi {
    config: DocumentHostConfig,
    client: Arc<Client>,
}

impl DocumentHostApi {
    pub fn new(config: DocumentHostConfig) -> Result<Self, DocumentHostError> {
        let mut headers = HeaderMap::with_capacity(2);
        let token = format!("Bearer {}", config.access_token.reveal());
        let val = HeaderValue::from_str(&token).map_err(|e| DocumentHostError::Initialization(e.to_string()))?;
        headers.insert("Authorization", val);
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| DocumentHostError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    /// Fetches the receipt download link for a registered document.
    pub async fn receipt_link(&self, document_number: &str) -> Result<DocumentLink, DocumentHostError> {
        self.fetch_link(&self.config.receipt_base_url, document_number).await
    }

    /// Fetches the invoice download link for a registered document.
    pub async fn invoice_link(&self, document_number: &str) -> Result<DocumentLink, DocumentHostError> {
        self.fetch_link(&self.config.invoice_base_url, document_number).await
    }

    async fn fetch_link(&self, base_url: &str, document_number: &str) -> Result<DocumentLink, DocumentHostError> {
        let url = format!("{base_url}/{document_number}");
        debug!("Fetching document link: {url}");
        let response =
            self.client.get(&url).send().await.map_err(|e| DocumentHostError::RequestError(e.to_string()))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(DocumentHostError::NotFound(document_number.to_string()));
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| DocumentHostError::RequestError(e.to_string()))?;
            return Err(DocumentHostError::QueryError { status, message });
        }
        let link = response.json::<DocumentLink>().await.map_err(|e| DocumentHostError::JsonError(e.to_string()))?;
        info!("Fetched document link for {document_number}");
        Ok(link)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn deserialize_document_link() {
        let body = r#"{"url": "https://docs.example.com/dl/FC00123.pdf?sig=abc", "expires_at": "2024-03-15T12:00:00Z"}"#;
        let link: DocumentLink = serde_json::from_str(body).unwrap();
        assert_eq!(link.url, "https://docs.example.com/dl/FC00123.pdf?sig=abc");
        assert_eq!(link.expires_at.unwrap().to_rfc3339(), "2024-03-15T12:00:00+00:00");
    }

    #[test]
    fn expiry_is_optional() {
        let link: DocumentLink = serde_json::from_str(r#"{"url": "https://docs.example.com/dl/x.pdf"}"#).unwrap();
        assert!(link.expires_at.is_none());
    }
}
