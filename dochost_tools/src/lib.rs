//! Clients for the external document host.
//!
//! The host serves registered documents (receipts and invoices) as downloadable files. For a given Sage document
//! number it returns a short-lived download link. Two endpoints exist, one per document kind, both with the same
//! narrow contract: `GET {base}/{document_number}` with a bearer token, returning a JSON body.
mod api;
mod config;
mod error;

pub use api::{DocumentHostApi, DocumentLink};
pub use config::DocumentHostConfig;
pub use error::DocumentHostError;
