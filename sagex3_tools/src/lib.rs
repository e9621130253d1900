//! Sage X3 SOAP/XML protocol adapter.
//!
//! Sage X3 exposes its import/export engine through a single generic SOAP service (`CAdxWebServiceXmlCC`). Invoices
//! are registered by sending a `save` call whose `inputXml` parameter carries a `<PARAM>` document describing the
//! sales invoice object (`SIH`), and queried back with a `read` call. This crate builds those payloads from
//! transaction data, drives the HTTP exchange, and classifies the vendor's XML response.
mod api;
mod config;
mod error;
mod payload;
mod response;

pub use api::SageX3Api;
pub use config::SageX3Config;
pub use error::SageX3Error;
pub use payload::{build_input_xml, build_key_xml, soap_envelope, InvoiceLine, InvoicePayload, PayerDetails, SoapOperation};
pub use response::{parse_response, InvoiceOutcome, SageMessage, SageResponse};
