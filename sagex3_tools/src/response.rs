use std::collections::HashMap;

use quick_xml::{events::Event, Reader};
use serde::{Deserialize, Serialize};

use crate::error::SageX3Error;

/// Parsed form of a `CAdxWebServiceXmlCC` response envelope.
///
/// The vendor wraps everything in a `xxxReturn` structure holding an integer `status` (1 = success), zero or more
/// `messages` entries and a `resultXml` string that contains a second, escaped XML document with the object's fields.
#[derive(Debug, Clone, Default)]
pub struct SageResponse {
    pub status: i32,
    pub messages: Vec<SageMessage>,
    /// `FLD NAME => value` pairs extracted from the inner result document.
    pub fields: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SageMessage {
    /// Vendor message severity. 1 = info, 2 = warning, 3 = error.
    pub level: i32,
    pub text: String,
}

/// Classification of a registration attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum InvoiceOutcome {
    /// Sage accepted the invoice and assigned it a document number (the NUM field).
    Registered { document_number: String },
    /// Sage refused the save because an invoice with the same reference already exists. This is a normal outcome;
    /// the caller recovers the document number with a `read` call.
    Duplicate,
    /// Sage rejected the invoice for any other reason.
    Rejected { messages: Vec<String> },
}

impl SageResponse {
    pub fn is_success(&self) -> bool {
        self.status == 1
    }

    /// Classifies a `save` response. A success without a NUM field violates the vendor contract.
    pub fn outcome(&self) -> Result<InvoiceOutcome, SageX3Error> {
        if self.is_success() {
            let document_number = self
                .fields
                .get("NUM")
                .filter(|num| !num.is_empty())
                .cloned()
                .ok_or_else(|| SageX3Error::MissingField("NUM".to_string()))?;
            return Ok(InvoiceOutcome::Registered { document_number });
        }
        if self.messages.iter().any(|m| is_duplicate_message(&m.text)) {
            return Ok(InvoiceOutcome::Duplicate);
        }
        Ok(InvoiceOutcome::Rejected { messages: self.messages.iter().map(|m| m.text.clone()).collect() })
    }

    pub fn document_number(&self) -> Option<&str> {
        self.fields.get("NUM").map(|s| s.as_str()).filter(|s| !s.is_empty())
    }
}

// Sage reports duplicates as a plain error message. The wording depends on the folder language, so both the English
// and French variants are recognised.
fn is_duplicate_message(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("already exist") || lower.contains("existe déjà") || lower.contains("existe deja")
}

/// Parses the outer SOAP envelope and the escaped inner result document in one go.
pub fn parse_response(xml: &str) -> Result<SageResponse, SageX3Error> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut response = SageResponse::default();
    let mut status_seen = false;
    let mut result_xml = None;
    let mut fault = None;
    let mut path: Vec<String> = Vec::new();
    let mut current_message = SageMessage::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                path.push(name);
            },
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if name == "messages" {
                    response.messages.push(std::mem::take(&mut current_message));
                }
                path.pop();
            },
            Event::Text(e) => {
                let text = e.unescape()?.into_owned();
                match path.last().map(|s| s.as_str()) {
                    Some("status") => {
                        response.status = text
                            .trim()
                            .parse()
                            .map_err(|_| SageX3Error::InvalidResponse(format!("non-numeric status: {text}")))?;
                        status_seen = true;
                    },
                    Some("type") if path.iter().any(|p| p == "messages") => {
                        current_message.level = text.trim().parse().unwrap_or(0);
                    },
                    Some("message") => current_message.text = text,
                    Some("resultXml") => result_xml = Some(text),
                    Some("faultstring") => fault = Some(text),
                    _ => {},
                }
            },
            Event::Eof => break,
            _ => {},
        }
    }

    // The web service reports errors in the adapter itself (bad pool, bad credentials) as a SOAP fault instead of a
    // saveReturn structure.
    if let Some(fault) = fault {
        return Err(SageX3Error::SoapFault(fault));
    }
    if !status_seen {
        return Err(SageX3Error::MissingField("status".to_string()));
    }
    if let Some(inner) = result_xml {
        response.fields = parse_result_fields(&inner)?;
    }
    Ok(response)
}

/// Extracts `FLD NAME => value` pairs from the inner result document.
fn parse_result_fields(xml: &str) -> Result<HashMap<String, String>, SageX3Error> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut fields = HashMap::new();
    let mut current_fld = None;
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"FLD" => {
                current_fld = e
                    .try_get_attribute("NAME")
                    .map_err(quick_xml::Error::from)?
                    .map(|a| a.unescape_value().map(|v| v.into_owned()))
                    .transpose()?;
            },
            Event::Empty(e) if e.local_name().as_ref() == b"FLD" => {
                if let Some(name) = e.try_get_attribute("NAME").map_err(quick_xml::Error::from)? {
                    fields.insert(name.unescape_value()?.into_owned(), String::new());
                }
            },
            Event::Text(e) => {
                if let Some(name) = current_fld.take() {
                    fields.insert(name, e.unescape()?.into_owned());
                }
            },
            Event::End(e) if e.local_name().as_ref() == b"FLD" => {
                // A FLD that closed without text is an empty value
                if let Some(name) = current_fld.take() {
                    fields.insert(name, String::new());
                }
            },
            Event::Eof => break,
            _ => {},
        }
    }
    Ok(fields)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_successful_save() {
        let xml = include_str!("./test_assets/save_ok.xml");
        let response = parse_response(xml).unwrap();
        assert_eq!(response.status, 1);
        assert!(response.messages.is_empty());
        assert_eq!(response.document_number(), Some("FC00123"));
        assert_eq!(response.outcome().unwrap(), InvoiceOutcome::Registered {
            document_number: "FC00123".to_string()
        });
    }

    #[test]
    fn detects_duplicate_invoice() {
        let xml = include_str!("./test_assets/save_duplicate.xml");
        let response = parse_response(xml).unwrap();
        assert_eq!(response.status, 0);
        assert_eq!(response.messages.len(), 1);
        assert_eq!(response.messages[0].level, 3);
        assert_eq!(response.outcome().unwrap(), InvoiceOutcome::Duplicate);
    }

    #[test]
    fn rejection_carries_vendor_messages() {
        let xml = include_str!("./test_assets/save_rejected.xml");
        let response = parse_response(xml).unwrap();
        match response.outcome().unwrap() {
            InvoiceOutcome::Rejected { messages } => {
                assert_eq!(messages.len(), 2);
                assert!(messages[0].contains("BPCINV"));
            },
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn success_without_document_number_is_a_contract_violation() {
        let xml = include_str!("./test_assets/save_no_num.xml");
        let response = parse_response(xml).unwrap();
        assert!(matches!(response.outcome(), Err(SageX3Error::MissingField(f)) if f == "NUM"));
    }

    #[test]
    fn soap_faults_keep_the_fault_string() {
        let xml = include_str!("./test_assets/soap_fault.xml");
        assert!(matches!(parse_response(xml), Err(SageX3Error::SoapFault(m)) if m.contains("WSPOOL")));
    }

    #[test]
    fn missing_status_is_rejected() {
        let xml = "<Envelope><Body><saveResponse></saveResponse></Body></Envelope>";
        assert!(matches!(parse_response(xml), Err(SageX3Error::MissingField(f)) if f == "status"));
    }
}
