use thiserror::Error;

#[derive(Debug, Error)]
pub enum SageX3Error {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid SOAP request: {0}")]
    RequestError(String),
    #[error("Sage X3 call failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Sage X3 returned a SOAP fault: {0}")]
    SoapFault(String),
    #[error("XML parsing error: {0}")]
    XmlParse(String),
    #[error("Missing required field in Sage X3 response: {0}")]
    MissingField(String),
    #[error("Unexpected Sage X3 response: {0}")]
    InvalidResponse(String),
}

impl From<quick_xml::Error> for SageX3Error {
    fn from(e: quick_xml::Error) -> Self {
        SageX3Error::XmlParse(e.to_string())
    }
}
