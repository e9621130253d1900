use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use dochost_tools::DocumentHostError;
use sagex3_tools::SageX3Error;
use sbo_engine::{traits::BackOfficeError, SplitError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Payload deserialization error")]
    CouldNotDeserializePayload,
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The request conflicts with the current record state. {0}")]
    Conflict(String),
    #[error("An upstream service call failed. {0}")]
    UpstreamError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::CouldNotDeserializePayload => StatusCode::BAD_REQUEST,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::UpstreamError(_) => StatusCode::BAD_GATEWAY,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<BackOfficeError> for ServerError {
    fn from(e: BackOfficeError) -> Self {
        match e {
            BackOfficeError::TransactionNotFound(_) => Self::NoRecordFound(e.to_string()),
            BackOfficeError::ShareConfigNotFound(_) => Self::NoRecordFound(e.to_string()),
            BackOfficeError::ValidationError(_) => Self::InvalidRequestBody(e.to_string()),
            BackOfficeError::IllegalStatusTransition(_) => Self::Conflict(e.to_string()),
            BackOfficeError::DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<SplitError> for ServerError {
    fn from(e: SplitError) -> Self {
        match e {
            SplitError::Backend(e) => e.into(),
            SplitError::Export(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<SageX3Error> for ServerError {
    fn from(e: SageX3Error) -> Self {
        Self::UpstreamError(e.to_string())
    }
}

impl From<DocumentHostError> for ServerError {
    fn from(e: DocumentHostError) -> Self {
        match e {
            DocumentHostError::NotFound(_) => Self::NoRecordFound(e.to_string()),
            _ => Self::UpstreamError(e.to_string()),
        }
    }
}
