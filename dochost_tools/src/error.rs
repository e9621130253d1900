use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentHostError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid request: {0}")]
    RequestError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("No document found for number {0}")]
    NotFound(String),
    #[error("Document host query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
}
