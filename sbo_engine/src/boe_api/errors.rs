use thiserror::Error;

use crate::traits::BackOfficeError;

#[derive(Debug, Error)]
pub enum SplitError {
    #[error("Backend error: {0}")]
    Backend(#[from] BackOfficeError),
    #[error("Could not write the split export: {0}")]
    Export(String),
}

impl From<csv::Error> for SplitError {
    fn from(e: csv::Error) -> Self {
        SplitError::Export(e.to_string())
    }
}

impl From<std::io::Error> for SplitError {
    fn from(e: std::io::Error) -> Self {
        SplitError::Export(e.to_string())
    }
}
