use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::TransactionStatus;

/// Search criteria for transactions. Empty fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionQueryFilter {
    pub status: Option<TransactionStatus>,
    pub customer_code: Option<String>,
    /// Matches transactions that contain at least one line item for this organization.
    pub organization: Option<String>,
    pub currency: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl TransactionQueryFilter {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.customer_code.is_none()
            && self.organization.is_none()
            && self.currency.is_none()
            && self.since.is_none()
            && self.until.is_none()
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_customer_code<S: Into<String>>(mut self, code: S) -> Self {
        self.customer_code = Some(code.into());
        self
    }

    pub fn with_organization<S: Into<String>>(mut self, organization: S) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }
}
