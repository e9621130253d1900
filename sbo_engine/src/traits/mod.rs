//! Interface contracts of the back-office storage backends.
//!
//! The engine talks to its database exclusively through these traits, so the REST server and the registration worker
//! never care which backend is wired in.
//!
//! * [`BackOfficeDatabase`] covers transaction recording, status transitions and receipt bookkeeping.
//! * [`RevenueShareManagement`] covers the revenue-share configuration records and the period queries the split
//!   engine runs on.
mod back_office_database;
mod revenue_share_management;

pub use back_office_database::{BackOfficeDatabase, BackOfficeError};
pub use revenue_share_management::RevenueShareManagement;
