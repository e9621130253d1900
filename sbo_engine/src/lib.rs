//! Sage Back-Office Engine
//!
//! The back-office engine records e-commerce transactions, walks them through invoice registration in Sage X3, and
//! computes revenue splits between the platform operator and its partner organizations. This library contains the
//! core logic; it is storefront-agnostic.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@sqlite`]). You should never need to access the database directly.
//!    Instead, use the public API provided by the engine. The exception is the data types used in the database. These
//!    are defined in the [`db_types`] module and are public.
//! 2. The engine public API ([`mod@boe_api`]). [`TransactionApi`] manages transactions, their status transitions and
//!    receipts, and [`SplitApi`] manages revenue-share configurations and split runs. Specific backends (e.g. SQLite)
//!    implement the traits in the [`traits`] module in order to act as a store for the back-office server.
mod boe_api;
pub mod db_types;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

pub use boe_api::{
    errors::SplitError,
    split_objects,
    splits_api::{compute_split, export_csv, SplitApi},
    transaction_objects,
    transactions_api::TransactionApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
