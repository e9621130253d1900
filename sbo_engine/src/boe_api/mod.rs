//! The engine's public API.
//!
//! [`transactions_api::TransactionApi`] wraps the storage backend for everything transaction-shaped, and
//! [`splits_api::SplitApi`] hosts the revenue-split calculation and its spreadsheet export.
pub mod errors;
pub mod split_objects;
pub mod splits_api;
pub mod transaction_objects;
pub mod transactions_api;
