//! # Sage Back-Office server
//! This module hosts the server code for the back-office. It is responsible for:
//! Recording e-commerce transactions submitted by the storefront.
//! Registering recorded transactions as sales invoices in Sage X3.
//! Serving receipt and invoice download links from the document host.
//! Managing revenue-share configurations and running split exports.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes a `/health` check and the back-office REST API under `/api`. See [routes](routes/index.html)
//! for the full list.
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod registration_worker;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
