//! Shared building blocks for the pg-meta gateway.
//!
//! - `config`: environment-driven application configuration
//! - `errors`: the error taxonomy and its HTTP mapping
//! - `response`: the error envelope returned to clients
//! - `middleware`: request-id propagation
//! - `models`: connection descriptors, catalog objects and mutation requests
//! - `utils`: SQL identifier and literal quoting

pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod response;
pub mod utils;
