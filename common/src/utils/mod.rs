//! Utility functions and helpers.

pub mod sql_quote;

pub use sql_quote::{quote_ident, quote_literal, quote_qualified};
