//! Core types and trait definitions for the Taxtrail audit engine.
//!
//! This crate is deliberately free of database dependencies. It holds the
//! domain types for the tax-sale schema, the pure pieces of the mutation
//! pipeline (change detection, status transition policy, record
//! validation), and the [`store::TaxSaleStore`] trait that storage
//! backends implement.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod change;
pub mod county;
pub mod error;
pub mod history;
pub mod money;
pub mod property;
pub mod sale;
pub mod status;
pub mod store;
pub mod validate;

pub use error::{Error, Result};
