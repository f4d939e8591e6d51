//! SQLite backend for the Taxtrail audit engine.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. The mutation coordinator
//! lives here: every `apply_*` operation runs inside one IMMEDIATE
//! transaction, so the primary row write and its audit rows commit (or
//! roll back) as a single unit.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
