//! Error taxonomy for `taxtrail-core`.
//!
//! Every failure aborts the enclosing storage transaction; none is fatal
//! to the process. `ConcurrentModification` is the only variant a caller
//! may reasonably retry (with fresh state) — the engine never retries on
//! its own.

use thiserror::Error;
use uuid::Uuid;

use crate::status::SaleStatus;

#[derive(Debug, Error)]
pub enum Error {
  #[error("county not found: {0}")]
  CountyNotFound(Uuid),

  #[error("property not found: {0}")]
  PropertyNotFound(Uuid),

  #[error("sale record not found: {0}")]
  SaleNotFound(Uuid),

  #[error("tax sale list not found: {0}")]
  ListNotFound(Uuid),

  #[error("invalid sale status transition: {from} -> {to}")]
  InvalidStatusTransition { from: SaleStatus, to: SaleStatus },

  #[error("redeemed flag requires status 'redeemed', got {0}")]
  InvalidRedemptionState(SaleStatus),

  #[error("constraint violation: {0}")]
  ConstraintViolation(String),

  /// Lock wait timed out or a row-version compare-and-swap missed.
  /// The caller may retry against fresh state.
  #[error("concurrent modification detected")]
  ConcurrentModification,

  /// Staging an audit row failed. Always rolls the whole operation back;
  /// indicates a schema or storage problem, not bad caller input.
  #[error("history write failed: {0}")]
  HistoryWriteFailed(String),

  #[error("actor identifier is required and must be non-empty")]
  MissingActor,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Reject blank actor identifiers before any storage work happens.
/// Actors are persisted verbatim into history rows, so an empty string
/// would produce an untraceable audit entry.
pub fn require_actor(actor: &str) -> Result<()> {
  if actor.trim().is_empty() {
    return Err(Error::MissingActor);
  }
  Ok(())
}
