//! Sale status state machine.
//!
//! The original schema carried `sale_status` as free text; here it is a
//! closed enumeration with an explicit transition table. The table is the
//! single source of truth: any proposed transition absent from it is
//! rejected. The validator is pure — it only decides admissibility, the
//! coordinator performs the write.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── SaleStatus ──────────────────────────────────────────────────────────────

/// The lifecycle status of a property's participation in a tax sale.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
  Scheduled,
  Published,
  Sold,
  Redeemed,
  Cancelled,
  DeedIssued,
}

impl SaleStatus {
  /// The status every new sale record starts in.
  pub const INITIAL: SaleStatus = SaleStatus::Scheduled;

  pub const ALL: [SaleStatus; 6] = [
    SaleStatus::Scheduled,
    SaleStatus::Published,
    SaleStatus::Sold,
    SaleStatus::Redeemed,
    SaleStatus::Cancelled,
    SaleStatus::DeedIssued,
  ];

  /// The discriminant string stored in the `sale_status` column.
  pub fn as_str(self) -> &'static str {
    match self {
      SaleStatus::Scheduled => "scheduled",
      SaleStatus::Published => "published",
      SaleStatus::Sold => "sold",
      SaleStatus::Redeemed => "redeemed",
      SaleStatus::Cancelled => "cancelled",
      SaleStatus::DeedIssued => "deed_issued",
    }
  }

  pub fn parse(s: &str) -> Option<SaleStatus> {
    match s {
      "scheduled" => Some(SaleStatus::Scheduled),
      "published" => Some(SaleStatus::Published),
      "sold" => Some(SaleStatus::Sold),
      "redeemed" => Some(SaleStatus::Redeemed),
      "cancelled" => Some(SaleStatus::Cancelled),
      "deed_issued" => Some(SaleStatus::DeedIssued),
      _ => None,
    }
  }
}

impl fmt::Display for SaleStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── TransitionPolicy ────────────────────────────────────────────────────────

/// The allowed state machine over [`SaleStatus`].
///
/// The default table encodes the reconstructed county workflow; a host
/// application can deserialize a replacement from TOML or JSON once real
/// workflow data is confirmed. States with no entry (or an empty set) are
/// terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionPolicy {
  allowed: BTreeMap<SaleStatus, BTreeSet<SaleStatus>>,
}

impl Default for TransitionPolicy {
  fn default() -> Self {
    use SaleStatus::*;
    let mut allowed: BTreeMap<SaleStatus, BTreeSet<SaleStatus>> =
      BTreeMap::new();
    allowed.insert(Scheduled, BTreeSet::from([Published, Cancelled]));
    allowed.insert(Published, BTreeSet::from([Sold, Cancelled]));
    allowed.insert(Sold, BTreeSet::from([Redeemed, DeedIssued]));
    // Redeemed, DeedIssued, Cancelled: terminal, no outgoing transitions.
    Self { allowed }
  }
}

impl TransitionPolicy {
  /// Parse a replacement policy from its JSON representation, e.g. one
  /// loaded from host configuration.
  pub fn from_json(json: &str) -> Result<Self> {
    Ok(serde_json::from_str(json)?)
  }

  /// Whether `from -> to` appears in the table. Identity pairs are not in
  /// the table; the coordinator short-circuits them as no-ops before
  /// validation.
  pub fn permits(&self, from: SaleStatus, to: SaleStatus) -> bool {
    self
      .allowed
      .get(&from)
      .is_some_and(|targets| targets.contains(&to))
  }

  /// A state with no outgoing transitions.
  pub fn is_terminal(&self, status: SaleStatus) -> bool {
    self.allowed.get(&status).is_none_or(BTreeSet::is_empty)
  }

  /// Reject `from -> to` with [`Error::InvalidStatusTransition`] unless it
  /// is in the table.
  pub fn validate(&self, from: SaleStatus, to: SaleStatus) -> Result<()> {
    if !self.permits(from, to) {
      return Err(Error::InvalidStatusTransition { from, to });
    }
    Ok(())
  }

  /// The `redeemed` flag may only be raised when the status is
  /// [`SaleStatus::Redeemed`].
  pub fn validate_redemption(
    &self,
    status: SaleStatus,
    redeemed: bool,
  ) -> Result<()> {
    if redeemed && status != SaleStatus::Redeemed {
      return Err(Error::InvalidRedemptionState(status));
    }
    Ok(())
  }
}
