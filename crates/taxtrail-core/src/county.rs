//! County and publication types — the parent entities of the schema.
//!
//! A county owns everything else via `county_id`. Source publications and
//! publication schedules are cascade-deleted with their county; properties
//! and sale records are not (their audit trails must never vanish as a
//! side effect).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── County ──────────────────────────────────────────────────────────────────

/// A governmental jurisdiction conducting tax sales. Unique by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct County {
  pub county_id:                 Uuid,
  pub name:                      String,
  /// Two-letter state code, e.g. `"GA"`.
  pub state:                     String,
  pub contact_phone:             Option<String>,
  pub contact_email:             Option<String>,
  pub website:                   Option<String>,
  /// Where sales are physically held (e.g. "courthouse steps").
  pub sale_location:             Option<String>,
  /// How often sales occur (e.g. "first Tuesday monthly").
  pub sale_frequency:            Option<String>,
  pub registration_requirements: Option<String>,
  pub created_at:                DateTime<Utc>,
  pub modified_at:               DateTime<Utc>,
}

/// Input to [`crate::store::TaxSaleStore::add_county`].
/// Ids and timestamps are always assigned by the store.
#[derive(Debug, Clone, Default)]
pub struct NewCounty {
  pub name:                      String,
  pub state:                     String,
  pub contact_phone:             Option<String>,
  pub contact_email:             Option<String>,
  pub website:                   Option<String>,
  pub sale_location:             Option<String>,
  pub sale_frequency:            Option<String>,
  pub registration_requirements: Option<String>,
}

impl NewCounty {
  /// Convenience constructor with all optional fields unset.
  pub fn new(name: impl Into<String>, state: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      state: state.into(),
      ..Self::default()
    }
  }
}

// ─── Source publications ─────────────────────────────────────────────────────

/// How a county publishes its tax-sale data. The variants mirror the
/// source families actually seen in the wild: county web portals, legal
/// PDF notices, bulk CSV exports, and auction-platform APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
  Html,
  Pdf,
  Csv,
  Api,
}

/// A platform through which a county publishes tax-sale data.
/// Cascade-deleted with its county.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcePublication {
  pub publication_id: Uuid,
  pub county_id:      Uuid,
  pub name:           String,
  pub url:            Option<String>,
  pub format:         SourceFormat,
  /// Whether this is the county's authoritative source.
  pub is_primary:     bool,
  pub created_at:     DateTime<Utc>,
}

/// Input to [`crate::store::TaxSaleStore::add_source_publication`].
#[derive(Debug, Clone)]
pub struct NewSourcePublication {
  pub county_id:  Uuid,
  pub name:       String,
  pub url:        Option<String>,
  pub format:     SourceFormat,
  pub is_primary: bool,
}

// ─── Publication schedules ───────────────────────────────────────────────────

/// Timing and legal requirements for publishing a sale notice.
/// Cascade-deleted with its county.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicationSchedule {
  pub schedule_id:      Uuid,
  pub county_id:        Uuid,
  /// How many days before the sale the notice must run. Always > 0.
  pub days_before_sale: u32,
  /// E.g. "legal organ", "courthouse posting", "online notice".
  pub publication_type: String,
  /// The newspaper of record, when the type requires one.
  pub legal_newspaper:  Option<String>,
  pub created_at:       DateTime<Utc>,
}

/// Input to [`crate::store::TaxSaleStore::add_publication_schedule`].
#[derive(Debug, Clone)]
pub struct NewPublicationSchedule {
  pub county_id:        Uuid,
  pub days_before_sale: u32,
  pub publication_type: String,
  pub legal_newspaper:  Option<String>,
}
