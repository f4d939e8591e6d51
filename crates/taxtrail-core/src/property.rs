//! Property — the parcel record the Change Detector watches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;

/// A parcel record, unique per `(county_id, parcel_id)`.
///
/// The watched (user-mutable) fields are everything between `parcel_id`
/// and the timestamps; identifiers, timestamps, and `row_version` are
/// never reported by the change detector. Field declaration order here is
/// the order changes are emitted and audited in — keep it stable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
  pub property_id:    Uuid,
  pub county_id:      Uuid,
  /// County-assigned parcel identifier; format varies per county.
  pub parcel_id:      String,

  pub address:        Option<String>,
  pub owner_name:     Option<String>,
  pub assessed_value: Option<Money>,
  pub market_value:   Option<Money>,
  pub taxes_due:      Option<Money>,
  /// Assessment class, e.g. "residential", "commercial", "agricultural".
  pub property_class: Option<String>,
  pub acreage:        Option<f64>,
  pub year_built:     Option<i32>,

  pub created_at:     DateTime<Utc>,
  /// Bumped only when a substantive change commits; a no-op update leaves
  /// it untouched.
  pub modified_at:    DateTime<Utc>,
  /// Optimistic-concurrency counter; incremented on every committed
  /// substantive change.
  pub row_version:    i64,
}

/// Input to [`crate::store::TaxSaleStore::add_property`].
/// Ids, timestamps, and the row version are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewProperty {
  pub county_id:      Uuid,
  pub parcel_id:      String,
  pub address:        Option<String>,
  pub owner_name:     Option<String>,
  pub assessed_value: Option<Money>,
  pub market_value:   Option<Money>,
  pub taxes_due:      Option<Money>,
  pub property_class: Option<String>,
  pub acreage:        Option<f64>,
  pub year_built:     Option<i32>,
}

impl NewProperty {
  /// Convenience constructor with all optional fields unset.
  pub fn new(county_id: Uuid, parcel_id: impl Into<String>) -> Self {
    Self {
      county_id,
      parcel_id: parcel_id.into(),
      address: None,
      owner_name: None,
      assessed_value: None,
      market_value: None,
      taxes_due: None,
      property_class: None,
      acreage: None,
      year_built: None,
    }
  }
}
