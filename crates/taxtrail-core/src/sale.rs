//! Tax sale events and a property's participation in them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, money::Money, status::SaleStatus};

// ─── TaxSaleList ─────────────────────────────────────────────────────────────

/// One scheduled sale event for a county.
///
/// Invariant: `publication_date < sale_date`. Enforced by
/// [`NewTaxSaleList::validate`] before commit and again by a CHECK
/// constraint at the storage boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxSaleList {
  pub list_id:          Uuid,
  pub county_id:        Uuid,
  pub sale_date:        NaiveDate,
  pub publication_date: NaiveDate,
  /// Free-form event status, e.g. "upcoming", "completed".
  pub status:           String,
  pub property_count:   u32,
  /// Which publication the list was sourced from, if known.
  pub source:           Option<String>,
  pub created_at:       DateTime<Utc>,
  pub modified_at:      DateTime<Utc>,
}

/// Input to [`crate::store::TaxSaleStore::add_sale_list`].
#[derive(Debug, Clone)]
pub struct NewTaxSaleList {
  pub county_id:        Uuid,
  pub sale_date:        NaiveDate,
  pub publication_date: NaiveDate,
  pub status:           String,
  pub property_count:   u32,
  pub source:           Option<String>,
}

impl NewTaxSaleList {
  /// Check the date-ordering invariant before anything is staged.
  pub fn validate(&self) -> Result<()> {
    if self.publication_date >= self.sale_date {
      return Err(Error::ConstraintViolation(format!(
        "publication_date {} must precede sale_date {}",
        self.publication_date, self.sale_date
      )));
    }
    Ok(())
  }
}

// ─── SaleHistory ─────────────────────────────────────────────────────────────

/// A property's participation in a specific tax sale list. This is the
/// entity the status transition validator watches; its `sale_status`
/// changes are audited in `sale_status_history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleHistory {
  pub sale_id:             Uuid,
  pub property_id:         Uuid,
  pub list_id:             Uuid,
  pub sale_price:          Option<Money>,
  pub buyer_name:          Option<String>,
  pub sale_status:         SaleStatus,
  pub redemption_deadline: Option<NaiveDate>,
  /// Only ever `true` when `sale_status` is [`SaleStatus::Redeemed`].
  pub redeemed:            bool,
  /// Recorded deed book/page or instrument number, once issued.
  pub deed_reference:      Option<String>,
  pub created_at:          DateTime<Utc>,
  pub modified_at:         DateTime<Utc>,
  pub row_version:         i64,
}

/// Input to [`crate::store::TaxSaleStore::add_sale_record`].
#[derive(Debug, Clone)]
pub struct NewSaleHistory {
  pub property_id:         Uuid,
  pub list_id:             Uuid,
  pub sale_price:          Option<Money>,
  pub buyer_name:          Option<String>,
  pub sale_status:         SaleStatus,
  pub redemption_deadline: Option<NaiveDate>,
  pub redeemed:            bool,
  pub deed_reference:      Option<String>,
}

impl NewSaleHistory {
  /// A fresh, unsold entry on a sale list.
  pub fn new(property_id: Uuid, list_id: Uuid) -> Self {
    Self {
      property_id,
      list_id,
      sale_price: None,
      buyer_name: None,
      sale_status: SaleStatus::INITIAL,
      redemption_deadline: None,
      redeemed: false,
      deed_reference: None,
    }
  }
}
