//! Append-only audit rows.
//!
//! History rows are created exclusively by the mutation coordinator,
//! inside the same transaction as the primary write, and are never
//! updated or deleted afterwards. Both row kinds share one logical
//! timestamp with the `modified_at` bump they document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::SaleStatus;

/// One field-level change to a property: who changed what, from which
/// value to which, and when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyHistory {
  pub history_id:  Uuid,
  pub property_id: Uuid,
  pub field_name:  String,
  pub old_value:   Option<String>,
  pub new_value:   Option<String>,
  pub changed_at:  DateTime<Utc>,
  pub changed_by:  String,
}

/// One status transition on a sale record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleStatusHistory {
  pub history_id: Uuid,
  pub sale_id:    Uuid,
  pub old_status: SaleStatus,
  pub new_status: SaleStatus,
  pub changed_at: DateTime<Utc>,
  pub changed_by: String,
  pub notes:      Option<String>,
}
