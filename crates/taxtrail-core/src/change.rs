//! Change detection — field-level diffing between property snapshots.
//!
//! Proposed updates arrive as a [`PropertyPatch`]: a three-state patch per
//! watched field, so "leave alone", "set to a value", and "clear to NULL"
//! are all expressible. The detector compares old and merged state by
//! typed value (cents against cents, never string against string) and
//! emits one [`FieldChange`] per differing field, in declaration order.
//!
//! An empty change set is not an error. It means "no-op update" and the
//! coordinator must skip the history write and the `modified_at` bump.

use serde::{Deserialize, Serialize};

use crate::{money::Money, property::Property};

// ─── Patch ───────────────────────────────────────────────────────────────────

/// A three-state update for one optional field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Patch<T> {
  /// Leave the current value untouched.
  Keep,
  /// Replace the current value.
  Set(T),
  /// Null out the current value.
  Clear,
}

// Manual impl: the derive would demand `T: Default` even though `Keep`
// carries no value.
impl<T> Default for Patch<T> {
  fn default() -> Self { Patch::Keep }
}

impl<T: Clone> Patch<T> {
  /// Resolve this patch against the current value.
  pub fn apply(&self, current: Option<T>) -> Option<T> {
    match self {
      Patch::Keep => current,
      Patch::Set(v) => Some(v.clone()),
      Patch::Clear => None,
    }
  }
}

/// A proposed update to a property's watched fields. Defaults to all
/// [`Patch::Keep`], so callers set only what they mean to touch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyPatch {
  #[serde(default)]
  pub address:        Patch<String>,
  #[serde(default)]
  pub owner_name:     Patch<String>,
  #[serde(default)]
  pub assessed_value: Patch<Money>,
  #[serde(default)]
  pub market_value:   Patch<Money>,
  #[serde(default)]
  pub taxes_due:      Patch<Money>,
  #[serde(default)]
  pub property_class: Patch<String>,
  #[serde(default)]
  pub acreage:        Patch<f64>,
  #[serde(default)]
  pub year_built:     Patch<i32>,
}

impl PropertyPatch {
  /// The merged new state: `current` with this patch applied. Identifiers,
  /// timestamps, and the row version are carried over unchanged — the
  /// coordinator owns those.
  pub fn merge(&self, current: &Property) -> Property {
    Property {
      address:        self.address.apply(current.address.clone()),
      owner_name:     self.owner_name.apply(current.owner_name.clone()),
      assessed_value: self.assessed_value.apply(current.assessed_value),
      market_value:   self.market_value.apply(current.market_value),
      taxes_due:      self.taxes_due.apply(current.taxes_due),
      property_class: self.property_class.apply(current.property_class.clone()),
      acreage:        self.acreage.apply(current.acreage),
      year_built:     self.year_built.apply(current.year_built),
      ..current.clone()
    }
  }
}

// ─── FieldChange ─────────────────────────────────────────────────────────────

/// One detected difference, destined for a `property_history` row.
/// Values are the canonical string renderings; `None` is SQL NULL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
  pub field_name: &'static str,
  pub old_value:  Option<String>,
  pub new_value:  Option<String>,
}

fn diff_field<T>(
  changes: &mut Vec<FieldChange>,
  field_name: &'static str,
  old: &Option<T>,
  new: &Option<T>,
) where
  T: PartialEq + ToString,
{
  if old != new {
    changes.push(FieldChange {
      field_name,
      old_value: old.as_ref().map(T::to_string),
      new_value: new.as_ref().map(T::to_string),
    });
  }
}

/// Compare every watched field of two snapshots, in declaration order.
/// Identifiers (`property_id`, `county_id`, `parcel_id`), timestamps, and
/// `row_version` are deliberately excluded.
pub fn diff_properties(old: &Property, new: &Property) -> Vec<FieldChange> {
  let mut changes = Vec::new();
  diff_field(&mut changes, "address", &old.address, &new.address);
  diff_field(&mut changes, "owner_name", &old.owner_name, &new.owner_name);
  diff_field(
    &mut changes,
    "assessed_value",
    &old.assessed_value,
    &new.assessed_value,
  );
  diff_field(
    &mut changes,
    "market_value",
    &old.market_value,
    &new.market_value,
  );
  diff_field(&mut changes, "taxes_due", &old.taxes_due, &new.taxes_due);
  diff_field(
    &mut changes,
    "property_class",
    &old.property_class,
    &new.property_class,
  );
  diff_field(&mut changes, "acreage", &old.acreage, &new.acreage);
  diff_field(&mut changes, "year_built", &old.year_built, &new.year_built);
  changes
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use uuid::Uuid;

  use super::*;

  fn base_property() -> Property {
    let now = Utc::now();
    Property {
      property_id:    Uuid::new_v4(),
      county_id:      Uuid::new_v4(),
      parcel_id:      "123A45678901".into(),
      address:        Some("100 Main St".into()),
      owner_name:     Some("J. Doe".into()),
      assessed_value: Some(Money::from_dollars(85_000)),
      market_value:   None,
      taxes_due:      Some(Money::from_dollars(1000)),
      property_class: Some("residential".into()),
      acreage:        Some(0.25),
      year_built:     Some(1962),
      created_at:     now,
      modified_at:    now,
      row_version:    1,
    }
  }

  #[test]
  fn identical_snapshots_produce_empty_diff() {
    let p = base_property();
    assert!(diff_properties(&p, &p.clone()).is_empty());
  }

  #[test]
  fn one_change_per_differing_field_in_declaration_order() {
    let old = base_property();
    let mut new = old.clone();
    new.owner_name = Some("K. Doe".into());
    new.taxes_due = Some(Money::from_dollars(1200));
    new.year_built = Some(1963);

    let changes = diff_properties(&old, &new);
    let names: Vec<_> = changes.iter().map(|c| c.field_name).collect();
    assert_eq!(names, ["owner_name", "taxes_due", "year_built"]);
  }

  #[test]
  fn null_transitions_are_reported_both_ways() {
    let old = base_property();
    let mut new = old.clone();
    new.address = None;
    new.market_value = Some(Money::from_dollars(120_000));

    let changes = diff_properties(&old, &new);
    assert_eq!(changes.len(), 2);

    assert_eq!(changes[0].field_name, "address");
    assert_eq!(changes[0].old_value.as_deref(), Some("100 Main St"));
    assert_eq!(changes[0].new_value, None);

    assert_eq!(changes[1].field_name, "market_value");
    assert_eq!(changes[1].old_value, None);
    assert_eq!(changes[1].new_value.as_deref(), Some("120000.00"));
  }

  #[test]
  fn money_values_render_canonically() {
    let old = base_property();
    let mut new = old.clone();
    new.taxes_due = Some(Money::from_dollars(1200));

    let changes = diff_properties(&old, &new);
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].old_value.as_deref(), Some("1000.00"));
    assert_eq!(changes[0].new_value.as_deref(), Some("1200.00"));
  }

  #[test]
  fn merge_respects_keep_set_clear() {
    let current = base_property();
    let patch = PropertyPatch {
      owner_name: Patch::Set("New Owner LLC".into()),
      address: Patch::Clear,
      ..PropertyPatch::default()
    };

    let merged = patch.merge(&current);
    assert_eq!(merged.owner_name.as_deref(), Some("New Owner LLC"));
    assert_eq!(merged.address, None);
    // Keep leaves the rest alone.
    assert_eq!(merged.taxes_due, current.taxes_due);
    assert_eq!(merged.parcel_id, current.parcel_id);
    assert_eq!(merged.row_version, current.row_version);
  }

  #[test]
  fn identity_patch_merges_to_equal_state() {
    let current = base_property();
    let merged = PropertyPatch::default().merge(&current);
    assert!(diff_properties(&current, &merged).is_empty());
  }
}
