//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::NaiveDate;
use taxtrail_core::{
  Error as CoreError,
  change::{Patch, PropertyPatch},
  county::{County, NewCounty, NewPublicationSchedule, NewSourcePublication, SourceFormat},
  money::Money,
  property::{NewProperty, Property},
  sale::{NewSaleHistory, NewTaxSaleList, SaleHistory, TaxSaleList},
  status::{SaleStatus, TransitionPolicy},
  store::TaxSaleStore,
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn county(s: &SqliteStore) -> County {
  s.add_county(NewCounty::new("Fulton", "GA")).await.unwrap()
}

async fn property(s: &SqliteStore, county_id: Uuid) -> Property {
  let mut input = NewProperty::new(county_id, "123456-78");
  input.address = Some("100 Main St".into());
  input.owner_name = Some("J. Doe".into());
  input.taxes_due = Some(Money::from_dollars(1000));
  s.add_property(input).await.unwrap()
}

fn date(s: &str) -> NaiveDate { s.parse().unwrap() }

async fn sale_list(s: &SqliteStore, county_id: Uuid) -> TaxSaleList {
  s.add_sale_list(NewTaxSaleList {
    county_id,
    sale_date: date("2026-09-01"),
    publication_date: date("2026-08-01"),
    status: "upcoming".into(),
    property_count: 0,
    source: None,
  })
  .await
  .unwrap()
}

async fn sale(s: &SqliteStore, property_id: Uuid, list_id: Uuid) -> SaleHistory {
  s.add_sale_record(NewSaleHistory::new(property_id, list_id))
    .await
    .unwrap()
}

// ─── Counties ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_county() {
  let s = store().await;

  let c = county(&s).await;
  assert_eq!(c.name, "Fulton");
  assert_eq!(c.state, "GA");

  let fetched = s.get_county(c.county_id).await.unwrap().unwrap();
  assert_eq!(fetched.county_id, c.county_id);
  assert_eq!(fetched.name, "Fulton");

  let by_name = s.get_county_by_name("Fulton").await.unwrap().unwrap();
  assert_eq!(by_name.county_id, c.county_id);
}

#[tokio::test]
async fn get_county_missing_returns_none() {
  let s = store().await;
  assert!(s.get_county(Uuid::new_v4()).await.unwrap().is_none());
  assert!(s.get_county_by_name("Nowhere").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_county_name_errors() {
  let s = store().await;
  county(&s).await;

  let err = s
    .add_county(NewCounty::new("Fulton", "GA"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::ConstraintViolation(_))));
}

#[tokio::test]
async fn list_counties_ordered_by_name() {
  let s = store().await;
  s.add_county(NewCounty::new("DeKalb", "GA")).await.unwrap();
  s.add_county(NewCounty::new("Cobb", "GA")).await.unwrap();
  s.add_county(NewCounty::new("Fulton", "GA")).await.unwrap();

  let names: Vec<_> = s
    .list_counties()
    .await
    .unwrap()
    .into_iter()
    .map(|c| c.name)
    .collect();
  assert_eq!(names, ["Cobb", "DeKalb", "Fulton"]);
}

#[tokio::test]
async fn remove_county_cascades_publications_and_schedules() {
  let s = store().await;
  let c = county(&s).await;

  s.add_source_publication(NewSourcePublication {
    county_id:  c.county_id,
    name:       "County portal".into(),
    url:        Some("https://example.test/sales".into()),
    format:     SourceFormat::Html,
    is_primary: true,
  })
  .await
  .unwrap();
  s.add_publication_schedule(NewPublicationSchedule {
    county_id:        c.county_id,
    days_before_sale: 28,
    publication_type: "legal organ".into(),
    legal_newspaper:  Some("Daily Report".into()),
  })
  .await
  .unwrap();

  s.remove_county(c.county_id).await.unwrap();

  assert!(s.get_county(c.county_id).await.unwrap().is_none());
  assert!(
    s.list_source_publications(c.county_id)
      .await
      .unwrap()
      .is_empty()
  );
  assert!(
    s.list_publication_schedules(c.county_id)
      .await
      .unwrap()
      .is_empty()
  );
}

#[tokio::test]
async fn remove_county_with_properties_errors() {
  let s = store().await;
  let c = county(&s).await;
  property(&s, c.county_id).await;

  let err = s.remove_county(c.county_id).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::ConstraintViolation(_))));

  // Nothing was deleted.
  assert!(s.get_county(c.county_id).await.unwrap().is_some());
}

#[tokio::test]
async fn remove_missing_county_errors() {
  let s = store().await;
  let id = Uuid::new_v4();
  let err = s.remove_county(id).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::CountyNotFound(got)) if got == id));
}

// ─── Publications ────────────────────────────────────────────────────────────

#[tokio::test]
async fn publication_requires_existing_county() {
  let s = store().await;

  let err = s
    .add_source_publication(NewSourcePublication {
      county_id:  Uuid::new_v4(),
      name:       "orphan".into(),
      url:        None,
      format:     SourceFormat::Pdf,
      is_primary: false,
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::CountyNotFound(_))));
}

#[tokio::test]
async fn zero_days_before_sale_errors() {
  let s = store().await;
  let c = county(&s).await;

  let err = s
    .add_publication_schedule(NewPublicationSchedule {
      county_id:        c.county_id,
      days_before_sale: 0,
      publication_type: "legal organ".into(),
      legal_newspaper:  None,
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::ConstraintViolation(_))));
  assert!(
    s.list_publication_schedules(c.county_id)
      .await
      .unwrap()
      .is_empty()
  );
}

// ─── Sale lists ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn sale_list_roundtrip() {
  let s = store().await;
  let c = county(&s).await;

  let list = sale_list(&s, c.county_id).await;
  let fetched = s.get_sale_list(list.list_id).await.unwrap().unwrap();
  assert_eq!(fetched.sale_date, date("2026-09-01"));
  assert_eq!(fetched.publication_date, date("2026-08-01"));
  assert_eq!(fetched.status, "upcoming");
}

#[tokio::test]
async fn sale_list_date_invariant_enforced_before_commit() {
  let s = store().await;
  let c = county(&s).await;

  let err = s
    .add_sale_list(NewTaxSaleList {
      county_id:        c.county_id,
      sale_date:        date("2026-08-01"),
      publication_date: date("2026-09-01"),
      status:           "upcoming".into(),
      property_count:   0,
      source:           None,
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::ConstraintViolation(_))));
}

// ─── Properties ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_property() {
  let s = store().await;
  let c = county(&s).await;

  let mut input = NewProperty::new(c.county_id, "123A45678901");
  input.assessed_value = Some(Money::from_dollars(85_000));
  input.taxes_due = Some(Money::from_cents(123_456));
  input.acreage = Some(0.25);
  input.year_built = Some(1962);
  let p = s.add_property(input).await.unwrap();

  let fetched = s.get_property(p.property_id).await.unwrap().unwrap();
  assert_eq!(fetched.parcel_id, "123A45678901");
  assert_eq!(fetched.assessed_value, Some(Money::from_dollars(85_000)));
  assert_eq!(fetched.taxes_due, Some(Money::from_cents(123_456)));
  assert_eq!(fetched.acreage, Some(0.25));
  assert_eq!(fetched.year_built, Some(1962));
  assert_eq!(fetched.row_version, 1);
}

#[tokio::test]
async fn duplicate_parcel_in_county_errors() {
  let s = store().await;
  let c = county(&s).await;
  property(&s, c.county_id).await;

  let err = s
    .add_property(NewProperty::new(c.county_id, "123456-78"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::ConstraintViolation(_))));
}

#[tokio::test]
async fn same_parcel_in_different_counties_is_fine() {
  let s = store().await;
  let a = s.add_county(NewCounty::new("Cobb", "GA")).await.unwrap();
  let b = s.add_county(NewCounty::new("Clayton", "GA")).await.unwrap();

  property(&s, a.county_id).await;
  property(&s, b.county_id).await;
}

#[tokio::test]
async fn implausible_taxes_due_errors() {
  let s = store().await;
  let c = county(&s).await;

  let mut input = NewProperty::new(c.county_id, "999999-99");
  input.taxes_due = Some(Money::from_dollars(20_000_000));
  let err = s.add_property(input).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::ConstraintViolation(_))));
}

// ─── Property updates & audit trail ──────────────────────────────────────────

#[tokio::test]
async fn property_update_records_field_history() {
  let s = store().await;
  let c = county(&s).await;
  let p = property(&s, c.county_id).await;

  let patch = PropertyPatch {
    taxes_due: Patch::Set(Money::from_dollars(1200)),
    ..PropertyPatch::default()
  };
  let updated = s
    .apply_property_update(p.property_id, patch, "ingest-bot")
    .await
    .unwrap();

  assert_eq!(updated.taxes_due, Some(Money::from_dollars(1200)));
  assert_eq!(updated.row_version, 2);
  assert!(updated.modified_at > p.modified_at);

  let history = s.get_property_history(p.property_id).await.unwrap();
  assert_eq!(history.len(), 1);
  let row = &history[0];
  assert_eq!(row.field_name, "taxes_due");
  assert_eq!(row.old_value.as_deref(), Some("1000.00"));
  assert_eq!(row.new_value.as_deref(), Some("1200.00"));
  assert_eq!(row.changed_by, "ingest-bot");
  // The audit row and the modified_at bump share one logical timestamp.
  assert_eq!(row.changed_at, updated.modified_at);
}

#[tokio::test]
async fn noop_property_update_is_idempotent() {
  let s = store().await;
  let c = county(&s).await;
  let p = property(&s, c.county_id).await;

  // All-Keep patch, and a patch that re-sets the current values.
  for patch in [
    PropertyPatch::default(),
    PropertyPatch {
      taxes_due: Patch::Set(Money::from_dollars(1000)),
      owner_name: Patch::Set("J. Doe".into()),
      ..PropertyPatch::default()
    },
  ] {
    let result = s
      .apply_property_update(p.property_id, patch, "ingest-bot")
      .await
      .unwrap();
    assert_eq!(result.modified_at, p.modified_at);
    assert_eq!(result.row_version, 1);
  }

  assert!(s.get_property_history(p.property_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn multi_field_update_orders_history_rows() {
  let s = store().await;
  let c = county(&s).await;
  let p = property(&s, c.county_id).await;

  let patch = PropertyPatch {
    year_built: Patch::Set(1975),
    owner_name: Patch::Set("New Owner LLC".into()),
    taxes_due: Patch::Set(Money::from_dollars(1500)),
    ..PropertyPatch::default()
  };
  s.apply_property_update(p.property_id, patch, "clerk")
    .await
    .unwrap();

  // Declaration order, regardless of patch construction order.
  let fields: Vec<_> = s
    .get_property_history(p.property_id)
    .await
    .unwrap()
    .into_iter()
    .map(|h| h.field_name)
    .collect();
  assert_eq!(fields, ["owner_name", "taxes_due", "year_built"]);
}

#[tokio::test]
async fn clearing_a_field_audits_null_transition() {
  let s = store().await;
  let c = county(&s).await;
  let p = property(&s, c.county_id).await;

  let patch = PropertyPatch {
    address: Patch::Clear,
    ..PropertyPatch::default()
  };
  let updated = s
    .apply_property_update(p.property_id, patch, "clerk")
    .await
    .unwrap();
  assert_eq!(updated.address, None);

  let history = s.get_property_history(p.property_id).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].old_value.as_deref(), Some("100 Main St"));
  assert_eq!(history[0].new_value, None);
}

#[tokio::test]
async fn blank_actor_is_rejected() {
  let s = store().await;
  let c = county(&s).await;
  let p = property(&s, c.county_id).await;

  let patch = PropertyPatch {
    taxes_due: Patch::Set(Money::from_dollars(9999)),
    ..PropertyPatch::default()
  };
  let err = s
    .apply_property_update(p.property_id, patch, "  ")
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::MissingActor)));

  // Nothing was staged.
  let fetched = s.get_property(p.property_id).await.unwrap().unwrap();
  assert_eq!(fetched.taxes_due, Some(Money::from_dollars(1000)));
  assert!(s.get_property_history(p.property_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn update_to_implausible_taxes_due_is_rejected() {
  let s = store().await;
  let c = county(&s).await;
  let p = property(&s, c.county_id).await;

  let patch = PropertyPatch {
    taxes_due: Patch::Set(Money::from_dollars(20_000_000)),
    ..PropertyPatch::default()
  };
  let err = s
    .apply_property_update(p.property_id, patch, "ingest-bot")
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::ConstraintViolation(_))));

  // Same rule as insertion; nothing was staged.
  let fetched = s.get_property(p.property_id).await.unwrap().unwrap();
  assert_eq!(fetched.taxes_due, Some(Money::from_dollars(1000)));
  assert_eq!(fetched.row_version, 1);
  assert!(s.get_property_history(p.property_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn update_missing_property_errors() {
  let s = store().await;
  let err = s
    .apply_property_update(Uuid::new_v4(), PropertyPatch::default(), "clerk")
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::PropertyNotFound(_))));
}

#[tokio::test]
async fn failed_history_write_rolls_back_property_update() {
  let s = store().await;
  let c = county(&s).await;
  let p = property(&s, c.county_id).await;

  // Sabotage the audit table so history staging fails after the primary
  // UPDATE has been staged.
  s.execute_batch_raw("DROP TABLE property_history").await.unwrap();

  let patch = PropertyPatch {
    taxes_due: Patch::Set(Money::from_dollars(1200)),
    ..PropertyPatch::default()
  };
  let err = s
    .apply_property_update(p.property_id, patch, "ingest-bot")
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::HistoryWriteFailed(_))));

  // The whole transaction rolled back: pre-call state is intact.
  let fetched = s.get_property(p.property_id).await.unwrap().unwrap();
  assert_eq!(fetched.taxes_due, Some(Money::from_dollars(1000)));
  assert_eq!(fetched.modified_at, p.modified_at);
  assert_eq!(fetched.row_version, 1);
}

#[tokio::test]
async fn concurrent_updates_to_same_property_serialize() {
  let s = store().await;
  let c = county(&s).await;
  let p = property(&s, c.county_id).await;

  let patch_a = PropertyPatch {
    taxes_due: Patch::Set(Money::from_dollars(1100)),
    ..PropertyPatch::default()
  };
  let patch_b = PropertyPatch {
    taxes_due: Patch::Set(Money::from_dollars(1200)),
    ..PropertyPatch::default()
  };

  let (a, b) = tokio::join!(
    s.apply_property_update(p.property_id, patch_a, "actor-a"),
    s.apply_property_update(p.property_id, patch_b, "actor-b"),
  );
  a.unwrap();
  b.unwrap();

  // Exactly one committed first; the second saw its state. The audit
  // chain is contiguous and the final row matches the final state.
  let fetched = s.get_property(p.property_id).await.unwrap().unwrap();
  assert_eq!(fetched.row_version, 3);

  let history = s.get_property_history(p.property_id).await.unwrap();
  assert_eq!(history.len(), 2);
  assert_eq!(history[0].old_value.as_deref(), Some("1000.00"));
  assert_eq!(history[1].old_value, history[0].new_value);
  assert_eq!(
    fetched.taxes_due.unwrap().to_string(),
    history[1].new_value.clone().unwrap()
  );
}

// ─── Sale records & status transitions ───────────────────────────────────────

#[tokio::test]
async fn sale_record_redeemed_flag_requires_redeemed_status() {
  let s = store().await;
  let c = county(&s).await;
  let p = property(&s, c.county_id).await;
  let list = sale_list(&s, c.county_id).await;

  let mut input = NewSaleHistory::new(p.property_id, list.list_id);
  input.sale_status = SaleStatus::Sold;
  input.redeemed = true;
  let err = s.add_sale_record(input).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::InvalidRedemptionState(SaleStatus::Sold))
  ));
}

#[tokio::test]
async fn status_transition_records_history() {
  let s = store().await;
  let c = county(&s).await;
  let p = property(&s, c.county_id).await;
  let list = sale_list(&s, c.county_id).await;
  let record = sale(&s, p.property_id, list.list_id).await;

  let updated = s
    .apply_sale_status_update(
      record.sale_id,
      SaleStatus::Published,
      "clerk",
      Some("ran in the legal organ".into()),
    )
    .await
    .unwrap();
  assert_eq!(updated.sale_status, SaleStatus::Published);
  assert_eq!(updated.row_version, 2);

  let history = s.get_sale_status_history(record.sale_id).await.unwrap();
  assert_eq!(history.len(), 1);
  let row = &history[0];
  assert_eq!(row.old_status, SaleStatus::Scheduled);
  assert_eq!(row.new_status, SaleStatus::Published);
  assert_eq!(row.changed_by, "clerk");
  assert_eq!(row.notes.as_deref(), Some("ran in the legal organ"));
  assert_eq!(row.changed_at, updated.modified_at);
}

#[tokio::test]
async fn full_lifecycle_to_redeemed_sets_flag() {
  let s = store().await;
  let c = county(&s).await;
  let p = property(&s, c.county_id).await;
  let list = sale_list(&s, c.county_id).await;
  let record = sale(&s, p.property_id, list.list_id).await;

  for status in [SaleStatus::Published, SaleStatus::Sold, SaleStatus::Redeemed] {
    s.apply_sale_status_update(record.sale_id, status, "clerk", None)
      .await
      .unwrap();
  }

  let fetched = s.get_sale_record(record.sale_id).await.unwrap().unwrap();
  assert_eq!(fetched.sale_status, SaleStatus::Redeemed);
  assert!(fetched.redeemed);

  let transitions: Vec<_> = s
    .get_sale_status_history(record.sale_id)
    .await
    .unwrap()
    .into_iter()
    .map(|h| (h.old_status, h.new_status))
    .collect();
  assert_eq!(transitions, [
    (SaleStatus::Scheduled, SaleStatus::Published),
    (SaleStatus::Published, SaleStatus::Sold),
    (SaleStatus::Sold, SaleStatus::Redeemed),
  ]);
}

#[tokio::test]
async fn illegal_transition_rejected_without_trace() {
  let s = store().await;
  let c = county(&s).await;
  let p = property(&s, c.county_id).await;
  let list = sale_list(&s, c.county_id).await;
  let record = sale(&s, p.property_id, list.list_id).await;

  // scheduled -> deed_issued skips the whole machine.
  let err = s
    .apply_sale_status_update(record.sale_id, SaleStatus::DeedIssued, "clerk", None)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::InvalidStatusTransition {
      from: SaleStatus::Scheduled,
      to:   SaleStatus::DeedIssued,
    })
  ));

  let fetched = s.get_sale_record(record.sale_id).await.unwrap().unwrap();
  assert_eq!(fetched.sale_status, SaleStatus::Scheduled);
  assert_eq!(fetched.row_version, 1);
  assert!(s.get_sale_status_history(record.sale_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn same_status_update_is_noop() {
  let s = store().await;
  let c = county(&s).await;
  let p = property(&s, c.county_id).await;
  let list = sale_list(&s, c.county_id).await;
  let record = sale(&s, p.property_id, list.list_id).await;

  let result = s
    .apply_sale_status_update(record.sale_id, SaleStatus::Scheduled, "clerk", None)
    .await
    .unwrap();
  assert_eq!(result.modified_at, record.modified_at);
  assert_eq!(result.row_version, 1);
  assert!(s.get_sale_status_history(record.sale_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn update_missing_sale_errors() {
  let s = store().await;
  let err = s
    .apply_sale_status_update(Uuid::new_v4(), SaleStatus::Published, "clerk", None)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::SaleNotFound(_))));
}

#[tokio::test]
async fn custom_policy_replaces_default() {
  // A host policy where sales can only ever be cancelled.
  let policy =
    TransitionPolicy::from_json(r#"{ "allowed": { "scheduled": ["cancelled"] } }"#)
      .unwrap();
  let s = store().await.with_policy(policy);

  let c = county(&s).await;
  let p = property(&s, c.county_id).await;
  let list = sale_list(&s, c.county_id).await;
  let record = sale(&s, p.property_id, list.list_id).await;

  let err = s
    .apply_sale_status_update(record.sale_id, SaleStatus::Published, "clerk", None)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::InvalidStatusTransition { .. })
  ));

  s.apply_sale_status_update(record.sale_id, SaleStatus::Cancelled, "clerk", None)
    .await
    .unwrap();
}
