//! [`SqliteStore`] — the SQLite implementation of [`TaxSaleStore`].
//!
//! The `apply_*` coordinator methods run start to finish inside one
//! IMMEDIATE transaction on the database thread: load the current row,
//! validate, merge, diff, stage the guarded primary UPDATE plus its audit
//! rows, commit. Returning an error before `commit` drops the transaction,
//! which rolls everything back — a cancelled future has the same effect.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use taxtrail_core::{
  Error as CoreError,
  change::{PropertyPatch, diff_properties},
  county::{
    County, NewCounty, NewPublicationSchedule, NewSourcePublication,
    PublicationSchedule, SourcePublication,
  },
  error::require_actor,
  history::{PropertyHistory, SaleStatusHistory},
  property::{NewProperty, Property},
  sale::{NewSaleHistory, NewTaxSaleList, SaleHistory, TaxSaleList},
  status::{SaleStatus, TransitionPolicy},
  store::TaxSaleStore,
  validate::valid_tax_amount,
};

use crate::{
  Error, Result,
  encode::{
    RawCounty, RawProperty, RawPropertyHistory, RawPublicationSchedule,
    RawSaleHistory, RawSaleStatusHistory, RawSourcePublication,
    RawTaxSaleList, encode_date, encode_dt, encode_format, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Taxtrail store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted, and the
/// transition policy is shared.
#[derive(Clone)]
pub struct SqliteStore {
  conn:   tokio_rusqlite::Connection,
  policy: Arc<TransitionPolicy>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` with the default transition
  /// policy, and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self {
      conn,
      policy: Arc::new(TransitionPolicy::default()),
    };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self {
      conn,
      policy: Arc::new(TransitionPolicy::default()),
    };
    store.init_schema().await?;
    Ok(store)
  }

  /// Replace the sale-status transition policy (e.g. one deserialised
  /// from host configuration).
  pub fn with_policy(mut self, policy: TransitionPolicy) -> Self {
    self.policy = Arc::new(policy);
    self
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

#[cfg(test)]
impl SqliteStore {
  /// Test hook: run raw SQL outside the coordinator, e.g. to sabotage a
  /// table and exercise rollback paths.
  pub(crate) async fn execute_batch_raw(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row mappers ─────────────────────────────────────────────────────────────

fn county_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawCounty> {
  Ok(RawCounty {
    county_id:                 row.get(0)?,
    name:                      row.get(1)?,
    state:                     row.get(2)?,
    contact_phone:             row.get(3)?,
    contact_email:             row.get(4)?,
    website:                   row.get(5)?,
    sale_location:             row.get(6)?,
    sale_frequency:            row.get(7)?,
    registration_requirements: row.get(8)?,
    created_at:                row.get(9)?,
    modified_at:               row.get(10)?,
  })
}

const COUNTY_COLUMNS: &str = "county_id, name, state, contact_phone, \
   contact_email, website, sale_location, sale_frequency, \
   registration_requirements, created_at, modified_at";

fn property_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawProperty> {
  Ok(RawProperty {
    property_id:    row.get(0)?,
    county_id:      row.get(1)?,
    parcel_id:      row.get(2)?,
    address:        row.get(3)?,
    owner_name:     row.get(4)?,
    assessed_value: row.get(5)?,
    market_value:   row.get(6)?,
    taxes_due:      row.get(7)?,
    property_class: row.get(8)?,
    acreage:        row.get(9)?,
    year_built:     row.get(10)?,
    created_at:     row.get(11)?,
    modified_at:    row.get(12)?,
    row_version:    row.get(13)?,
  })
}

const PROPERTY_COLUMNS: &str = "property_id, county_id, parcel_id, address, \
   owner_name, assessed_value, market_value, taxes_due, property_class, \
   acreage, year_built, created_at, modified_at, row_version";

fn sale_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawSaleHistory> {
  Ok(RawSaleHistory {
    sale_id:             row.get(0)?,
    property_id:         row.get(1)?,
    list_id:             row.get(2)?,
    sale_price:          row.get(3)?,
    buyer_name:          row.get(4)?,
    sale_status:         row.get(5)?,
    redemption_deadline: row.get(6)?,
    redeemed:            row.get(7)?,
    deed_reference:      row.get(8)?,
    created_at:          row.get(9)?,
    modified_at:         row.get(10)?,
    row_version:         row.get(11)?,
  })
}

const SALE_COLUMNS: &str = "sale_id, property_id, list_id, sale_price, \
   buyer_name, sale_status, redemption_deadline, redeemed, deed_reference, \
   created_at, modified_at, row_version";

// ─── Staged operations (run on the database thread) ──────────────────────────

fn row_exists(
  conn: &rusqlite::Connection,
  sql: &str,
  id: &str,
) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(sql, rusqlite::params![id], |_| Ok(true))
      .optional()?
      .unwrap_or(false),
  )
}

fn require_county(conn: &rusqlite::Connection, id: Uuid) -> Result<()> {
  if !row_exists(
    conn,
    "SELECT 1 FROM counties WHERE county_id = ?1",
    &encode_uuid(id),
  )? {
    return Err(Error::Core(CoreError::CountyNotFound(id)));
  }
  Ok(())
}

fn select_property(
  conn: &rusqlite::Connection,
  id: Uuid,
) -> Result<Option<Property>> {
  let raw = conn
    .query_row(
      &format!("SELECT {PROPERTY_COLUMNS} FROM properties WHERE property_id = ?1"),
      rusqlite::params![encode_uuid(id)],
      property_from_row,
    )
    .optional()?;
  raw.map(RawProperty::into_property).transpose()
}

fn select_sale(
  conn: &rusqlite::Connection,
  id: Uuid,
) -> Result<Option<SaleHistory>> {
  let raw = conn
    .query_row(
      &format!("SELECT {SALE_COLUMNS} FROM sale_history WHERE sale_id = ?1"),
      rusqlite::params![encode_uuid(id)],
      sale_from_row,
    )
    .optional()?;
  raw.map(RawSaleHistory::into_sale).transpose()
}

/// The property-update half of the mutation coordinator.
///
/// Everything here happens inside one IMMEDIATE transaction. The primary
/// UPDATE is guarded by the row version read moments earlier; a miss means
/// another writer got in between and the caller must retry with fresh
/// state.
fn stage_property_update(
  conn: &mut rusqlite::Connection,
  id: Uuid,
  patch: &PropertyPatch,
  actor: &str,
) -> Result<Property> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

  let current = select_property(&tx, id)?
    .ok_or(Error::Core(CoreError::PropertyNotFound(id)))?;

  let merged = patch.merge(&current);
  let changes = diff_properties(&current, &merged);
  if changes.is_empty() {
    // No-op update: no history rows, no modified_at bump, no version bump.
    tracing::debug!(property = %id, "no-op property update");
    return Ok(current);
  }

  // Re-ingestion corrections flow through here, so the same plausibility
  // rule as `add_property` applies to the merged state.
  if let Some(amount) = merged.taxes_due
    && !valid_tax_amount(amount)
  {
    return Err(Error::Core(CoreError::ConstraintViolation(format!(
      "taxes_due {amount} is outside the plausible range"
    ))));
  }

  let now = Utc::now();
  let mut updated = merged;
  updated.modified_at = now;
  updated.row_version = current.row_version + 1;

  let affected = tx.execute(
    "UPDATE properties SET
       address = ?1, owner_name = ?2, assessed_value = ?3,
       market_value = ?4, taxes_due = ?5, property_class = ?6,
       acreage = ?7, year_built = ?8, modified_at = ?9, row_version = ?10
     WHERE property_id = ?11 AND row_version = ?12",
    rusqlite::params![
      updated.address,
      updated.owner_name,
      updated.assessed_value.map(|m| m.cents()),
      updated.market_value.map(|m| m.cents()),
      updated.taxes_due.map(|m| m.cents()),
      updated.property_class,
      updated.acreage,
      updated.year_built,
      encode_dt(now),
      updated.row_version,
      encode_uuid(id),
      current.row_version,
    ],
  )?;
  if affected == 0 {
    return Err(Error::Core(CoreError::ConcurrentModification));
  }

  // One audit row per changed field, all sharing the logical timestamp of
  // the modified_at bump. Insertion order preserves declaration order.
  for change in &changes {
    tx.execute(
      "INSERT INTO property_history
         (history_id, property_id, field_name, old_value, new_value,
          changed_at, changed_by)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
      rusqlite::params![
        encode_uuid(Uuid::new_v4()),
        encode_uuid(id),
        change.field_name,
        change.old_value,
        change.new_value,
        encode_dt(now),
        actor,
      ],
    )
    .map_err(|e| Error::Core(CoreError::HistoryWriteFailed(e.to_string())))?;
  }

  tx.commit()?;
  tracing::debug!(
    property = %id,
    fields = changes.len(),
    actor,
    "property update committed"
  );
  Ok(updated)
}

/// The sale-status half of the mutation coordinator.
fn stage_sale_status_update(
  conn: &mut rusqlite::Connection,
  policy: &TransitionPolicy,
  id: Uuid,
  new_status: SaleStatus,
  actor: &str,
  notes: Option<&str>,
) -> Result<SaleHistory> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

  let current =
    select_sale(&tx, id)?.ok_or(Error::Core(CoreError::SaleNotFound(id)))?;

  if current.sale_status == new_status {
    // Synthesized change set is empty: no-op.
    tracing::debug!(sale = %id, status = %new_status, "no-op status update");
    return Ok(current);
  }

  policy
    .validate(current.sale_status, new_status)
    .map_err(Error::Core)?;

  let now = Utc::now();
  let mut updated = current.clone();
  updated.sale_status = new_status;
  // The flag travels with the transition; it can never be raised any
  // other way, which keeps the redemption invariant structural.
  updated.redeemed = new_status == SaleStatus::Redeemed;
  updated.modified_at = now;
  updated.row_version = current.row_version + 1;

  let affected = tx.execute(
    "UPDATE sale_history SET
       sale_status = ?1, redeemed = ?2, modified_at = ?3, row_version = ?4
     WHERE sale_id = ?5 AND row_version = ?6",
    rusqlite::params![
      updated.sale_status.as_str(),
      updated.redeemed,
      encode_dt(now),
      updated.row_version,
      encode_uuid(id),
      current.row_version,
    ],
  )?;
  if affected == 0 {
    return Err(Error::Core(CoreError::ConcurrentModification));
  }

  tx.execute(
    "INSERT INTO sale_status_history
       (history_id, sale_id, old_status, new_status, changed_at,
        changed_by, notes)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    rusqlite::params![
      encode_uuid(Uuid::new_v4()),
      encode_uuid(id),
      current.sale_status.as_str(),
      new_status.as_str(),
      encode_dt(now),
      actor,
      notes,
    ],
  )
  .map_err(|e| Error::Core(CoreError::HistoryWriteFailed(e.to_string())))?;

  tx.commit()?;
  tracing::debug!(
    sale = %id,
    from = %current.sale_status,
    to = %new_status,
    actor,
    "status transition committed"
  );
  Ok(updated)
}

// ─── TaxSaleStore impl ───────────────────────────────────────────────────────

impl TaxSaleStore for SqliteStore {
  type Error = Error;

  // ── Counties ──────────────────────────────────────────────────────────────

  async fn add_county(&self, input: NewCounty) -> Result<County> {
    let now = Utc::now();
    let county = County {
      county_id:                 Uuid::new_v4(),
      name:                      input.name,
      state:                     input.state,
      contact_phone:             input.contact_phone,
      contact_email:             input.contact_email,
      website:                   input.website,
      sale_location:             input.sale_location,
      sale_frequency:            input.sale_frequency,
      registration_requirements: input.registration_requirements,
      created_at:                now,
      modified_at:               now,
    };

    let c = county.clone();
    self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .execute(
              &format!(
                "INSERT INTO counties ({COUNTY_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
              ),
              rusqlite::params![
                encode_uuid(c.county_id),
                c.name,
                c.state,
                c.contact_phone,
                c.contact_email,
                c.website,
                c.sale_location,
                c.sale_frequency,
                c.registration_requirements,
                encode_dt(c.created_at),
                encode_dt(c.modified_at),
              ],
            )
            .map_err(Error::from)
            .map(drop),
        )
      })
      .await??;

    Ok(county)
  }

  async fn get_county(&self, id: Uuid) -> Result<Option<County>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawCounty> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {COUNTY_COLUMNS} FROM counties WHERE county_id = ?1"),
              rusqlite::params![id_str],
              county_from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawCounty::into_county).transpose()
  }

  async fn get_county_by_name(&self, name: &str) -> Result<Option<County>> {
    let name = name.to_owned();
    let raw: Option<RawCounty> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {COUNTY_COLUMNS} FROM counties WHERE name = ?1"),
              rusqlite::params![name],
              county_from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawCounty::into_county).transpose()
  }

  async fn list_counties(&self) -> Result<Vec<County>> {
    let raws: Vec<RawCounty> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {COUNTY_COLUMNS} FROM counties ORDER BY name"
        ))?;
        let rows = stmt
          .query_map([], county_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawCounty::into_county).collect()
  }

  async fn remove_county(&self, id: Uuid) -> Result<()> {
    let out = self
      .conn
      .call(move |conn| {
        let mut stage = || -> Result<()> {
          let tx =
            conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
          require_county(&tx, id)?;
          // Publications and schedules cascade; a county that still has
          // properties trips the foreign key instead, because audit
          // trails are never destroyed implicitly.
          tx.execute(
            "DELETE FROM counties WHERE county_id = ?1",
            rusqlite::params![encode_uuid(id)],
          )?;
          tx.commit()?;
          Ok(())
        };
        Ok(stage())
      })
      .await?;
    out
  }

  // ── Publications ──────────────────────────────────────────────────────────

  async fn add_source_publication(
    &self,
    input: NewSourcePublication,
  ) -> Result<SourcePublication> {
    let publication = SourcePublication {
      publication_id: Uuid::new_v4(),
      county_id:      input.county_id,
      name:           input.name,
      url:            input.url,
      format:         input.format,
      is_primary:     input.is_primary,
      created_at:     Utc::now(),
    };

    let p = publication.clone();
    let out = self
      .conn
      .call(move |conn| {
        let mut stage = || -> Result<()> {
          let tx =
            conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
          require_county(&tx, p.county_id)?;
          tx.execute(
            "INSERT INTO source_publications
               (publication_id, county_id, name, url, format, is_primary,
                created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
              encode_uuid(p.publication_id),
              encode_uuid(p.county_id),
              p.name,
              p.url,
              encode_format(p.format),
              p.is_primary,
              encode_dt(p.created_at),
            ],
          )?;
          tx.commit()?;
          Ok(())
        };
        Ok(stage())
      })
      .await?;
    out?;

    Ok(publication)
  }

  async fn list_source_publications(
    &self,
    county_id: Uuid,
  ) -> Result<Vec<SourcePublication>> {
    let id_str = encode_uuid(county_id);
    let raws: Vec<RawSourcePublication> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT publication_id, county_id, name, url, format, is_primary,
                  created_at
           FROM source_publications WHERE county_id = ?1 ORDER BY name",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawSourcePublication {
              publication_id: row.get(0)?,
              county_id:      row.get(1)?,
              name:           row.get(2)?,
              url:            row.get(3)?,
              format:         row.get(4)?,
              is_primary:     row.get(5)?,
              created_at:     row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws
      .into_iter()
      .map(RawSourcePublication::into_publication)
      .collect()
  }

  async fn add_publication_schedule(
    &self,
    input: NewPublicationSchedule,
  ) -> Result<PublicationSchedule> {
    if input.days_before_sale == 0 {
      return Err(Error::Core(CoreError::ConstraintViolation(
        "days_before_sale must be greater than zero".into(),
      )));
    }

    let schedule = PublicationSchedule {
      schedule_id:      Uuid::new_v4(),
      county_id:        input.county_id,
      days_before_sale: input.days_before_sale,
      publication_type: input.publication_type,
      legal_newspaper:  input.legal_newspaper,
      created_at:       Utc::now(),
    };

    let s = schedule.clone();
    let out = self
      .conn
      .call(move |conn| {
        let mut stage = || -> Result<()> {
          let tx =
            conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
          require_county(&tx, s.county_id)?;
          tx.execute(
            "INSERT INTO publication_schedules
               (schedule_id, county_id, days_before_sale, publication_type,
                legal_newspaper, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
              encode_uuid(s.schedule_id),
              encode_uuid(s.county_id),
              s.days_before_sale,
              s.publication_type,
              s.legal_newspaper,
              encode_dt(s.created_at),
            ],
          )?;
          tx.commit()?;
          Ok(())
        };
        Ok(stage())
      })
      .await?;
    out?;

    Ok(schedule)
  }

  async fn list_publication_schedules(
    &self,
    county_id: Uuid,
  ) -> Result<Vec<PublicationSchedule>> {
    let id_str = encode_uuid(county_id);
    let raws: Vec<RawPublicationSchedule> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT schedule_id, county_id, days_before_sale, publication_type,
                  legal_newspaper, created_at
           FROM publication_schedules WHERE county_id = ?1
           ORDER BY days_before_sale",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawPublicationSchedule {
              schedule_id:      row.get(0)?,
              county_id:        row.get(1)?,
              days_before_sale: row.get(2)?,
              publication_type: row.get(3)?,
              legal_newspaper:  row.get(4)?,
              created_at:       row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws
      .into_iter()
      .map(RawPublicationSchedule::into_schedule)
      .collect()
  }

  // ── Sale lists ────────────────────────────────────────────────────────────

  async fn add_sale_list(&self, input: NewTaxSaleList) -> Result<TaxSaleList> {
    // Date ordering is checked here, before anything touches storage; the
    // CHECK constraint is only the backstop.
    input.validate().map_err(Error::Core)?;

    let now = Utc::now();
    let list = TaxSaleList {
      list_id:          Uuid::new_v4(),
      county_id:        input.county_id,
      sale_date:        input.sale_date,
      publication_date: input.publication_date,
      status:           input.status,
      property_count:   input.property_count,
      source:           input.source,
      created_at:       now,
      modified_at:      now,
    };

    let l = list.clone();
    let out = self
      .conn
      .call(move |conn| {
        let mut stage = || -> Result<()> {
          let tx =
            conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
          require_county(&tx, l.county_id)?;
          tx.execute(
            "INSERT INTO tax_sale_lists
               (list_id, county_id, sale_date, publication_date, status,
                property_count, source, created_at, modified_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
              encode_uuid(l.list_id),
              encode_uuid(l.county_id),
              encode_date(l.sale_date),
              encode_date(l.publication_date),
              l.status,
              l.property_count,
              l.source,
              encode_dt(l.created_at),
              encode_dt(l.modified_at),
            ],
          )?;
          tx.commit()?;
          Ok(())
        };
        Ok(stage())
      })
      .await?;
    out?;

    Ok(list)
  }

  async fn get_sale_list(&self, id: Uuid) -> Result<Option<TaxSaleList>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawTaxSaleList> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT list_id, county_id, sale_date, publication_date,
                      status, property_count, source, created_at, modified_at
               FROM tax_sale_lists WHERE list_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawTaxSaleList {
                  list_id:          row.get(0)?,
                  county_id:        row.get(1)?,
                  sale_date:        row.get(2)?,
                  publication_date: row.get(3)?,
                  status:           row.get(4)?,
                  property_count:   row.get(5)?,
                  source:           row.get(6)?,
                  created_at:       row.get(7)?,
                  modified_at:      row.get(8)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawTaxSaleList::into_list).transpose()
  }

  // ── Properties ────────────────────────────────────────────────────────────

  async fn add_property(&self, input: NewProperty) -> Result<Property> {
    if let Some(amount) = input.taxes_due
      && !valid_tax_amount(amount)
    {
      return Err(Error::Core(CoreError::ConstraintViolation(format!(
        "taxes_due {amount} is outside the plausible range"
      ))));
    }

    let now = Utc::now();
    let property = Property {
      property_id:    Uuid::new_v4(),
      county_id:      input.county_id,
      parcel_id:      input.parcel_id,
      address:        input.address,
      owner_name:     input.owner_name,
      assessed_value: input.assessed_value,
      market_value:   input.market_value,
      taxes_due:      input.taxes_due,
      property_class: input.property_class,
      acreage:        input.acreage,
      year_built:     input.year_built,
      created_at:     now,
      modified_at:    now,
      row_version:    1,
    };

    let p = property.clone();
    let out = self
      .conn
      .call(move |conn| {
        let mut stage = || -> Result<()> {
          let tx =
            conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
          require_county(&tx, p.county_id)?;
          tx.execute(
            &format!(
              "INSERT INTO properties ({PROPERTY_COLUMNS})
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                       ?13, ?14)"
            ),
            rusqlite::params![
              encode_uuid(p.property_id),
              encode_uuid(p.county_id),
              p.parcel_id,
              p.address,
              p.owner_name,
              p.assessed_value.map(|m| m.cents()),
              p.market_value.map(|m| m.cents()),
              p.taxes_due.map(|m| m.cents()),
              p.property_class,
              p.acreage,
              p.year_built,
              encode_dt(p.created_at),
              encode_dt(p.modified_at),
              p.row_version,
            ],
          )?;
          tx.commit()?;
          Ok(())
        };
        Ok(stage())
      })
      .await?;
    out?;

    Ok(property)
  }

  async fn get_property(&self, id: Uuid) -> Result<Option<Property>> {
    self.conn.call(move |conn| Ok(select_property(conn, id))).await?
  }

  async fn apply_property_update(
    &self,
    id: Uuid,
    patch: PropertyPatch,
    actor: &str,
  ) -> Result<Property> {
    require_actor(actor)?;
    let actor = actor.to_owned();
    self
      .conn
      .call(move |conn| Ok(stage_property_update(conn, id, &patch, &actor)))
      .await?
  }

  async fn get_property_history(
    &self,
    property_id: Uuid,
  ) -> Result<Vec<PropertyHistory>> {
    let id_str = encode_uuid(property_id);
    let raws: Vec<RawPropertyHistory> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT history_id, property_id, field_name, old_value, new_value,
                  changed_at, changed_by
           FROM property_history WHERE property_id = ?1
           ORDER BY changed_at, rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawPropertyHistory {
              history_id:  row.get(0)?,
              property_id: row.get(1)?,
              field_name:  row.get(2)?,
              old_value:   row.get(3)?,
              new_value:   row.get(4)?,
              changed_at:  row.get(5)?,
              changed_by:  row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws
      .into_iter()
      .map(RawPropertyHistory::into_history)
      .collect()
  }

  // ── Sale records ──────────────────────────────────────────────────────────

  async fn add_sale_record(&self, input: NewSaleHistory) -> Result<SaleHistory> {
    self
      .policy
      .validate_redemption(input.sale_status, input.redeemed)
      .map_err(Error::Core)?;

    let now = Utc::now();
    let sale = SaleHistory {
      sale_id:             Uuid::new_v4(),
      property_id:         input.property_id,
      list_id:             input.list_id,
      sale_price:          input.sale_price,
      buyer_name:          input.buyer_name,
      sale_status:         input.sale_status,
      redemption_deadline: input.redemption_deadline,
      redeemed:            input.redeemed,
      deed_reference:      input.deed_reference,
      created_at:          now,
      modified_at:         now,
      row_version:         1,
    };

    let s = sale.clone();
    let out = self
      .conn
      .call(move |conn| {
        let mut stage = || -> Result<()> {
          let tx =
            conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
          if !row_exists(
            &tx,
            "SELECT 1 FROM properties WHERE property_id = ?1",
            &encode_uuid(s.property_id),
          )? {
            return Err(Error::Core(CoreError::PropertyNotFound(s.property_id)));
          }
          if !row_exists(
            &tx,
            "SELECT 1 FROM tax_sale_lists WHERE list_id = ?1",
            &encode_uuid(s.list_id),
          )? {
            return Err(Error::Core(CoreError::ListNotFound(s.list_id)));
          }
          tx.execute(
            &format!(
              "INSERT INTO sale_history ({SALE_COLUMNS})
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
            ),
            rusqlite::params![
              encode_uuid(s.sale_id),
              encode_uuid(s.property_id),
              encode_uuid(s.list_id),
              s.sale_price.map(|m| m.cents()),
              s.buyer_name,
              s.sale_status.as_str(),
              s.redemption_deadline.map(encode_date),
              s.redeemed,
              s.deed_reference,
              encode_dt(s.created_at),
              encode_dt(s.modified_at),
              s.row_version,
            ],
          )?;
          tx.commit()?;
          Ok(())
        };
        Ok(stage())
      })
      .await?;
    out?;

    Ok(sale)
  }

  async fn get_sale_record(&self, id: Uuid) -> Result<Option<SaleHistory>> {
    self.conn.call(move |conn| Ok(select_sale(conn, id))).await?
  }

  async fn apply_sale_status_update(
    &self,
    id: Uuid,
    new_status: SaleStatus,
    actor: &str,
    notes: Option<String>,
  ) -> Result<SaleHistory> {
    require_actor(actor)?;
    let actor = actor.to_owned();
    let policy = Arc::clone(&self.policy);
    self
      .conn
      .call(move |conn| {
        Ok(stage_sale_status_update(
          conn,
          &policy,
          id,
          new_status,
          &actor,
          notes.as_deref(),
        ))
      })
      .await?
  }

  async fn get_sale_status_history(
    &self,
    sale_id: Uuid,
  ) -> Result<Vec<SaleStatusHistory>> {
    let id_str = encode_uuid(sale_id);
    let raws: Vec<RawSaleStatusHistory> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT history_id, sale_id, old_status, new_status, changed_at,
                  changed_by, notes
           FROM sale_status_history WHERE sale_id = ?1
           ORDER BY changed_at, rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawSaleStatusHistory {
              history_id: row.get(0)?,
              sale_id:    row.get(1)?,
              old_status: row.get(2)?,
              new_status: row.get(3)?,
              changed_at: row.get(4)?,
              changed_by: row.get(5)?,
              notes:      row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws
      .into_iter()
      .map(RawSaleStatusHistory::into_history)
      .collect()
  }
}
