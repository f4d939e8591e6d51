//! The `TaxSaleStore` trait.
//!
//! Implemented by storage backends (e.g. `taxtrail-store-sqlite`). The
//! ingestion and administration layers depend on this abstraction, not on
//! any concrete backend.
//!
//! The two `apply_*` methods are the mutation coordinator's surface. Both
//! are all-or-nothing: the primary row write and its history rows commit
//! as a single atomic unit, and any rejection or failure leaves storage in
//! its pre-call state.

use std::future::Future;

use uuid::Uuid;

use crate::{
  change::PropertyPatch,
  county::{
    County, NewCounty, NewPublicationSchedule, NewSourcePublication,
    PublicationSchedule, SourcePublication,
  },
  history::{PropertyHistory, SaleStatusHistory},
  property::{NewProperty, Property},
  sale::{NewSaleHistory, NewTaxSaleList, SaleHistory, TaxSaleList},
  status::SaleStatus,
};

/// Abstraction over a Taxtrail storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait TaxSaleStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Counties ──────────────────────────────────────────────────────────

  /// Create and persist a county. Duplicate names are a constraint
  /// violation.
  fn add_county(
    &self,
    input: NewCounty,
  ) -> impl Future<Output = Result<County, Self::Error>> + Send + '_;

  /// Retrieve a county by id. Returns `None` if not found.
  fn get_county(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<County>, Self::Error>> + Send + '_;

  /// Retrieve a county by its unique name.
  fn get_county_by_name<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<County>, Self::Error>> + Send + 'a;

  fn list_counties(
    &self,
  ) -> impl Future<Output = Result<Vec<County>, Self::Error>> + Send + '_;

  /// Remove a county. Its source publications and publication schedules
  /// are cascade-deleted; a county that still has properties is a
  /// constraint violation, since property audit trails must never be
  /// destroyed implicitly.
  fn remove_county(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Publications ──────────────────────────────────────────────────────

  fn add_source_publication(
    &self,
    input: NewSourcePublication,
  ) -> impl Future<Output = Result<SourcePublication, Self::Error>> + Send + '_;

  fn list_source_publications(
    &self,
    county_id: Uuid,
  ) -> impl Future<Output = Result<Vec<SourcePublication>, Self::Error>> + Send + '_;

  /// `days_before_sale` must be greater than zero; zero is rejected before
  /// anything is staged.
  fn add_publication_schedule(
    &self,
    input: NewPublicationSchedule,
  ) -> impl Future<Output = Result<PublicationSchedule, Self::Error>> + Send + '_;

  fn list_publication_schedules(
    &self,
    county_id: Uuid,
  ) -> impl Future<Output = Result<Vec<PublicationSchedule>, Self::Error>> + Send + '_;

  // ── Sale lists ────────────────────────────────────────────────────────

  /// Create a sale event. `publication_date < sale_date` is validated in
  /// code before the insert is staged.
  fn add_sale_list(
    &self,
    input: NewTaxSaleList,
  ) -> impl Future<Output = Result<TaxSaleList, Self::Error>> + Send + '_;

  fn get_sale_list(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<TaxSaleList>, Self::Error>> + Send + '_;

  // ── Properties ────────────────────────────────────────────────────────

  /// Create a parcel record. A duplicate `(county_id, parcel_id)` pair or
  /// an implausible `taxes_due` amount is a constraint violation.
  fn add_property(
    &self,
    input: NewProperty,
  ) -> impl Future<Output = Result<Property, Self::Error>> + Send + '_;

  fn get_property(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Property>, Self::Error>> + Send + '_;

  /// Apply a field-level update on behalf of `actor`, auditing every
  /// changed field into `property_history` atomically with the row write.
  ///
  /// An update that changes nothing returns the current row unchanged:
  /// no history rows, no `modified_at` bump, no version bump.
  fn apply_property_update<'a>(
    &'a self,
    id: Uuid,
    patch: PropertyPatch,
    actor: &'a str,
  ) -> impl Future<Output = Result<Property, Self::Error>> + Send + 'a;

  /// All audit rows for a property, oldest first; rows sharing a logical
  /// timestamp keep their staged (declaration) order.
  fn get_property_history(
    &self,
    property_id: Uuid,
  ) -> impl Future<Output = Result<Vec<PropertyHistory>, Self::Error>> + Send + '_;

  // ── Sale records ──────────────────────────────────────────────────────

  /// Create a sale participation record. `redeemed = true` with any
  /// status other than `redeemed` is rejected.
  fn add_sale_record(
    &self,
    input: NewSaleHistory,
  ) -> impl Future<Output = Result<SaleHistory, Self::Error>> + Send + '_;

  fn get_sale_record(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<SaleHistory>, Self::Error>> + Send + '_;

  /// Transition a sale record's status on behalf of `actor`, auditing the
  /// transition into `sale_status_history` atomically with the row write.
  ///
  /// The transition must be permitted by the store's
  /// [`crate::status::TransitionPolicy`]; a rejected transition leaves
  /// storage untouched. Proposing the current status is a no-op and
  /// returns the record unchanged. Transitioning to `redeemed` raises the
  /// `redeemed` flag in the same write.
  fn apply_sale_status_update<'a>(
    &'a self,
    id: Uuid,
    new_status: SaleStatus,
    actor: &'a str,
    notes: Option<String>,
  ) -> impl Future<Output = Result<SaleHistory, Self::Error>> + Send + 'a;

  /// All status transitions for a sale record, oldest first.
  fn get_sale_status_history(
    &self,
    sale_id: Uuid,
  ) -> impl Future<Output = Result<Vec<SaleStatusHistory>, Self::Error>> + Send + '_;
}
