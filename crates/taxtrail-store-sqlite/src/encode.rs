//! Encoding and decoding helpers between the core domain types and the
//! plain representations stored in SQLite columns.
//!
//! UUIDs are hyphenated lowercase strings, timestamps are RFC 3339
//! strings, calendar dates are `YYYY-MM-DD` strings, money is whole cents
//! (INTEGER), and the closed enumerations store their snake_case
//! discriminants.

use chrono::{DateTime, NaiveDate, Utc};
use taxtrail_core::{
  county::{County, PublicationSchedule, SourceFormat, SourcePublication},
  history::{PropertyHistory, SaleStatusHistory},
  money::Money,
  property::Property,
  sale::{SaleHistory, TaxSaleList},
  status::SaleStatus,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalar codecs ───────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_status(s: &str) -> Result<SaleStatus> {
  SaleStatus::parse(s).ok_or_else(|| Error::UnknownStatus(s.to_owned()))
}

pub fn encode_format(f: SourceFormat) -> &'static str {
  match f {
    SourceFormat::Html => "html",
    SourceFormat::Pdf => "pdf",
    SourceFormat::Csv => "csv",
    SourceFormat::Api => "api",
  }
}

pub fn decode_format(s: &str) -> Result<SourceFormat> {
  match s {
    "html" => Ok(SourceFormat::Html),
    "pdf" => Ok(SourceFormat::Pdf),
    "csv" => Ok(SourceFormat::Csv),
    "api" => Ok(SourceFormat::Api),
    other => Err(Error::UnknownFormat(other.to_owned())),
  }
}

fn decode_money(cents: Option<i64>) -> Option<Money> {
  cents.map(Money::from_cents)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `counties` row.
pub struct RawCounty {
  pub county_id:                 String,
  pub name:                      String,
  pub state:                     String,
  pub contact_phone:             Option<String>,
  pub contact_email:             Option<String>,
  pub website:                   Option<String>,
  pub sale_location:             Option<String>,
  pub sale_frequency:            Option<String>,
  pub registration_requirements: Option<String>,
  pub created_at:                String,
  pub modified_at:               String,
}

impl RawCounty {
  pub fn into_county(self) -> Result<County> {
    Ok(County {
      county_id:                 decode_uuid(&self.county_id)?,
      name:                      self.name,
      state:                     self.state,
      contact_phone:             self.contact_phone,
      contact_email:             self.contact_email,
      website:                   self.website,
      sale_location:             self.sale_location,
      sale_frequency:            self.sale_frequency,
      registration_requirements: self.registration_requirements,
      created_at:                decode_dt(&self.created_at)?,
      modified_at:               decode_dt(&self.modified_at)?,
    })
  }
}

/// Raw values read directly from a `source_publications` row.
pub struct RawSourcePublication {
  pub publication_id: String,
  pub county_id:      String,
  pub name:           String,
  pub url:            Option<String>,
  pub format:         String,
  pub is_primary:     bool,
  pub created_at:     String,
}

impl RawSourcePublication {
  pub fn into_publication(self) -> Result<SourcePublication> {
    Ok(SourcePublication {
      publication_id: decode_uuid(&self.publication_id)?,
      county_id:      decode_uuid(&self.county_id)?,
      name:           self.name,
      url:            self.url,
      format:         decode_format(&self.format)?,
      is_primary:     self.is_primary,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `publication_schedules` row.
pub struct RawPublicationSchedule {
  pub schedule_id:      String,
  pub county_id:        String,
  pub days_before_sale: i64,
  pub publication_type: String,
  pub legal_newspaper:  Option<String>,
  pub created_at:       String,
}

impl RawPublicationSchedule {
  pub fn into_schedule(self) -> Result<PublicationSchedule> {
    Ok(PublicationSchedule {
      schedule_id:      decode_uuid(&self.schedule_id)?,
      county_id:        decode_uuid(&self.county_id)?,
      days_before_sale: self.days_before_sale as u32,
      publication_type: self.publication_type,
      legal_newspaper:  self.legal_newspaper,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `tax_sale_lists` row.
pub struct RawTaxSaleList {
  pub list_id:          String,
  pub county_id:        String,
  pub sale_date:        String,
  pub publication_date: String,
  pub status:           String,
  pub property_count:   i64,
  pub source:           Option<String>,
  pub created_at:       String,
  pub modified_at:      String,
}

impl RawTaxSaleList {
  pub fn into_list(self) -> Result<TaxSaleList> {
    Ok(TaxSaleList {
      list_id:          decode_uuid(&self.list_id)?,
      county_id:        decode_uuid(&self.county_id)?,
      sale_date:        decode_date(&self.sale_date)?,
      publication_date: decode_date(&self.publication_date)?,
      status:           self.status,
      property_count:   self.property_count as u32,
      source:           self.source,
      created_at:       decode_dt(&self.created_at)?,
      modified_at:      decode_dt(&self.modified_at)?,
    })
  }
}

/// Raw values read directly from a `properties` row.
pub struct RawProperty {
  pub property_id:    String,
  pub county_id:      String,
  pub parcel_id:      String,
  pub address:        Option<String>,
  pub owner_name:     Option<String>,
  pub assessed_value: Option<i64>,
  pub market_value:   Option<i64>,
  pub taxes_due:      Option<i64>,
  pub property_class: Option<String>,
  pub acreage:        Option<f64>,
  pub year_built:     Option<i32>,
  pub created_at:     String,
  pub modified_at:    String,
  pub row_version:    i64,
}

impl RawProperty {
  pub fn into_property(self) -> Result<Property> {
    Ok(Property {
      property_id:    decode_uuid(&self.property_id)?,
      county_id:      decode_uuid(&self.county_id)?,
      parcel_id:      self.parcel_id,
      address:        self.address,
      owner_name:     self.owner_name,
      assessed_value: decode_money(self.assessed_value),
      market_value:   decode_money(self.market_value),
      taxes_due:      decode_money(self.taxes_due),
      property_class: self.property_class,
      acreage:        self.acreage,
      year_built:     self.year_built,
      created_at:     decode_dt(&self.created_at)?,
      modified_at:    decode_dt(&self.modified_at)?,
      row_version:    self.row_version,
    })
  }
}

/// Raw values read directly from a `sale_history` row.
pub struct RawSaleHistory {
  pub sale_id:             String,
  pub property_id:         String,
  pub list_id:             String,
  pub sale_price:          Option<i64>,
  pub buyer_name:          Option<String>,
  pub sale_status:         String,
  pub redemption_deadline: Option<String>,
  pub redeemed:            bool,
  pub deed_reference:      Option<String>,
  pub created_at:          String,
  pub modified_at:         String,
  pub row_version:         i64,
}

impl RawSaleHistory {
  pub fn into_sale(self) -> Result<SaleHistory> {
    Ok(SaleHistory {
      sale_id:             decode_uuid(&self.sale_id)?,
      property_id:         decode_uuid(&self.property_id)?,
      list_id:             decode_uuid(&self.list_id)?,
      sale_price:          decode_money(self.sale_price),
      buyer_name:          self.buyer_name,
      sale_status:         decode_status(&self.sale_status)?,
      redemption_deadline: self
        .redemption_deadline
        .as_deref()
        .map(decode_date)
        .transpose()?,
      redeemed:            self.redeemed,
      deed_reference:      self.deed_reference,
      created_at:          decode_dt(&self.created_at)?,
      modified_at:         decode_dt(&self.modified_at)?,
      row_version:         self.row_version,
    })
  }
}

/// Raw values read directly from a `property_history` row.
pub struct RawPropertyHistory {
  pub history_id:  String,
  pub property_id: String,
  pub field_name:  String,
  pub old_value:   Option<String>,
  pub new_value:   Option<String>,
  pub changed_at:  String,
  pub changed_by:  String,
}

impl RawPropertyHistory {
  pub fn into_history(self) -> Result<PropertyHistory> {
    Ok(PropertyHistory {
      history_id:  decode_uuid(&self.history_id)?,
      property_id: decode_uuid(&self.property_id)?,
      field_name:  self.field_name,
      old_value:   self.old_value,
      new_value:   self.new_value,
      changed_at:  decode_dt(&self.changed_at)?,
      changed_by:  self.changed_by,
    })
  }
}

/// Raw values read directly from a `sale_status_history` row.
pub struct RawSaleStatusHistory {
  pub history_id: String,
  pub sale_id:    String,
  pub old_status: String,
  pub new_status: String,
  pub changed_at: String,
  pub changed_by: String,
  pub notes:      Option<String>,
}

impl RawSaleStatusHistory {
  pub fn into_history(self) -> Result<SaleStatusHistory> {
    Ok(SaleStatusHistory {
      history_id: decode_uuid(&self.history_id)?,
      sale_id:    decode_uuid(&self.sale_id)?,
      old_status: decode_status(&self.old_status)?,
      new_status: decode_status(&self.new_status)?,
      changed_at: decode_dt(&self.changed_at)?,
      changed_by: self.changed_by,
      notes:      self.notes,
    })
  }
}
