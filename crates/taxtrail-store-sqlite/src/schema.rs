//! SQL schema for the Taxtrail SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated
//! on `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Monetary columns hold whole cents as INTEGER. Timestamps are RFC 3339
/// UTC strings; calendar dates are `YYYY-MM-DD` strings, which makes the
/// `publication_date < sale_date` CHECK a plain text comparison.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
PRAGMA busy_timeout = 5000;

CREATE TABLE IF NOT EXISTS counties (
    county_id                 TEXT PRIMARY KEY,
    name                      TEXT NOT NULL UNIQUE,
    state                     TEXT NOT NULL,
    contact_phone             TEXT,
    contact_email             TEXT,
    website                   TEXT,
    sale_location             TEXT,
    sale_frequency            TEXT,
    registration_requirements TEXT,
    created_at                TEXT NOT NULL,
    modified_at               TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS source_publications (
    publication_id TEXT PRIMARY KEY,
    county_id      TEXT NOT NULL REFERENCES counties(county_id) ON DELETE CASCADE,
    name           TEXT NOT NULL,
    url            TEXT,
    format         TEXT NOT NULL,    -- 'html' | 'pdf' | 'csv' | 'api'
    is_primary     INTEGER NOT NULL DEFAULT 0,
    created_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS publication_schedules (
    schedule_id      TEXT PRIMARY KEY,
    county_id        TEXT NOT NULL REFERENCES counties(county_id) ON DELETE CASCADE,
    days_before_sale INTEGER NOT NULL CHECK (days_before_sale > 0),
    publication_type TEXT NOT NULL,
    legal_newspaper  TEXT,
    created_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tax_sale_lists (
    list_id          TEXT PRIMARY KEY,
    county_id        TEXT NOT NULL REFERENCES counties(county_id),
    sale_date        TEXT NOT NULL,
    publication_date TEXT NOT NULL,
    status           TEXT NOT NULL,
    property_count   INTEGER NOT NULL DEFAULT 0,
    source           TEXT,
    created_at       TEXT NOT NULL,
    modified_at      TEXT NOT NULL,
    CHECK (publication_date < sale_date)
);

CREATE TABLE IF NOT EXISTS properties (
    property_id    TEXT PRIMARY KEY,
    county_id      TEXT NOT NULL REFERENCES counties(county_id),
    parcel_id      TEXT NOT NULL,
    address        TEXT,
    owner_name     TEXT,
    assessed_value INTEGER,          -- cents
    market_value   INTEGER,          -- cents
    taxes_due      INTEGER,          -- cents
    property_class TEXT,
    acreage        REAL,
    year_built     INTEGER,
    created_at     TEXT NOT NULL,
    modified_at    TEXT NOT NULL,
    row_version    INTEGER NOT NULL DEFAULT 1,
    UNIQUE (county_id, parcel_id)
);

CREATE TABLE IF NOT EXISTS sale_history (
    sale_id             TEXT PRIMARY KEY,
    property_id         TEXT NOT NULL REFERENCES properties(property_id),
    list_id             TEXT NOT NULL REFERENCES tax_sale_lists(list_id),
    sale_price          INTEGER,     -- cents
    buyer_name          TEXT,
    sale_status         TEXT NOT NULL DEFAULT 'scheduled',
    redemption_deadline TEXT,
    redeemed            INTEGER NOT NULL DEFAULT 0,
    deed_reference      TEXT,
    created_at          TEXT NOT NULL,
    modified_at         TEXT NOT NULL,
    row_version         INTEGER NOT NULL DEFAULT 1
);

-- Audit rows are strictly append-only.
-- No UPDATE or DELETE is ever issued against these two tables.
CREATE TABLE IF NOT EXISTS property_history (
    history_id  TEXT PRIMARY KEY,
    property_id TEXT NOT NULL REFERENCES properties(property_id),
    field_name  TEXT NOT NULL,
    old_value   TEXT,
    new_value   TEXT,
    changed_at  TEXT NOT NULL,
    changed_by  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sale_status_history (
    history_id TEXT PRIMARY KEY,
    sale_id    TEXT NOT NULL REFERENCES sale_history(sale_id),
    old_status TEXT NOT NULL,
    new_status TEXT NOT NULL,
    changed_at TEXT NOT NULL,
    changed_by TEXT NOT NULL,
    notes      TEXT
);

CREATE INDEX IF NOT EXISTS properties_county_idx       ON properties(county_id);
CREATE INDEX IF NOT EXISTS sale_history_property_idx   ON sale_history(property_id);
CREATE INDEX IF NOT EXISTS sale_history_list_idx       ON sale_history(list_id);
CREATE INDEX IF NOT EXISTS property_history_prop_idx   ON property_history(property_id);
CREATE INDEX IF NOT EXISTS sale_status_history_sale_idx ON sale_status_history(sale_id);

PRAGMA user_version = 1;
";
