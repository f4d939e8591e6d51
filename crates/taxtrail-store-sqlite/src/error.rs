//! Error type for `taxtrail-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Domain-level rejection or invariant breach, surfaced unchanged from
  /// the core taxonomy (`NotFound`, `InvalidStatusTransition`,
  /// `ConcurrentModification`, `HistoryWriteFailed`, ...).
  #[error(transparent)]
  Core(#[from] taxtrail_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A `sale_status` column value outside the closed enumeration. Only
  /// possible if the database was written by something other than this
  /// engine.
  #[error("unknown sale status in storage: {0:?}")]
  UnknownStatus(String),

  /// A `format` column value outside the closed enumeration.
  #[error("unknown source format in storage: {0:?}")]
  UnknownFormat(String),
}

/// Map raw SQLite failures onto the domain taxonomy where one applies:
/// busy/locked means a bounded lock wait expired (the caller may retry
/// with fresh state), and constraint failures surface the violated rule.
impl From<rusqlite::Error> for Error {
  fn from(e: rusqlite::Error) -> Self {
    use rusqlite::ErrorCode;

    if let rusqlite::Error::SqliteFailure(failure, ref message) = e {
      match failure.code {
        ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => {
          return Error::Core(taxtrail_core::Error::ConcurrentModification);
        }
        ErrorCode::ConstraintViolation => {
          return Error::Core(taxtrail_core::Error::ConstraintViolation(
            message.clone().unwrap_or_else(|| failure.to_string()),
          ));
        }
        _ => {}
      }
    }

    Error::Database(tokio_rusqlite::Error::Rusqlite(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
