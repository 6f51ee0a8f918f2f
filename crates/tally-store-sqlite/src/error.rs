//! Error type for `tally-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("decimal parse error: {0}")]
  Decimal(#[from] rust_decimal::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored label that no domain enum recognises.
  #[error("unknown {kind} in database: {value:?}")]
  UnknownLabel { kind: &'static str, value: String },

  /// A sum over stored hours left the representable range.
  #[error("{0} overflowed")]
  Overflow(&'static str),

  /// The row's `version` no longer matches the one that was read.
  #[error("{entity} {id} was modified concurrently")]
  VersionConflict { entity: &'static str, id: uuid::Uuid },
}

impl Error {
  fn is_busy(&self) -> bool {
    let inner = match self {
      Self::Sqlite(e) | Self::Database(tokio_rusqlite::Error::Rusqlite(e)) => e,
      _ => return false,
    };
    matches!(
      inner.sqlite_error_code(),
      Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
    )
  }
}

/// Version conflicts and lock contention become retryable
/// [`tally_core::Error::Conflict`]s and overflowing sums become validation
/// errors. Everything else is a persistence failure.
impl From<Error> for tally_core::Error {
  fn from(e: Error) -> Self {
    match e {
      e @ Error::VersionConflict { .. } => Self::Conflict(e.to_string()),
      e if e.is_busy() => Self::Conflict(e.to_string()),
      e @ Error::Overflow(_) => Self::Validation(e.to_string()),
      other => Self::Persistence(Box::new(other)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
