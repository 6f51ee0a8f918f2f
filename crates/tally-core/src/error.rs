//! Error types for `tally-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// Malformed input to an operation; the message says what to fix.
  #[error("validation failed: {0}")]
  Validation(String),

  #[error("submission not found: {0}")]
  SubmissionNotFound(Uuid),

  #[error("volunteer not found: {0}")]
  VolunteerNotFound(Uuid),

  #[error("forbidden: {0}")]
  Forbidden(String),

  /// A record changed underneath a unit of work (stale version).
  #[error("conflict: {0}")]
  Conflict(String),

  #[error("persistence error: {0}")]
  Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }

  pub fn forbidden(msg: impl Into<String>) -> Self { Self::Forbidden(msg.into()) }

  pub fn is_conflict(&self) -> bool { matches!(self, Self::Conflict(_)) }

  pub fn is_not_found(&self) -> bool {
    matches!(self, Self::SubmissionNotFound(_) | Self::VolunteerNotFound(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
