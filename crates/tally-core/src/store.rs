//! The `HoursStore` and `UnitOfWork` traits and supporting query types.
//!
//! The traits are implemented by storage backends (e.g. `tally-store-sqlite`).
//! Higher layers depend on this abstraction, not on any concrete backend.

use std::{collections::BTreeMap, future::Future};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::{
  Result,
  submission::{StatusKind, Submission},
  tier::Tier,
  volunteer::{Role, Volunteer},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`HoursStore::list_submissions`]. Results are ordered by
/// `submitted_at`, newest first.
#[derive(Debug, Clone, Default)]
pub struct SubmissionQuery {
  pub volunteer_id: Option<Uuid>,
  pub status:       Option<StatusKind>,
  /// Inclusive lower bound on `service_date`.
  pub service_from: Option<NaiveDate>,
  /// Inclusive upper bound on `service_date`.
  pub service_to:   Option<NaiveDate>,
  pub limit:        Option<usize>,
  pub offset:       Option<usize>,
}

/// Organisation-wide figures for the admin overview.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LedgerStats {
  pub total_volunteers:    u64,
  pub total_hours:         Decimal,
  pub pending_submissions: u64,
  pub tier_distribution:   BTreeMap<Tier, u64>,
}

// ─── Unit of work ────────────────────────────────────────────────────────────

/// Reads and writes that commit or roll back together.
///
/// Handed to the closure passed to [`HoursStore::execute`]. The `save_*`
/// methods compare the record's `version` with the stored one, fail with
/// [`crate::Error::Conflict`] on mismatch, and bump the version on success.
pub trait UnitOfWork {
  fn load_submission(&mut self, id: Uuid) -> Result<Option<Submission>>;

  fn load_volunteer(&mut self, id: Uuid) -> Result<Option<Volunteer>>;

  /// `email` is compared case-insensitively.
  fn find_volunteer_by_email(&mut self, email: &str) -> Result<Option<Volunteer>>;

  fn find_volunteer_by_referral_code(&mut self, code: &str) -> Result<Option<Volunteer>>;

  /// Every submission owned by `volunteer_id`, in any state.
  fn submissions_for(&mut self, volunteer_id: Uuid) -> Result<Vec<Submission>>;

  fn insert_submission(&mut self, submission: &Submission) -> Result<()>;

  fn insert_volunteer(&mut self, volunteer: &Volunteer) -> Result<()>;

  fn save_submission(&mut self, submission: &mut Submission) -> Result<()>;

  fn save_volunteer(&mut self, volunteer: &mut Volunteer) -> Result<()>;

  /// Persist a submission transition together with its accrual effect.
  fn save_both(&mut self, submission: &mut Submission, volunteer: &mut Volunteer) -> Result<()> {
    self.save_submission(submission)?;
    self.save_volunteer(volunteer)
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Tally storage backend.
///
/// Every mutation goes through [`HoursStore::execute`]; the read methods are
/// for reporting and never observe a half-applied unit of work.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait HoursStore: Send + Sync {
  /// Run `work` atomically. If it returns `Err`, nothing it wrote is kept.
  fn execute<T, F>(&self, work: F) -> impl Future<Output = Result<T>> + Send + '_
  where
    T: Send + 'static,
    F: FnOnce(&mut dyn UnitOfWork) -> Result<T> + Send + 'static;

  // ── Reads ─────────────────────────────────────────────────────────────

  fn get_submission(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Submission>>> + Send + '_;

  fn get_volunteer(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Volunteer>>> + Send + '_;

  /// Used by the authentication layer to resolve login identities.
  fn find_volunteer_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Volunteer>>> + Send + 'a;

  fn list_submissions<'a>(
    &'a self,
    query: &'a SubmissionQuery,
  ) -> impl Future<Output = Result<Vec<Submission>>> + Send + 'a;

  /// Volunteers ordered by `total_hours`, highest first.
  fn list_volunteers(
    &self,
    role: Option<Role>,
  ) -> impl Future<Output = Result<Vec<Volunteer>>> + Send + '_;

  /// Figures over users with [`Role::Volunteer`].
  fn stats(&self) -> impl Future<Output = Result<LedgerStats>> + Send + '_;
}
