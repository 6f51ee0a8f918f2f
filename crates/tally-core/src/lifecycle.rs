//! The submission state machine.
//!
//! ```text
//!            review(approve)            review(reject)
//!   pending ─────────────────▶ approved ───────────────▶ rejected
//!      │  ▲                       │  ▲                      │
//!      │  └──────── reopen ───────┘  └──── review(approve) ─┘
//!      └──────── review(reject) ────────────────────────────▶
//! ```
//!
//! Functions here only decide *what* a transition means for the accrual; the
//! [`crate::Ledger`] carries it out.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Error, Result,
  submission::{StatusKind, Submission, SubmissionStatus},
  volunteer::Actor,
};

// ─── Decisions ───────────────────────────────────────────────────────────────

/// A reviewer's verdict on a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
  Approve,
  Reject { reason: String },
}

impl Decision {
  /// A rejection must say why.
  pub fn reject(reason: impl Into<String>) -> Result<Self> {
    let reason = reason.into();
    if reason.trim().is_empty() {
      return Err(Error::validation("a rejection reason is required"));
    }
    Ok(Self::Reject { reason: reason.trim().to_owned() })
  }

  /// Build a decision from a requested status and optional reason.
  pub fn from_parts(status: StatusKind, reason: Option<String>) -> Result<Self> {
    match status {
      StatusKind::Approved => Ok(Self::Approve),
      StatusKind::Rejected => Self::reject(reason.unwrap_or_default()),
      StatusKind::Pending => Err(Error::validation(
        "review decision must be \"approved\" or \"rejected\"",
      )),
    }
  }

  pub fn target(&self) -> StatusKind {
    match self {
      Self::Approve => StatusKind::Approved,
      Self::Reject { .. } => StatusKind::Rejected,
    }
  }

  pub fn into_status(self, reviewed_by: Uuid, reviewed_at: DateTime<Utc>) -> SubmissionStatus {
    match self {
      Self::Approve => SubmissionStatus::Approved { reviewed_at, reviewed_by },
      Self::Reject { reason } => SubmissionStatus::Rejected {
        reviewed_at,
        reviewed_by,
        rejection_reason: reason,
      },
    }
  }
}

// ─── Transitions ─────────────────────────────────────────────────────────────

/// What a status change does to the owning volunteer's aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccrualEffect {
  Apply,
  Reverse,
  Untouched,
}

/// Plan a review. `None` means the submission is already in the requested
/// state and nothing may change.
pub fn plan_review(current: &SubmissionStatus, decision: &Decision) -> Option<AccrualEffect> {
  match (current.kind(), decision.target()) {
    (from, to) if from == to => None,
    (_, StatusKind::Approved) => Some(AccrualEffect::Apply),
    (StatusKind::Approved, _) => Some(AccrualEffect::Reverse),
    _ => Some(AccrualEffect::Untouched),
  }
}

/// Plan an administrative return to `pending`.
pub fn plan_reopen(current: &SubmissionStatus) -> Option<AccrualEffect> {
  match current.kind() {
    StatusKind::Pending => None,
    StatusKind::Approved => Some(AccrualEffect::Reverse),
    StatusKind::Rejected => Some(AccrualEffect::Untouched),
  }
}

/// Owners may edit while pending; administrators may edit at any time.
pub fn check_edit(actor: &Actor, submission: &Submission) -> Result<()> {
  if actor.is_admin() {
    return Ok(());
  }
  if actor.user_id != submission.volunteer_id {
    return Err(Error::forbidden("only the owning volunteer may edit a submission"));
  }
  if !submission.status.is_pending() {
    return Err(Error::forbidden(format!(
      "submission is {}; only pending submissions can be edited",
      submission.status.kind()
    )));
  }
  Ok(())
}
