//! Submissions: a volunteer's claim of service hours for one activity.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

/// Upper bound on the hours a single submission may claim.
pub const MAX_HOURS_PER_SUBMISSION: u32 = 10_000;

// ─── Service type ────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  EnumIter,
)]
pub enum ServiceType {
  #[serde(rename = "Service Projects")]
  #[strum(serialize = "Service Projects")]
  ServiceProjects,
  #[serde(rename = "Community Events")]
  #[strum(serialize = "Community Events")]
  CommunityEvents,
  #[serde(rename = "Food Rescues")]
  #[strum(serialize = "Food Rescues")]
  FoodRescues,
  #[serde(rename = "Tutoring")]
  #[strum(serialize = "Tutoring")]
  Tutoring,
  #[serde(rename = "Notes of Kindness")]
  #[strum(serialize = "Notes of Kindness")]
  NotesOfKindness,
  #[serde(rename = "Workshops")]
  #[strum(serialize = "Workshops")]
  Workshops,
  #[serde(rename = "Donations")]
  #[strum(serialize = "Donations")]
  Donations,
  #[serde(rename = "Other")]
  #[strum(serialize = "Other")]
  Other,
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// The bare state of a submission, without review metadata.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StatusKind {
  Pending,
  Approved,
  Rejected,
}

/// Review state. Review metadata only exists on the terminal states, so
/// returning a submission to `Pending` clears it by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionStatus {
  Pending,
  Approved {
    reviewed_at: DateTime<Utc>,
    reviewed_by: Uuid,
  },
  Rejected {
    reviewed_at:      DateTime<Utc>,
    reviewed_by:      Uuid,
    rejection_reason: String,
  },
}

impl SubmissionStatus {
  pub fn kind(&self) -> StatusKind {
    match self {
      Self::Pending => StatusKind::Pending,
      Self::Approved { .. } => StatusKind::Approved,
      Self::Rejected { .. } => StatusKind::Rejected,
    }
  }

  pub fn is_pending(&self) -> bool { matches!(self, Self::Pending) }

  pub fn is_approved(&self) -> bool { matches!(self, Self::Approved { .. }) }

  pub fn reviewed_at(&self) -> Option<DateTime<Utc>> {
    match self {
      Self::Pending => None,
      Self::Approved { reviewed_at, .. } | Self::Rejected { reviewed_at, .. } => {
        Some(*reviewed_at)
      }
    }
  }

  pub fn reviewed_by(&self) -> Option<Uuid> {
    match self {
      Self::Pending => None,
      Self::Approved { reviewed_by, .. } | Self::Rejected { reviewed_by, .. } => {
        Some(*reviewed_by)
      }
    }
  }

  pub fn rejection_reason(&self) -> Option<&str> {
    match self {
      Self::Rejected { rejection_reason, .. } => Some(rejection_reason),
      _ => None,
    }
  }
}

// ─── Submission ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
  pub submission_id:   Uuid,
  pub volunteer_id:    Uuid,
  pub activity_name:   String,
  pub service_type:    ServiceType,
  pub hours:           Decimal,
  /// When the service happened; drives year bucketing.
  pub service_date:    NaiveDate,
  pub description:     String,
  /// Opaque handle from the upload layer; never interpreted here.
  pub proof_reference: Option<String>,
  /// Logged retroactively, e.g. imported from paper records.
  pub is_historical:   bool,
  pub submitted_at:    DateTime<Utc>,
  #[serde(flatten)]
  pub status:          SubmissionStatus,
  pub version:         u64,
}

impl Submission {
  pub fn new(input: NewSubmission, now: DateTime<Utc>) -> Self {
    Self {
      submission_id: Uuid::new_v4(),
      volunteer_id: input.volunteer_id,
      activity_name: input.activity_name.trim().to_owned(),
      service_type: input.service_type,
      hours: input.hours,
      service_date: input.service_date,
      description: input.description.trim().to_owned(),
      proof_reference: input.proof_reference,
      is_historical: input.is_historical,
      submitted_at: now,
      status: SubmissionStatus::Pending,
      version: 0,
    }
  }
}

/// Input to [`crate::Ledger::submit`].
#[derive(Debug, Clone)]
pub struct NewSubmission {
  pub volunteer_id:    Uuid,
  pub activity_name:   String,
  pub service_type:    ServiceType,
  pub hours:           Decimal,
  pub service_date:    NaiveDate,
  pub description:     String,
  pub proof_reference: Option<String>,
  pub is_historical:   bool,
}

impl NewSubmission {
  /// `today` bounds the service date; service cannot be claimed in advance.
  pub fn validate(&self, today: NaiveDate) -> Result<()> {
    validate_hours(self.hours)?;
    validate_service_date(self.service_date, today)?;
    validate_text("activity_name", &self.activity_name)?;
    validate_text("description", &self.description)
  }
}

/// A partial update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionPatch {
  pub activity_name:   Option<String>,
  pub service_type:    Option<ServiceType>,
  pub hours:           Option<Decimal>,
  pub service_date:    Option<NaiveDate>,
  pub description:     Option<String>,
  pub proof_reference: Option<String>,
  pub is_historical:   Option<bool>,
}

impl SubmissionPatch {
  pub fn validate(&self, today: NaiveDate) -> Result<()> {
    if let Some(hours) = self.hours {
      validate_hours(hours)?;
    }
    if let Some(date) = self.service_date {
      validate_service_date(date, today)?;
    }
    if let Some(name) = &self.activity_name {
      validate_text("activity_name", name)?;
    }
    if let Some(description) = &self.description {
      validate_text("description", description)?;
    }
    Ok(())
  }

  /// Whether applying the patch would change what the submission contributes
  /// to a volunteer's aggregate.
  pub fn changes_accrual(&self, current: &Submission) -> bool {
    self.hours.is_some_and(|h| h != current.hours)
      || self.service_date.is_some_and(|d| d != current.service_date)
  }

  pub fn apply_to(self, submission: &mut Submission) {
    if let Some(name) = self.activity_name {
      submission.activity_name = name.trim().to_owned();
    }
    if let Some(service_type) = self.service_type {
      submission.service_type = service_type;
    }
    if let Some(hours) = self.hours {
      submission.hours = hours;
    }
    if let Some(date) = self.service_date {
      submission.service_date = date;
    }
    if let Some(description) = self.description {
      submission.description = description.trim().to_owned();
    }
    if let Some(proof) = self.proof_reference {
      submission.proof_reference = Some(proof);
    }
    if let Some(historical) = self.is_historical {
      submission.is_historical = historical;
    }
  }
}

fn validate_hours(hours: Decimal) -> Result<()> {
  if hours <= Decimal::ZERO {
    return Err(Error::validation("hours must be greater than zero"));
  }
  if hours > Decimal::from(MAX_HOURS_PER_SUBMISSION) {
    return Err(Error::validation(format!(
      "hours must not exceed {MAX_HOURS_PER_SUBMISSION} per submission"
    )));
  }
  Ok(())
}

fn validate_service_date(date: NaiveDate, today: NaiveDate) -> Result<()> {
  if date > today {
    return Err(Error::validation(format!("service_date {date} is in the future")));
  }
  Ok(())
}

fn validate_text(field: &str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(Error::validation(format!("{field} must not be empty")));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn input() -> NewSubmission {
    NewSubmission {
      volunteer_id:    Uuid::new_v4(),
      activity_name:   "Park cleanup".into(),
      service_type:    ServiceType::CommunityEvents,
      hours:           Decimal::new(25, 1),
      service_date:    NaiveDate::from_ymd_opt(2024, 5, 4).unwrap(),
      description:     "Picked up litter".into(),
      proof_reference: None,
      is_historical:   false,
    }
  }

  fn today() -> NaiveDate { NaiveDate::from_ymd_opt(2024, 6, 1).unwrap() }

  #[test]
  fn rejects_non_positive_hours() {
    let zero = NewSubmission { hours: Decimal::ZERO, ..input() };
    assert!(matches!(zero.validate(today()), Err(Error::Validation(_))));
    let negative = NewSubmission { hours: Decimal::from(-3), ..input() };
    assert!(matches!(negative.validate(today()), Err(Error::Validation(_))));
    assert!(input().validate(today()).is_ok());
  }

  #[test]
  fn rejects_implausibly_large_hours() {
    let huge = NewSubmission { hours: Decimal::MAX, ..input() };
    assert!(matches!(huge.validate(today()), Err(Error::Validation(_))));
    let at_cap = NewSubmission { hours: Decimal::from(MAX_HOURS_PER_SUBMISSION), ..input() };
    assert!(at_cap.validate(today()).is_ok());

    let patch = SubmissionPatch { hours: Some(Decimal::MAX), ..Default::default() };
    assert!(matches!(patch.validate(today()), Err(Error::Validation(_))));
  }

  #[test]
  fn rejects_future_service_dates() {
    let tomorrow = today().succ_opt().unwrap();
    let ahead = NewSubmission { service_date: tomorrow, ..input() };
    assert!(matches!(ahead.validate(today()), Err(Error::Validation(_))));
    let same_day = NewSubmission { service_date: today(), ..input() };
    assert!(same_day.validate(today()).is_ok());

    let patch = SubmissionPatch { service_date: Some(tomorrow), ..Default::default() };
    assert!(matches!(patch.validate(today()), Err(Error::Validation(_))));
    let patch = SubmissionPatch { service_date: Some(today()), ..Default::default() };
    assert!(patch.validate(today()).is_ok());
  }

  #[test]
  fn rejects_blank_descriptive_fields() {
    let blank = NewSubmission { description: "  ".into(), ..input() };
    assert!(matches!(blank.validate(today()), Err(Error::Validation(_))));
  }

  #[test]
  fn status_serialises_flat_with_review_metadata() {
    let mut s = Submission::new(input(), Utc::now());
    let reviewer = Uuid::new_v4();
    s.status = SubmissionStatus::Rejected {
      reviewed_at:      Utc::now(),
      reviewed_by:      reviewer,
      rejection_reason: "insufficient evidence".into(),
    };
    let json = serde_json::to_value(&s).unwrap();
    assert_eq!(json["status"], "rejected");
    assert_eq!(json["rejection_reason"], "insufficient evidence");
    assert_eq!(json["reviewed_by"], reviewer.to_string());
  }

  #[test]
  fn patch_only_changes_accrual_when_values_differ() {
    let s = Submission::new(input(), Utc::now());
    let same = SubmissionPatch { hours: Some(s.hours), ..Default::default() };
    assert!(!same.changes_accrual(&s));
    let moved = SubmissionPatch {
      service_date: NaiveDate::from_ymd_opt(2023, 1, 1),
      ..Default::default()
    };
    assert!(moved.changes_accrual(&s));
    let text = SubmissionPatch { description: Some("new".into()), ..Default::default() };
    assert!(!text.changes_accrual(&s));
  }

  #[test]
  fn patch_applies_trimmed_text() {
    let mut s = Submission::new(input(), Utc::now());
    SubmissionPatch {
      activity_name: Some("  Food drive ".into()),
      hours: Some(Decimal::from(4)),
      ..Default::default()
    }
    .apply_to(&mut s);
    assert_eq!(s.activity_name, "Food drive");
    assert_eq!(s.hours, Decimal::from(4));
  }
}
