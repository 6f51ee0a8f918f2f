//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 with fixed nanosecond precision and a `Z` suffix,
//! so lexical order in SQL matches chronological order. Hours are decimal
//! strings. Enum columns hold the same labels the JSON API uses.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rust_decimal::Decimal;
use tally_core::{
  submission::{ServiceType, StatusKind, Submission, SubmissionStatus},
  tier::Tier,
  volunteer::{Badge, BadgeSet, Role, Volunteer},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_decimal(d: Decimal) -> String { d.normalize().to_string() }

pub fn decode_decimal(s: &str) -> Result<Decimal> { Ok(Decimal::from_str(s)?) }

/// Parse a strum-labelled enum, naming `kind` in the error.
pub fn decode_label<T: FromStr>(kind: &'static str, s: &str) -> Result<T> {
  T::from_str(s).map_err(|_| Error::UnknownLabel { kind, value: s.to_owned() })
}

// ─── Badges ──────────────────────────────────────────────────────────────────

pub fn encode_badges(badges: &BadgeSet) -> Result<String> {
  Ok(serde_json::to_string(badges)?)
}

pub fn decode_badges(s: &str) -> Result<BadgeSet> {
  let labels: Vec<String> = serde_json::from_str(s)?;
  labels
    .iter()
    .map(|l| decode_label::<Badge>("badge", l))
    .collect()
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const VOLUNTEER_COLUMNS: &str = "volunteer_id, email, full_name, role, \
  password_hash, total_hours, this_year_hours, hours_year, tier, badges, \
  referral_code, referred_by, referral_count, created_at, version";

/// Raw values read directly from a `volunteers` row.
pub struct RawVolunteer {
  pub volunteer_id:    String,
  pub email:           String,
  pub full_name:       String,
  pub role:            String,
  pub password_hash:   String,
  pub total_hours:     String,
  pub this_year_hours: String,
  pub hours_year:      i32,
  pub tier:            String,
  pub badges:          String,
  pub referral_code:   String,
  pub referred_by:     Option<String>,
  pub referral_count:  u32,
  pub created_at:      String,
  pub version:         i64,
}

impl RawVolunteer {
  /// Read a row selected with [`VOLUNTEER_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      volunteer_id:    row.get(0)?,
      email:           row.get(1)?,
      full_name:       row.get(2)?,
      role:            row.get(3)?,
      password_hash:   row.get(4)?,
      total_hours:     row.get(5)?,
      this_year_hours: row.get(6)?,
      hours_year:      row.get(7)?,
      tier:            row.get(8)?,
      badges:          row.get(9)?,
      referral_code:   row.get(10)?,
      referred_by:     row.get(11)?,
      referral_count:  row.get(12)?,
      created_at:      row.get(13)?,
      version:         row.get(14)?,
    })
  }

  pub fn into_volunteer(self) -> Result<Volunteer> {
    Ok(Volunteer {
      volunteer_id:    decode_uuid(&self.volunteer_id)?,
      email:           self.email,
      full_name:       self.full_name,
      role:            decode_label::<Role>("role", &self.role)?,
      password_hash:   self.password_hash,
      total_hours:     decode_decimal(&self.total_hours)?,
      this_year_hours: decode_decimal(&self.this_year_hours)?,
      hours_year:      self.hours_year,
      tier:            decode_label::<Tier>("tier", &self.tier)?,
      badges:          decode_badges(&self.badges)?,
      referral_code:   self.referral_code,
      referred_by:     self.referred_by,
      referral_count:  self.referral_count,
      created_at:      decode_dt(&self.created_at)?,
      version:         self.version as u64,
    })
  }
}

pub const SUBMISSION_COLUMNS: &str = "submission_id, volunteer_id, \
  activity_name, service_type, hours, service_date, description, \
  proof_reference, is_historical, submitted_at, status, reviewed_at, \
  reviewed_by, rejection_reason, version";

/// Raw values read directly from a `submissions` row.
pub struct RawSubmission {
  pub submission_id:    String,
  pub volunteer_id:     String,
  pub activity_name:    String,
  pub service_type:     String,
  pub hours:            String,
  pub service_date:     String,
  pub description:      String,
  pub proof_reference:  Option<String>,
  pub is_historical:    bool,
  pub submitted_at:     String,
  pub status:           String,
  pub reviewed_at:      Option<String>,
  pub reviewed_by:      Option<String>,
  pub rejection_reason: Option<String>,
  pub version:          i64,
}

impl RawSubmission {
  /// Read a row selected with [`SUBMISSION_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      submission_id:    row.get(0)?,
      volunteer_id:     row.get(1)?,
      activity_name:    row.get(2)?,
      service_type:     row.get(3)?,
      hours:            row.get(4)?,
      service_date:     row.get(5)?,
      description:      row.get(6)?,
      proof_reference:  row.get(7)?,
      is_historical:    row.get(8)?,
      submitted_at:     row.get(9)?,
      status:           row.get(10)?,
      reviewed_at:      row.get(11)?,
      reviewed_by:      row.get(12)?,
      rejection_reason: row.get(13)?,
      version:          row.get(14)?,
    })
  }

  pub fn into_submission(self) -> Result<Submission> {
    let review = || -> Result<(DateTime<Utc>, Uuid)> {
      match (&self.reviewed_at, &self.reviewed_by) {
        (Some(at), Some(by)) => Ok((decode_dt(at)?, decode_uuid(by)?)),
        _ => Err(Error::DateParse(format!(
          "{} submission {} has no review metadata",
          self.status, self.submission_id
        ))),
      }
    };

    let status = match decode_label::<StatusKind>("status", &self.status)? {
      StatusKind::Pending => SubmissionStatus::Pending,
      StatusKind::Approved => {
        let (reviewed_at, reviewed_by) = review()?;
        SubmissionStatus::Approved { reviewed_at, reviewed_by }
      }
      StatusKind::Rejected => {
        let (reviewed_at, reviewed_by) = review()?;
        SubmissionStatus::Rejected {
          reviewed_at,
          reviewed_by,
          rejection_reason: self.rejection_reason.clone().unwrap_or_default(),
        }
      }
    };

    Ok(Submission {
      submission_id: decode_uuid(&self.submission_id)?,
      volunteer_id: decode_uuid(&self.volunteer_id)?,
      activity_name: self.activity_name,
      service_type: decode_label::<ServiceType>("service type", &self.service_type)?,
      hours: decode_decimal(&self.hours)?,
      service_date: decode_date(&self.service_date)?,
      description: self.description,
      proof_reference: self.proof_reference,
      is_historical: self.is_historical,
      submitted_at: decode_dt(&self.submitted_at)?,
      status,
      version: self.version as u64,
    })
  }
}
