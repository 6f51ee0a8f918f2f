//! [`SqliteStore`], the SQLite implementation of [`HoursStore`].

use std::{path::Path, time::Duration};

use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior};
use tally_core::{
  store::{HoursStore, LedgerStats, SubmissionQuery, UnitOfWork},
  submission::{StatusKind, Submission},
  volunteer::{Role, Volunteer},
};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    RawSubmission, RawVolunteer, SUBMISSION_COLUMNS, VOLUNTEER_COLUMNS, encode_badges,
    encode_date, encode_decimal, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

/// How long a writer waits on another connection's lock before giving up
/// with `SQLITE_BUSY`, which surfaces as a retryable conflict.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Tally hours store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a read-only query on the connection thread.
  async fn read<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }
}

// ─── Queries ─────────────────────────────────────────────────────────────────
//
// Shared by the unit of work (inside a transaction) and the read paths.

fn volunteer_where(conn: &Connection, clause: &str, arg: &str) -> Result<Option<Volunteer>> {
  let sql = format!("SELECT {VOLUNTEER_COLUMNS} FROM volunteers WHERE {clause}");
  conn
    .query_row(&sql, [arg], RawVolunteer::from_row)
    .optional()?
    .map(RawVolunteer::into_volunteer)
    .transpose()
}

fn submission_by_id(conn: &Connection, id: Uuid) -> Result<Option<Submission>> {
  let sql = format!("SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE submission_id = ?1");
  conn
    .query_row(&sql, [encode_uuid(id)], RawSubmission::from_row)
    .optional()?
    .map(RawSubmission::into_submission)
    .transpose()
}

fn volunteer_by_id(conn: &Connection, id: Uuid) -> Result<Option<Volunteer>> {
  volunteer_where(conn, "volunteer_id = ?1", &encode_uuid(id))
}

fn volunteer_by_email(conn: &Connection, email: &str) -> Result<Option<Volunteer>> {
  volunteer_where(conn, "email = ?1", email.trim())
}

fn volunteer_by_referral_code(conn: &Connection, code: &str) -> Result<Option<Volunteer>> {
  volunteer_where(conn, "referral_code = ?1", &code.trim().to_uppercase())
}

fn select_submissions(conn: &Connection, query: &SubmissionQuery) -> Result<Vec<Submission>> {
  let mut clauses: Vec<String> = Vec::new();
  let mut args: Vec<String> = Vec::new();

  if let Some(id) = query.volunteer_id {
    args.push(encode_uuid(id));
    clauses.push(format!("volunteer_id = ?{}", args.len()));
  }
  if let Some(status) = query.status {
    args.push(status.as_ref().to_owned());
    clauses.push(format!("status = ?{}", args.len()));
  }
  if let Some(from) = query.service_from {
    args.push(encode_date(from));
    clauses.push(format!("service_date >= ?{}", args.len()));
  }
  if let Some(to) = query.service_to {
    args.push(encode_date(to));
    clauses.push(format!("service_date <= ?{}", args.len()));
  }

  let mut sql = format!("SELECT {SUBMISSION_COLUMNS} FROM submissions");
  if !clauses.is_empty() {
    sql.push_str(" WHERE ");
    sql.push_str(&clauses.join(" AND "));
  }
  sql.push_str(" ORDER BY submitted_at DESC, submission_id");
  match (query.limit, query.offset) {
    (Some(limit), offset) => {
      sql.push_str(&format!(" LIMIT {limit} OFFSET {}", offset.unwrap_or(0)));
    }
    (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {offset}")),
    (None, None) => {}
  }

  let mut stmt = conn.prepare(&sql)?;
  let rows = stmt
    .query_map(rusqlite::params_from_iter(args), RawSubmission::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  rows.into_iter().map(RawSubmission::into_submission).collect()
}

fn select_volunteers(conn: &Connection, role: Option<Role>) -> Result<Vec<Volunteer>> {
  let mut sql = format!("SELECT {VOLUNTEER_COLUMNS} FROM volunteers");
  let mut args: Vec<String> = Vec::new();
  if let Some(role) = role {
    sql.push_str(" WHERE role = ?1");
    args.push(role.as_ref().to_owned());
  }

  let mut stmt = conn.prepare(&sql)?;
  let rows = stmt
    .query_map(rusqlite::params_from_iter(args), RawVolunteer::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  let mut volunteers = rows
    .into_iter()
    .map(RawVolunteer::into_volunteer)
    .collect::<Result<Vec<_>>>()?;

  // Hours are TEXT columns, so order here where comparison is numeric.
  volunteers.sort_by(|a, b| {
    b.total_hours
      .cmp(&a.total_hours)
      .then_with(|| a.full_name.cmp(&b.full_name))
  });
  Ok(volunteers)
}

fn insert_volunteer(conn: &Connection, v: &Volunteer) -> Result<()> {
  conn.execute(
    &format!(
      "INSERT INTO volunteers ({VOLUNTEER_COLUMNS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
    ),
    rusqlite::params![
      encode_uuid(v.volunteer_id),
      v.email,
      v.full_name,
      v.role.as_ref(),
      v.password_hash,
      encode_decimal(v.total_hours),
      encode_decimal(v.this_year_hours),
      v.hours_year,
      v.tier.as_ref(),
      encode_badges(&v.badges)?,
      v.referral_code,
      v.referred_by,
      v.referral_count,
      encode_dt(v.created_at),
      v.version as i64,
    ],
  )?;
  Ok(())
}

fn update_volunteer(conn: &Connection, v: &mut Volunteer) -> Result<()> {
  let updated = conn.execute(
    "UPDATE volunteers SET
       email = ?3, full_name = ?4, role = ?5, password_hash = ?6,
       total_hours = ?7, this_year_hours = ?8, hours_year = ?9, tier = ?10,
       badges = ?11, referred_by = ?12, referral_count = ?13,
       version = version + 1
     WHERE volunteer_id = ?1 AND version = ?2",
    rusqlite::params![
      encode_uuid(v.volunteer_id),
      v.version as i64,
      v.email,
      v.full_name,
      v.role.as_ref(),
      v.password_hash,
      encode_decimal(v.total_hours),
      encode_decimal(v.this_year_hours),
      v.hours_year,
      v.tier.as_ref(),
      encode_badges(&v.badges)?,
      v.referred_by,
      v.referral_count,
    ],
  )?;
  if updated == 0 {
    return Err(Error::VersionConflict { entity: "volunteer", id: v.volunteer_id });
  }
  v.version += 1;
  Ok(())
}

fn insert_submission(conn: &Connection, s: &Submission) -> Result<()> {
  conn.execute(
    &format!(
      "INSERT INTO submissions ({SUBMISSION_COLUMNS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
    ),
    rusqlite::params![
      encode_uuid(s.submission_id),
      encode_uuid(s.volunteer_id),
      s.activity_name,
      s.service_type.as_ref(),
      encode_decimal(s.hours),
      encode_date(s.service_date),
      s.description,
      s.proof_reference,
      s.is_historical,
      encode_dt(s.submitted_at),
      s.status.kind().as_ref(),
      s.status.reviewed_at().map(encode_dt),
      s.status.reviewed_by().map(encode_uuid),
      s.status.rejection_reason(),
      s.version as i64,
    ],
  )?;
  Ok(())
}

fn update_submission(conn: &Connection, s: &mut Submission) -> Result<()> {
  let updated = conn.execute(
    "UPDATE submissions SET
       activity_name = ?3, service_type = ?4, hours = ?5, service_date = ?6,
       description = ?7, proof_reference = ?8, is_historical = ?9,
       status = ?10, reviewed_at = ?11, reviewed_by = ?12,
       rejection_reason = ?13, version = version + 1
     WHERE submission_id = ?1 AND version = ?2",
    rusqlite::params![
      encode_uuid(s.submission_id),
      s.version as i64,
      s.activity_name,
      s.service_type.as_ref(),
      encode_decimal(s.hours),
      encode_date(s.service_date),
      s.description,
      s.proof_reference,
      s.is_historical,
      s.status.kind().as_ref(),
      s.status.reviewed_at().map(encode_dt),
      s.status.reviewed_by().map(encode_uuid),
      s.status.rejection_reason(),
    ],
  )?;
  if updated == 0 {
    return Err(Error::VersionConflict { entity: "submission", id: s.submission_id });
  }
  s.version += 1;
  Ok(())
}

fn compute_stats(conn: &Connection) -> Result<LedgerStats> {
  let volunteers = select_volunteers(conn, Some(Role::Volunteer))?;
  let pending: i64 = conn.query_row(
    "SELECT COUNT(*) FROM submissions WHERE status = ?1",
    [StatusKind::Pending.as_ref()],
    |r| r.get(0),
  )?;

  let mut stats = LedgerStats {
    total_volunteers: volunteers.len() as u64,
    pending_submissions: pending as u64,
    ..LedgerStats::default()
  };
  for v in &volunteers {
    stats.total_hours = stats
      .total_hours
      .checked_add(v.total_hours)
      .ok_or(Error::Overflow("total_hours"))?;
    *stats.tier_distribution.entry(v.tier).or_default() += 1;
  }
  Ok(stats)
}

// ─── Unit of work ────────────────────────────────────────────────────────────

/// A unit of work bound to an open `BEGIN IMMEDIATE` transaction.
struct SqliteUnitOfWork<'a> {
  conn: &'a Connection,
}

impl UnitOfWork for SqliteUnitOfWork<'_> {
  fn load_submission(&mut self, id: Uuid) -> tally_core::Result<Option<Submission>> {
    Ok(submission_by_id(self.conn, id)?)
  }

  fn load_volunteer(&mut self, id: Uuid) -> tally_core::Result<Option<Volunteer>> {
    Ok(volunteer_by_id(self.conn, id)?)
  }

  fn find_volunteer_by_email(&mut self, email: &str) -> tally_core::Result<Option<Volunteer>> {
    Ok(volunteer_by_email(self.conn, email)?)
  }

  fn find_volunteer_by_referral_code(
    &mut self,
    code: &str,
  ) -> tally_core::Result<Option<Volunteer>> {
    Ok(volunteer_by_referral_code(self.conn, code)?)
  }

  fn submissions_for(&mut self, volunteer_id: Uuid) -> tally_core::Result<Vec<Submission>> {
    let query = SubmissionQuery { volunteer_id: Some(volunteer_id), ..Default::default() };
    Ok(select_submissions(self.conn, &query)?)
  }

  fn insert_submission(&mut self, submission: &Submission) -> tally_core::Result<()> {
    Ok(insert_submission(self.conn, submission)?)
  }

  fn insert_volunteer(&mut self, volunteer: &Volunteer) -> tally_core::Result<()> {
    Ok(insert_volunteer(self.conn, volunteer)?)
  }

  fn save_submission(&mut self, submission: &mut Submission) -> tally_core::Result<()> {
    Ok(update_submission(self.conn, submission)?)
  }

  fn save_volunteer(&mut self, volunteer: &mut Volunteer) -> tally_core::Result<()> {
    Ok(update_volunteer(self.conn, volunteer)?)
  }
}

// ─── HoursStore impl ─────────────────────────────────────────────────────────

impl HoursStore for SqliteStore {
  async fn execute<T, F>(&self, work: F) -> tally_core::Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut dyn UnitOfWork) -> tally_core::Result<T> + Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let result = work(&mut SqliteUnitOfWork { conn: &tx });
        // Dropping an uncommitted transaction rolls it back.
        if result.is_ok() {
          tx.commit()?;
        }
        Ok(result)
      })
      .await
      .map_err(Error::from)?
  }

  async fn get_submission(&self, id: Uuid) -> tally_core::Result<Option<Submission>> {
    Ok(self.read(move |conn| submission_by_id(conn, id)).await?)
  }

  async fn get_volunteer(&self, id: Uuid) -> tally_core::Result<Option<Volunteer>> {
    Ok(self.read(move |conn| volunteer_by_id(conn, id)).await?)
  }

  async fn find_volunteer_by_email(&self, email: &str) -> tally_core::Result<Option<Volunteer>> {
    let email = email.to_owned();
    Ok(self.read(move |conn| volunteer_by_email(conn, &email)).await?)
  }

  async fn list_submissions(
    &self,
    query: &SubmissionQuery,
  ) -> tally_core::Result<Vec<Submission>> {
    let query = query.clone();
    Ok(self.read(move |conn| select_submissions(conn, &query)).await?)
  }

  async fn list_volunteers(&self, role: Option<Role>) -> tally_core::Result<Vec<Volunteer>> {
    Ok(self.read(move |conn| select_volunteers(conn, role)).await?)
  }

  async fn stats(&self) -> tally_core::Result<LedgerStats> {
    Ok(self.read(compute_stats).await?)
  }
}
