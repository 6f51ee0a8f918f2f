//! [`Ledger`], the service every caller goes through.
//!
//! Each mutating operation is a single [`UnitOfWork`]: the submission
//! transition and the volunteer aggregate it affects commit together or not
//! at all. A unit of work that hits a version conflict is retried once.

use std::sync::Arc;

use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::{
  Error, Result,
  accrual::{AccrualOutcome, Reconciler},
  lifecycle::{self, AccrualEffect, Decision},
  store::{HoursStore, LedgerStats, SubmissionQuery, UnitOfWork},
  submission::{NewSubmission, StatusKind, Submission, SubmissionPatch, SubmissionStatus},
  tier::Threshold,
  volunteer::{Actor, Badge, NewVolunteer, Role, Volunteer, generate_referral_code},
};

/// Attempts at drawing an unused referral code before giving up.
const REFERRAL_CODE_ATTEMPTS: usize = 8;

/// The caller's own view: aggregate, progress, and submission history.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
  pub volunteer:          Volunteer,
  /// Current-year hours as of now; zero if the stored bucket is stale.
  pub this_year_hours:    Decimal,
  pub next_tier:          Option<Threshold>,
  pub hours_to_next_tier: Option<Decimal>,
  pub history:            Vec<Submission>,
}

/// A submission transition together with what it did to the aggregate.
struct Settled {
  submission: Submission,
  outcome:    Option<AccrualOutcome>,
  changed:    bool,
}

impl Settled {
  fn unchanged(submission: Submission) -> Self {
    Self { submission, outcome: None, changed: false }
  }

  fn changed(submission: Submission, outcome: Option<AccrualOutcome>) -> Self {
    Self { submission, outcome, changed: true }
  }
}

pub struct Ledger<S> {
  store:      S,
  reconciler: Arc<Reconciler>,
}

impl<S: HoursStore> Ledger<S> {
  pub fn new(store: S) -> Self { Self::with_reconciler(store, Reconciler::default()) }

  pub fn with_reconciler(store: S, reconciler: Reconciler) -> Self {
    Self { store, reconciler: Arc::new(reconciler) }
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn reconciler(&self) -> &Reconciler { &self.reconciler }

  /// Run a unit of work, retrying once if it loses an optimistic-version race.
  async fn run<T, F>(&self, op: &'static str, work: F) -> Result<T>
  where
    T: Send + 'static,
    F: Fn(&mut dyn UnitOfWork) -> Result<T> + Clone + Send + 'static,
  {
    match self.store.execute(work.clone()).await {
      Err(e) if e.is_conflict() => {
        tracing::warn!(op, error = %e, "unit of work conflicted; retrying once");
        self.store.execute(work).await
      }
      other => other,
    }
  }

  // ── Registration ──────────────────────────────────────────────────────

  /// Create a volunteer and credit their referrer, if any, in one step.
  pub async fn register(&self, input: NewVolunteer) -> Result<Volunteer> {
    input.validate()?;
    let reconciler = Arc::clone(&self.reconciler);

    let (volunteer, referral) = self
      .run("register", move |uow| {
        let volunteer = Volunteer::new(
          input.clone(),
          unused_referral_code(uow)?,
          Utc::now(),
        );
        if uow.find_volunteer_by_email(&volunteer.email)?.is_some() {
          return Err(Error::validation(format!(
            "{} is already registered",
            volunteer.email
          )));
        }
        uow.insert_volunteer(&volunteer)?;

        let mut referral = None;
        if let Some(code) = &volunteer.referred_by
          && let Some(mut referrer) = uow.find_volunteer_by_referral_code(code)?
        {
          let badge = reconciler.record_referral(&mut referrer);
          uow.save_volunteer(&mut referrer)?;
          referral = Some((referrer.volunteer_id, referrer.referral_count, badge));
        }
        Ok((volunteer, referral))
      })
      .await?;

    tracing::info!(
      volunteer_id = %volunteer.volunteer_id,
      role = %volunteer.role,
      "volunteer registered"
    );
    if let Some((referrer_id, count, badge)) = referral {
      tracing::info!(%referrer_id, referral_count = count, "referral credited");
      if let Some(badge) = badge {
        log_badge(referrer_id, badge);
      }
    }
    Ok(volunteer)
  }

  // ── Lifecycle ─────────────────────────────────────────────────────────

  /// Record a new pending submission.
  pub async fn submit(&self, actor: &Actor, input: NewSubmission) -> Result<Submission> {
    input.validate(Utc::now().date_naive())?;
    if !actor.is_admin() && input.volunteer_id != actor.user_id {
      return Err(Error::forbidden("volunteers may only submit their own hours"));
    }

    let submission = self
      .run("submit", move |uow| {
        let volunteer_id = input.volunteer_id;
        if uow.load_volunteer(volunteer_id)?.is_none() {
          return Err(Error::VolunteerNotFound(volunteer_id));
        }
        let submission = Submission::new(input.clone(), Utc::now());
        uow.insert_submission(&submission)?;
        Ok(submission)
      })
      .await?;

    tracing::info!(
      submission_id = %submission.submission_id,
      volunteer_id = %submission.volunteer_id,
      hours = %submission.hours,
      "submission received"
    );
    Ok(submission)
  }

  /// Approve or reject a submission. Repeating the current decision is a
  /// no-op and never touches the aggregate.
  pub async fn review(
    &self,
    actor: &Actor,
    submission_id: Uuid,
    decision: Decision,
  ) -> Result<Submission> {
    actor.require_admin("review submissions")?;
    let reviewer = actor.user_id;
    let reconciler = Arc::clone(&self.reconciler);

    let settled = self
      .run("review", move |uow| {
        let mut submission = load_submission(uow, submission_id)?;
        let Some(effect) = lifecycle::plan_review(&submission.status, &decision) else {
          return Ok(Settled::unchanged(submission));
        };
        let now = Utc::now();
        let previous = submission.clone();
        submission.status = decision.clone().into_status(reviewer, now);
        let outcome = settle(&reconciler, uow, &previous, &mut submission, effect, now.year())?;
        Ok(Settled::changed(submission, outcome))
      })
      .await?;

    if settled.changed {
      log_settled("submission reviewed", &settled);
    } else {
      tracing::debug!(%submission_id, "review repeats current status; nothing to do");
    }
    Ok(settled.submission)
  }

  /// Administratively return a reviewed submission to `pending`.
  pub async fn reopen(&self, actor: &Actor, submission_id: Uuid) -> Result<Submission> {
    actor.require_admin("reopen submissions")?;
    let reconciler = Arc::clone(&self.reconciler);

    let settled = self
      .run("reopen", move |uow| {
        let mut submission = load_submission(uow, submission_id)?;
        let Some(effect) = lifecycle::plan_reopen(&submission.status) else {
          return Ok(Settled::unchanged(submission));
        };
        let previous = submission.clone();
        submission.status = SubmissionStatus::Pending;
        let outcome =
          settle(&reconciler, uow, &previous, &mut submission, effect, Utc::now().year())?;
        Ok(Settled::changed(submission, outcome))
      })
      .await?;

    if settled.changed {
      log_settled("submission reopened", &settled);
    }
    Ok(settled.submission)
  }

  /// Edit a submission's content.
  ///
  /// When an administrator changes the hours or service date of an approved
  /// submission, its accrual is reversed and it goes back to `pending`; it
  /// counts again only after an explicit re-approval.
  pub async fn edit(
    &self,
    actor: &Actor,
    submission_id: Uuid,
    patch: SubmissionPatch,
  ) -> Result<Submission> {
    patch.validate(Utc::now().date_naive())?;
    let actor = *actor;
    let reconciler = Arc::clone(&self.reconciler);

    let settled = self
      .run("edit", move |uow| {
        let mut submission = load_submission(uow, submission_id)?;
        lifecycle::check_edit(&actor, &submission)?;

        if submission.status.is_approved() && patch.changes_accrual(&submission) {
          let previous = submission.clone();
          submission.status = SubmissionStatus::Pending;
          patch.clone().apply_to(&mut submission);
          let outcome = settle(
            &reconciler,
            uow,
            &previous,
            &mut submission,
            AccrualEffect::Reverse,
            Utc::now().year(),
          )?;
          return Ok(Settled::changed(submission, outcome));
        }

        patch.clone().apply_to(&mut submission);
        uow.save_submission(&mut submission)?;
        Ok(Settled::changed(submission, None))
      })
      .await?;

    log_settled("submission edited", &settled);
    Ok(settled.submission)
  }

  /// Rebuild a volunteer's aggregate from their approved submissions.
  pub async fn recompute(&self, actor: &Actor, volunteer_id: Uuid) -> Result<Volunteer> {
    actor.require_admin("recompute volunteer totals")?;
    let reconciler = Arc::clone(&self.reconciler);

    let (volunteer, before) = self
      .run("recompute", move |uow| {
        let mut volunteer = uow
          .load_volunteer(volunteer_id)?
          .ok_or(Error::VolunteerNotFound(volunteer_id))?;
        let before = (volunteer.total_hours, volunteer.this_year_hours);
        let submissions = uow.submissions_for(volunteer_id)?;
        reconciler.recompute(&mut volunteer, &submissions, Utc::now().year())?;
        uow.save_volunteer(&mut volunteer)?;
        Ok((volunteer, before))
      })
      .await?;

    if before != (volunteer.total_hours, volunteer.this_year_hours) {
      tracing::warn!(
        %volunteer_id,
        stored_total = %before.0,
        recomputed_total = %volunteer.total_hours,
        stored_this_year = %before.1,
        recomputed_this_year = %volunteer.this_year_hours,
        "volunteer aggregate had drifted"
      );
    }
    Ok(volunteer)
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  pub async fn get_submission(&self, actor: &Actor, submission_id: Uuid) -> Result<Submission> {
    let submission = load_or_missing(&self.store, submission_id).await?;
    if !actor.can_view(submission.volunteer_id) {
      return Err(Error::forbidden("not your submission"));
    }
    Ok(submission)
  }

  /// Submission history. Volunteers only ever see their own.
  pub async fn history(&self, actor: &Actor, mut query: SubmissionQuery) -> Result<Vec<Submission>> {
    let requested = query.volunteer_id;
    match requested {
      Some(id) if !actor.can_view(id) => {
        return Err(Error::forbidden("not your submissions"));
      }
      None if !actor.is_admin() => query.volunteer_id = Some(actor.user_id),
      _ => {}
    }
    self.store.list_submissions(&query).await
  }

  pub async fn pending(&self, actor: &Actor) -> Result<Vec<Submission>> {
    actor.require_admin("list pending submissions")?;
    let query = SubmissionQuery { status: Some(StatusKind::Pending), ..Default::default() };
    self.store.list_submissions(&query).await
  }

  /// Ranked volunteers, with `this_year_hours` as of the current year.
  pub async fn volunteers(&self, actor: &Actor) -> Result<Vec<Volunteer>> {
    actor.require_admin("list volunteers")?;
    let year = Utc::now().year();
    let mut volunteers = self.store.list_volunteers(Some(Role::Volunteer)).await?;
    for v in &mut volunteers {
      v.this_year_hours = v.hours_in_year(year);
      v.hours_year = year;
    }
    Ok(volunteers)
  }

  pub async fn stats(&self, actor: &Actor) -> Result<LedgerStats> {
    actor.require_admin("view statistics")?;
    self.store.stats().await
  }

  pub async fn dashboard(&self, actor: &Actor) -> Result<Dashboard> {
    let volunteer = self
      .store
      .get_volunteer(actor.user_id)
      .await?
      .ok_or(Error::VolunteerNotFound(actor.user_id))?;
    let query = SubmissionQuery { volunteer_id: Some(actor.user_id), ..Default::default() };
    let history = self.store.list_submissions(&query).await?;

    let next_tier = self.reconciler.tiers().next_after(volunteer.total_hours);
    Ok(Dashboard {
      this_year_hours: volunteer.hours_in_year(Utc::now().year()),
      hours_to_next_tier: next_tier.map(|t| t.min_hours - volunteer.total_hours),
      next_tier,
      volunteer,
      history,
    })
  }
}

// ─── Unit-of-work helpers ────────────────────────────────────────────────────

fn load_submission(uow: &mut dyn UnitOfWork, id: Uuid) -> Result<Submission> {
  uow.load_submission(id)?.ok_or(Error::SubmissionNotFound(id))
}

/// Persist `submission` (already carrying its new status) and apply `effect`
/// to its owner. `accrued` is the submission as it stood when its hours were
/// last counted, which is what a reversal must subtract.
fn settle(
  reconciler: &Reconciler,
  uow: &mut dyn UnitOfWork,
  accrued: &Submission,
  submission: &mut Submission,
  effect: AccrualEffect,
  current_year: i32,
) -> Result<Option<AccrualOutcome>> {
  if effect == AccrualEffect::Untouched {
    uow.save_submission(submission)?;
    return Ok(None);
  }

  let mut volunteer = uow
    .load_volunteer(submission.volunteer_id)?
    .ok_or(Error::VolunteerNotFound(submission.volunteer_id))?;
  let outcome = match effect {
    AccrualEffect::Apply => reconciler.apply_approval(&mut volunteer, submission, current_year)?,
    _ => reconciler.reverse_approval(&mut volunteer, accrued, current_year)?,
  };
  uow.save_both(submission, &mut volunteer)?;
  Ok(Some(outcome))
}

fn unused_referral_code(uow: &mut dyn UnitOfWork) -> Result<String> {
  for _ in 0..REFERRAL_CODE_ATTEMPTS {
    let code = generate_referral_code();
    if uow.find_volunteer_by_referral_code(&code)?.is_none() {
      return Ok(code);
    }
  }
  Err(Error::Conflict("could not allocate an unused referral code".into()))
}

async fn load_or_missing<S: HoursStore>(store: &S, id: Uuid) -> Result<Submission> {
  store.get_submission(id).await?.ok_or(Error::SubmissionNotFound(id))
}

fn log_settled(message: &'static str, settled: &Settled) {
  let submission = &settled.submission;
  tracing::info!(
    submission_id = %submission.submission_id,
    volunteer_id = %submission.volunteer_id,
    status = %submission.status.kind(),
    "{message}"
  );
  let Some(outcome) = settled.outcome else { return };
  if outcome.tier_changed() {
    tracing::info!(
      volunteer_id = %submission.volunteer_id,
      from = %outcome.previous_tier,
      to = %outcome.tier,
      "tier changed"
    );
  }
  if let Some(badge) = outcome.badge_granted {
    log_badge(submission.volunteer_id, badge);
  }
}

fn log_badge(volunteer_id: Uuid, badge: Badge) {
  tracing::info!(%volunteer_id, %badge, "badge granted");
}

#[cfg(test)]
mod tests {
  use std::{
    collections::HashMap,
    sync::{
      Mutex,
      atomic::{AtomicUsize, Ordering},
    },
  };

  use chrono::NaiveDate;

  use super::*;
  use crate::{submission::ServiceType, tier::Tier};

  // An in-memory store whose units of work commit by swapping a snapshot,
  // with injectable faults on volunteer saves.
  #[derive(Clone, Default)]
  struct Data {
    submissions: HashMap<Uuid, Submission>,
    volunteers:  HashMap<Uuid, Volunteer>,
  }

  #[derive(Default)]
  struct MemStore {
    data:      Mutex<Data>,
    conflicts: AtomicUsize,
    failures:  AtomicUsize,
  }

  struct MemTx<'a> {
    data:  Data,
    store: &'a MemStore,
  }

  fn take(counter: &AtomicUsize) -> bool {
    counter
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
      .is_ok()
  }

  impl UnitOfWork for MemTx<'_> {
    fn load_submission(&mut self, id: Uuid) -> Result<Option<Submission>> {
      Ok(self.data.submissions.get(&id).cloned())
    }

    fn load_volunteer(&mut self, id: Uuid) -> Result<Option<Volunteer>> {
      Ok(self.data.volunteers.get(&id).cloned())
    }

    fn find_volunteer_by_email(&mut self, email: &str) -> Result<Option<Volunteer>> {
      Ok(self.data.volunteers.values().find(|v| v.email.eq_ignore_ascii_case(email)).cloned())
    }

    fn find_volunteer_by_referral_code(&mut self, code: &str) -> Result<Option<Volunteer>> {
      let code = code.trim();
      Ok(
        self
          .data
          .volunteers
          .values()
          .find(|v| v.referral_code.eq_ignore_ascii_case(code))
          .cloned(),
      )
    }

    fn submissions_for(&mut self, volunteer_id: Uuid) -> Result<Vec<Submission>> {
      Ok(
        self
          .data
          .submissions
          .values()
          .filter(|s| s.volunteer_id == volunteer_id)
          .cloned()
          .collect(),
      )
    }

    fn insert_submission(&mut self, submission: &Submission) -> Result<()> {
      self.data.submissions.insert(submission.submission_id, submission.clone());
      Ok(())
    }

    fn insert_volunteer(&mut self, volunteer: &Volunteer) -> Result<()> {
      self.data.volunteers.insert(volunteer.volunteer_id, volunteer.clone());
      Ok(())
    }

    fn save_submission(&mut self, submission: &mut Submission) -> Result<()> {
      submission.version += 1;
      self.data.submissions.insert(submission.submission_id, submission.clone());
      Ok(())
    }

    fn save_volunteer(&mut self, volunteer: &mut Volunteer) -> Result<()> {
      if take(&self.store.conflicts) {
        return Err(Error::Conflict("volunteer changed".into()));
      }
      if take(&self.store.failures) {
        return Err(Error::Persistence("disk full".into()));
      }
      volunteer.version += 1;
      self.data.volunteers.insert(volunteer.volunteer_id, volunteer.clone());
      Ok(())
    }
  }

  impl HoursStore for MemStore {
    async fn execute<T, F>(&self, work: F) -> Result<T>
    where
      T: Send + 'static,
      F: FnOnce(&mut dyn UnitOfWork) -> Result<T> + Send + 'static,
    {
      let mut data = self.data.lock().unwrap();
      let mut tx = MemTx { data: data.clone(), store: self };
      let out = work(&mut tx)?;
      *data = tx.data;
      Ok(out)
    }

    async fn get_submission(&self, id: Uuid) -> Result<Option<Submission>> {
      Ok(self.data.lock().unwrap().submissions.get(&id).cloned())
    }

    async fn get_volunteer(&self, id: Uuid) -> Result<Option<Volunteer>> {
      Ok(self.data.lock().unwrap().volunteers.get(&id).cloned())
    }

    async fn find_volunteer_by_email(&self, _: &str) -> Result<Option<Volunteer>> {
      unimplemented!()
    }

    async fn list_submissions(&self, _: &SubmissionQuery) -> Result<Vec<Submission>> {
      unimplemented!()
    }

    async fn list_volunteers(&self, _: Option<Role>) -> Result<Vec<Volunteer>> {
      unimplemented!()
    }

    async fn stats(&self) -> Result<LedgerStats> { unimplemented!() }
  }

  fn signup(email: &str, referred_by: Option<&str>) -> NewVolunteer {
    NewVolunteer {
      email:         email.into(),
      full_name:     "Test Volunteer".into(),
      password_hash: "hash".into(),
      role:          Role::Volunteer,
      referred_by:   referred_by.map(str::to_owned),
    }
  }

  fn claim(volunteer_id: Uuid, hours: i64) -> NewSubmission {
    NewSubmission {
      volunteer_id,
      activity_name: "Soup kitchen".into(),
      service_type: ServiceType::CommunityEvents,
      hours: Decimal::from(hours),
      service_date: Utc::now().date_naive(),
      description: "Served dinner".into(),
      proof_reference: Some("proof/123.png".into()),
      is_historical: false,
    }
  }

  async fn volunteer(ledger: &Ledger<MemStore>, id: Uuid) -> Volunteer {
    ledger.store().get_volunteer(id).await.unwrap().unwrap()
  }

  #[tokio::test]
  async fn conflict_is_retried_once() {
    let ledger = Ledger::new(MemStore::default());
    let admin = Actor::admin(Uuid::new_v4());
    let v = ledger.register(signup("a@x.org", None)).await.unwrap();
    let actor = Actor::volunteer(v.volunteer_id);
    let s = ledger.submit(&actor, claim(v.volunteer_id, 60)).await.unwrap();

    ledger.store().conflicts.store(1, Ordering::SeqCst);
    let reviewed = ledger.review(&admin, s.submission_id, Decision::Approve).await.unwrap();

    assert!(reviewed.status.is_approved());
    let v = volunteer(&ledger, v.volunteer_id).await;
    assert_eq!(v.total_hours, Decimal::from(60));
    assert_eq!(v.tier, Tier::KindnessAmbassador);
  }

  #[tokio::test]
  async fn second_conflict_surfaces_and_rolls_back() {
    let ledger = Ledger::new(MemStore::default());
    let admin = Actor::admin(Uuid::new_v4());
    let v = ledger.register(signup("b@x.org", None)).await.unwrap();
    let s = ledger
      .submit(&Actor::volunteer(v.volunteer_id), claim(v.volunteer_id, 5))
      .await
      .unwrap();

    ledger.store().conflicts.store(2, Ordering::SeqCst);
    let err = ledger.review(&admin, s.submission_id, Decision::Approve).await.unwrap_err();

    assert!(err.is_conflict());
    let stored = ledger.store().get_submission(s.submission_id).await.unwrap().unwrap();
    assert!(stored.status.is_pending());
    assert_eq!(volunteer(&ledger, v.volunteer_id).await.total_hours, Decimal::ZERO);
  }

  #[tokio::test]
  async fn persistence_failure_leaves_both_records_untouched() {
    let ledger = Ledger::new(MemStore::default());
    let admin = Actor::admin(Uuid::new_v4());
    let v = ledger.register(signup("c@x.org", None)).await.unwrap();
    let s = ledger
      .submit(&Actor::volunteer(v.volunteer_id), claim(v.volunteer_id, 5))
      .await
      .unwrap();

    ledger.store().failures.store(1, Ordering::SeqCst);
    let err = ledger.review(&admin, s.submission_id, Decision::Approve).await.unwrap_err();

    assert!(matches!(err, Error::Persistence(_)));
    let stored = ledger.store().get_submission(s.submission_id).await.unwrap().unwrap();
    assert!(stored.status.is_pending());
    assert_eq!(stored.version, s.version);
  }

  #[tokio::test]
  async fn only_admins_review() {
    let ledger = Ledger::new(MemStore::default());
    let v = ledger.register(signup("d@x.org", None)).await.unwrap();
    let actor = Actor::volunteer(v.volunteer_id);
    let s = ledger.submit(&actor, claim(v.volunteer_id, 5)).await.unwrap();

    let err = ledger.review(&actor, s.submission_id, Decision::Approve).await.unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));
  }

  #[tokio::test]
  async fn volunteers_cannot_submit_for_others() {
    let ledger = Ledger::new(MemStore::default());
    let v = ledger.register(signup("e@x.org", None)).await.unwrap();
    let err = ledger
      .submit(&Actor::volunteer(Uuid::new_v4()), claim(v.volunteer_id, 1))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));
  }

  #[tokio::test]
  async fn referral_credit_is_part_of_registration() {
    let ledger = Ledger::new(MemStore::default());
    let referrer = ledger.register(signup("r@x.org", None)).await.unwrap();
    let lowercase = format!(" {} ", referrer.referral_code.to_ascii_lowercase());
    for i in 0..5 {
      ledger
        .register(signup(&format!("friend{i}@x.org"), Some(&lowercase)))
        .await
        .unwrap();
    }
    ledger
      .register(signup("stranger@x.org", Some("ZZZZZZ")))
      .await
      .unwrap();

    let referrer = volunteer(&ledger, referrer.volunteer_id).await;
    assert_eq!(referrer.referral_count, 5);
    assert!(referrer.badges.contains(Badge::SocialButterfly));
    assert_eq!(referrer.badges.len(), 1);
  }

  #[tokio::test]
  async fn duplicate_email_is_a_validation_error() {
    let ledger = Ledger::new(MemStore::default());
    ledger.register(signup("dup@x.org", None)).await.unwrap();
    let err = ledger.register(signup("DUP@x.org", None)).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
  }

  #[tokio::test]
  async fn admin_edit_of_approved_hours_reverses_and_reopens() {
    let ledger = Ledger::new(MemStore::default());
    let admin = Actor::admin(Uuid::new_v4());
    let v = ledger.register(signup("f@x.org", None)).await.unwrap();
    let s = ledger
      .submit(&Actor::volunteer(v.volunteer_id), claim(v.volunteer_id, 8))
      .await
      .unwrap();
    ledger.review(&admin, s.submission_id, Decision::Approve).await.unwrap();

    let patch = SubmissionPatch {
      hours: Some(Decimal::from(3)),
      service_date: NaiveDate::from_ymd_opt(2001, 1, 1),
      ..Default::default()
    };
    let edited = ledger.edit(&admin, s.submission_id, patch).await.unwrap();

    assert!(edited.status.is_pending());
    assert_eq!(edited.hours, Decimal::from(3));
    let v = volunteer(&ledger, v.volunteer_id).await;
    assert_eq!(v.total_hours, Decimal::ZERO);
    assert_eq!(v.this_year_hours, Decimal::ZERO);
  }
}
