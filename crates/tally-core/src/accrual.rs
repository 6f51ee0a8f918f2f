//! The accrual reconciler: keeps a volunteer's aggregate in step with the set
//! of approved submissions.
//!
//! Every function here is pure over in-memory records. Persisting the result
//! together with the submission transition is the job of
//! [`crate::Ledger`], which runs both inside one unit of work.

use chrono::Datelike;
use rust_decimal::Decimal;

use crate::{
  Error, Result,
  submission::Submission,
  tier::{Tier, TierTable},
  volunteer::{Badge, Volunteer},
};

/// Referrals needed for the "Social Butterfly" badge.
pub const REFERRAL_BADGE_THRESHOLD: u32 = 5;

/// What a reconciliation step did to the tier and badge set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccrualOutcome {
  pub previous_tier: Tier,
  pub tier:          Tier,
  pub badge_granted: Option<Badge>,
}

impl AccrualOutcome {
  pub fn tier_changed(&self) -> bool { self.previous_tier != self.tier }
}

#[derive(Debug, Clone)]
pub struct Reconciler {
  tiers:             TierTable,
  referral_badge_at: u32,
}

impl Default for Reconciler {
  fn default() -> Self { Self::new(TierTable::default()) }
}

impl Reconciler {
  pub fn new(tiers: TierTable) -> Self {
    Self { tiers, referral_badge_at: REFERRAL_BADGE_THRESHOLD }
  }

  pub fn tiers(&self) -> &TierTable { &self.tiers }

  pub fn tier_for(&self, total_hours: Decimal) -> Tier { self.tiers.tier_for(total_hours) }

  /// Add an approved submission's hours to its owner's aggregate.
  pub fn apply_approval(
    &self,
    volunteer: &mut Volunteer,
    submission: &Submission,
    current_year: i32,
  ) -> Result<AccrualOutcome> {
    check_owner(volunteer, submission)?;
    let this_year = volunteer.hours_in_year(current_year);

    let total = add_hours(volunteer.total_hours, submission.hours, volunteer)?;
    let this_year = if submission.service_date.year() == current_year {
      add_hours(this_year, submission.hours, volunteer)?
    } else {
      this_year
    };

    volunteer.total_hours = total;
    volunteer.this_year_hours = this_year;
    volunteer.hours_year = current_year;
    Ok(self.retier(volunteer))
  }

  /// Exact inverse of [`Self::apply_approval`] on the totals. Badges stay.
  pub fn reverse_approval(
    &self,
    volunteer: &mut Volunteer,
    submission: &Submission,
    current_year: i32,
  ) -> Result<AccrualOutcome> {
    check_owner(volunteer, submission)?;
    let this_year = volunteer.hours_in_year(current_year);

    let total = subtract_hours(volunteer.total_hours, submission.hours, volunteer, "total_hours");
    let this_year = if submission.service_date.year() == current_year {
      subtract_hours(this_year, submission.hours, volunteer, "this_year_hours")
    } else {
      this_year
    };

    volunteer.total_hours = total;
    volunteer.this_year_hours = this_year;
    volunteer.hours_year = current_year;
    Ok(self.retier(volunteer))
  }

  /// Count one successful referral; returns the badge if this one earned it.
  pub fn record_referral(&self, referrer: &mut Volunteer) -> Option<Badge> {
    referrer.referral_count += 1;
    (referrer.referral_count >= self.referral_badge_at
      && referrer.badges.grant(Badge::SocialButterfly))
    .then_some(Badge::SocialButterfly)
  }

  /// Rebuild the totals from the full set of the volunteer's submissions.
  ///
  /// Non-approved entries are ignored. Used to repair drift, never on the
  /// regular approval path.
  pub fn recompute(
    &self,
    volunteer: &mut Volunteer,
    submissions: &[Submission],
    current_year: i32,
  ) -> Result<AccrualOutcome> {
    let mut total = Decimal::ZERO;
    let mut this_year = Decimal::ZERO;
    for submission in submissions.iter().filter(|s| s.status.is_approved()) {
      check_owner(volunteer, submission)?;
      total = add_hours(total, submission.hours, volunteer)?;
      if submission.service_date.year() == current_year {
        this_year = add_hours(this_year, submission.hours, volunteer)?;
      }
    }
    volunteer.total_hours = total;
    volunteer.this_year_hours = this_year;
    volunteer.hours_year = current_year;
    Ok(self.retier(volunteer))
  }

  fn retier(&self, volunteer: &mut Volunteer) -> AccrualOutcome {
    let previous_tier = volunteer.tier;
    let tier = self.tier_for(volunteer.total_hours);
    volunteer.tier = tier;

    let badge_granted = if tier > previous_tier {
      Badge::for_tier(tier).filter(|badge| volunteer.badges.grant(*badge))
    } else {
      None
    };

    AccrualOutcome { previous_tier, tier, badge_granted }
  }
}

fn check_owner(volunteer: &Volunteer, submission: &Submission) -> Result<()> {
  if submission.volunteer_id != volunteer.volunteer_id {
    return Err(Error::validation(format!(
      "submission {} does not belong to volunteer {}",
      submission.submission_id, volunteer.volunteer_id
    )));
  }
  Ok(())
}

fn add_hours(sum: Decimal, hours: Decimal, volunteer: &Volunteer) -> Result<Decimal> {
  sum.checked_add(hours).ok_or_else(|| {
    Error::validation(format!(
      "hours for volunteer {} exceed the representable range",
      volunteer.volunteer_id
    ))
  })
}

/// Subtract, clamping at zero.
fn subtract_hours(value: Decimal, hours: Decimal, volunteer: &Volunteer, field: &str) -> Decimal {
  let value = value.checked_sub(hours).unwrap_or(Decimal::ZERO);
  if value < Decimal::ZERO {
    tracing::warn!(
      volunteer_id = %volunteer.volunteer_id,
      field,
      %value,
      "aggregate would go negative; clamping to zero"
    );
    Decimal::ZERO
  } else {
    value
  }
}
