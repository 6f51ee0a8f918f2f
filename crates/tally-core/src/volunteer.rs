//! Volunteers, their roles, and the badge set.
//!
//! A volunteer record doubles as the login identity and as the aggregate the
//! reconciler keeps in step with approved submissions.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result, tier::Tier};

// ─── Roles & actors ──────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  #[default]
  Volunteer,
  Admin,
}

/// The already-authenticated caller of a ledger operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
  pub user_id: Uuid,
  pub role:    Role,
}

impl Actor {
  pub fn volunteer(user_id: Uuid) -> Self { Self { user_id, role: Role::Volunteer } }

  pub fn admin(user_id: Uuid) -> Self { Self { user_id, role: Role::Admin } }

  pub fn is_admin(&self) -> bool { self.role == Role::Admin }

  /// Fail with [`Error::Forbidden`] unless the actor is an administrator.
  pub fn require_admin(&self, action: &str) -> Result<()> {
    if self.is_admin() {
      Ok(())
    } else {
      Err(Error::forbidden(format!("only administrators may {action}")))
    }
  }

  /// Owners and administrators may see a volunteer's records.
  pub fn can_view(&self, volunteer_id: Uuid) -> bool {
    self.is_admin() || self.user_id == volunteer_id
  }
}

// ─── Badges ──────────────────────────────────────────────────────────────────

/// A permanent achievement marker.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
pub enum Badge {
  #[serde(rename = "Kindness Ambassador")]
  #[strum(serialize = "Kindness Ambassador")]
  KindnessAmbassador,
  #[serde(rename = "Change Catalyst")]
  #[strum(serialize = "Change Catalyst")]
  ChangeCatalyst,
  #[serde(rename = "Service Champion")]
  #[strum(serialize = "Service Champion")]
  ServiceChampion,
  #[serde(rename = "Legacy Leader")]
  #[strum(serialize = "Legacy Leader")]
  LegacyLeader,
  #[serde(rename = "Social Butterfly")]
  #[strum(serialize = "Social Butterfly")]
  SocialButterfly,
}

impl Badge {
  /// The badge awarded on reaching `tier`; the unranked tier has none.
  pub fn for_tier(tier: Tier) -> Option<Self> {
    match tier {
      Tier::Unranked => None,
      Tier::KindnessAmbassador => Some(Self::KindnessAmbassador),
      Tier::ChangeCatalyst => Some(Self::ChangeCatalyst),
      Tier::ServiceChampion => Some(Self::ServiceChampion),
      Tier::LegacyLeader => Some(Self::LegacyLeader),
    }
  }
}

/// A grow-only set of badges. There is deliberately no removal API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BadgeSet(BTreeSet<Badge>);

impl BadgeSet {
  pub fn new() -> Self { Self::default() }

  /// Add `badge`; returns `true` if it was not already held.
  pub fn grant(&mut self, badge: Badge) -> bool { self.0.insert(badge) }

  pub fn contains(&self, badge: Badge) -> bool { self.0.contains(&badge) }

  pub fn iter(&self) -> impl Iterator<Item = Badge> + '_ { self.0.iter().copied() }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl FromIterator<Badge> for BadgeSet {
  fn from_iter<I: IntoIterator<Item = Badge>>(iter: I) -> Self {
    Self(iter.into_iter().collect())
  }
}

// ─── Volunteer ───────────────────────────────────────────────────────────────

/// A registered user and their reconciled service-hour aggregate.
///
/// `total_hours`, `this_year_hours`, `tier` and `badges` are only ever
/// changed by [`crate::accrual::Reconciler`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Volunteer {
  pub volunteer_id:    Uuid,
  pub email:           String,
  pub full_name:       String,
  pub role:            Role,
  #[serde(skip_serializing, default)]
  pub password_hash:   String,
  pub total_hours:     Decimal,
  /// Approved hours whose service date falls in `hours_year`.
  pub this_year_hours: Decimal,
  pub hours_year:      i32,
  pub tier:            Tier,
  pub badges:          BadgeSet,
  pub referral_code:   String,
  pub referred_by:     Option<String>,
  pub referral_count:  u32,
  pub created_at:      DateTime<Utc>,
  /// Optimistic concurrency token; bumped by the store on every save.
  pub version:         u64,
}

impl Volunteer {
  /// A fresh volunteer with an empty aggregate.
  pub fn new(input: NewVolunteer, referral_code: String, now: DateTime<Utc>) -> Self {
    Self {
      volunteer_id: Uuid::new_v4(),
      email: input.email.trim().to_lowercase(),
      full_name: input.full_name.trim().to_owned(),
      role: input.role,
      password_hash: input.password_hash,
      total_hours: Decimal::ZERO,
      this_year_hours: Decimal::ZERO,
      hours_year: now.year(),
      tier: Tier::Unranked,
      badges: BadgeSet::new(),
      referral_code,
      referred_by: input.referred_by.filter(|c| !c.trim().is_empty()),
      referral_count: 0,
      created_at: now,
      version: 0,
    }
  }

  /// `this_year_hours` as seen in `year`: zero if the bucket is stale.
  pub fn hours_in_year(&self, year: i32) -> Decimal {
    if self.hours_year == year { self.this_year_hours } else { Decimal::ZERO }
  }
}

/// Input to [`crate::Ledger::register`].
#[derive(Debug, Clone)]
pub struct NewVolunteer {
  pub email:         String,
  pub full_name:     String,
  /// Argon2 PHC string; hashing is the caller's concern.
  pub password_hash: String,
  pub role:          Role,
  /// Another volunteer's referral code, if the registrant was referred.
  pub referred_by:   Option<String>,
}

impl NewVolunteer {
  pub fn validate(&self) -> Result<()> {
    let email = self.email.trim();
    if email.is_empty() || !email.contains('@') {
      return Err(Error::validation("a valid email address is required"));
    }
    if self.full_name.trim().is_empty() {
      return Err(Error::validation("full name is required"));
    }
    if self.password_hash.is_empty() {
      return Err(Error::validation("a password is required"));
    }
    Ok(())
  }
}

/// Six uppercase hex characters, e.g. `"3FA91C"`.
pub fn generate_referral_code() -> String {
  Uuid::new_v4().simple().to_string()[..6].to_uppercase()
}
