//! Recognition tiers and the threshold table that derives them.
//!
//! A tier is a pure function of a volunteer's lifetime approved hours. The
//! table is immutable once built; the reconciler owns one and every call site
//! that needs a tier goes through [`TierTable::tier_for`].

use std::sync::LazyLock;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::{Error, Result};

// ─── Tier ────────────────────────────────────────────────────────────────────

/// A named recognition level. Variants are declared in rank order, so the
/// derived `Ord` is the tier ranking.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  EnumIter,
)]
pub enum Tier {
  #[default]
  #[serde(rename = "None")]
  #[strum(serialize = "None")]
  Unranked,
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
}

impl Tier {
  pub fn is_ranked(self) -> bool { self != Self::Unranked }
}

// ─── Threshold table ─────────────────────────────────────────────────────────

/// Inclusive lower bound on lifetime hours for a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Threshold {
  pub tier:      Tier,
  pub min_hours: Decimal,
}

impl Threshold {
  pub fn new(tier: Tier, min_hours: u32) -> Self {
    Self { tier, min_hours: Decimal::from(min_hours) }
  }
}

/// An ordered, validated list of thresholds. The first entry is always
/// [`Tier::Unranked`] at zero hours; both tiers and hours strictly ascend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierTable {
  thresholds: Vec<Threshold>,
}

static STANDARD: LazyLock<TierTable> = LazyLock::new(TierTable::standard);

impl TierTable {
  /// The organisation's published ladder: 50 / 100 / 150 / 250 hours.
  pub fn standard() -> Self {
    Self {
      thresholds: vec![
        Threshold::new(Tier::Unranked, 0),
        Threshold::new(Tier::KindnessAmbassador, 50),
        Threshold::new(Tier::ChangeCatalyst, 100),
        Threshold::new(Tier::ServiceChampion, 150),
        Threshold::new(Tier::LegacyLeader, 250),
      ],
    }
  }

  /// Build a custom table, rejecting anything that would make `tier_for`
  /// ambiguous.
  pub fn new(thresholds: Vec<Threshold>) -> Result<Self> {
    let first = thresholds
      .first()
      .ok_or_else(|| Error::validation("tier table is empty"))?;
    if first.tier != Tier::Unranked || !first.min_hours.is_zero() {
      return Err(Error::validation(
        "tier table must start with \"None\" at 0 hours",
      ));
    }
    for pair in thresholds.windows(2) {
      if pair[1].tier <= pair[0].tier || pair[1].min_hours <= pair[0].min_hours {
        return Err(Error::validation(format!(
          "tier table is not strictly ascending at {:?}",
          pair[1].tier
        )));
      }
    }
    Ok(Self { thresholds })
  }

  pub fn thresholds(&self) -> &[Threshold] { &self.thresholds }

  /// The highest tier whose threshold `total_hours` meets.
  pub fn tier_for(&self, total_hours: Decimal) -> Tier {
    self
      .thresholds
      .iter()
      .rev()
      .find(|t| total_hours >= t.min_hours)
      .map(|t| t.tier)
      .unwrap_or_default()
  }

  /// The next threshold above `total_hours`, if any.
  pub fn next_after(&self, total_hours: Decimal) -> Option<Threshold> {
    self
      .thresholds
      .iter()
      .find(|t| t.min_hours > total_hours)
      .copied()
  }
}

impl Default for TierTable {
  fn default() -> Self { STANDARD.clone() }
}

/// [`TierTable::tier_for`] against the standard table.
pub fn tier_for(total_hours: Decimal) -> Tier { STANDARD.tier_for(total_hours) }

#[cfg(test)]
mod tests {
  use super::*;

  fn hours(n: i64) -> Decimal { Decimal::from(n) }

  #[test]
  fn thresholds_are_inclusive_lower_bounds() {
    assert_eq!(tier_for(hours(0)), Tier::Unranked);
    assert_eq!(tier_for(hours(49)), Tier::Unranked);
    assert_eq!(tier_for(hours(50)), Tier::KindnessAmbassador);
    assert_eq!(tier_for(hours(99)), Tier::KindnessAmbassador);
    assert_eq!(tier_for(hours(100)), Tier::ChangeCatalyst);
    assert_eq!(tier_for(hours(150)), Tier::ServiceChampion);
    assert_eq!(tier_for(hours(249)), Tier::ServiceChampion);
    assert_eq!(tier_for(hours(250)), Tier::LegacyLeader);
    assert_eq!(tier_for(hours(10_000)), Tier::LegacyLeader);
  }

  #[test]
  fn fractional_hours_just_below_a_threshold() {
    assert_eq!(tier_for(Decimal::new(4999, 2)), Tier::Unranked);
    assert_eq!(tier_for(Decimal::new(5000, 2)), Tier::KindnessAmbassador);
  }

  #[test]
  fn tier_is_monotone_in_hours() {
    let mut previous = Tier::Unranked;
    for h in 0..=400 {
      let tier = tier_for(hours(h));
      assert!(tier >= previous, "tier dropped at {h} hours");
      previous = tier;
    }
  }

  #[test]
  fn labels_round_trip_through_strum_and_serde() {
    assert_eq!("Legacy Leader".parse::<Tier>().unwrap(), Tier::LegacyLeader);
    assert_eq!(Tier::Unranked.to_string(), "None");
    assert_eq!(
      serde_json::to_string(&Tier::ChangeCatalyst).unwrap(),
      "\"Change Catalyst\""
    );
  }

  #[test]
  fn custom_table_must_ascend() {
    let err = TierTable::new(vec![
      Threshold::new(Tier::Unranked, 0),
      Threshold::new(Tier::ChangeCatalyst, 100),
      Threshold::new(Tier::KindnessAmbassador, 120),
    ])
    .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let err = TierTable::new(vec![Threshold::new(Tier::KindnessAmbassador, 0)])
      .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
  }

  #[test]
  fn custom_table_is_used_for_lookup() {
    let table = TierTable::new(vec![
      Threshold::new(Tier::Unranked, 0),
      Threshold::new(Tier::KindnessAmbassador, 10),
    ])
    .unwrap();
    assert_eq!(table.tier_for(hours(12)), Tier::KindnessAmbassador);
    assert_eq!(table.next_after(hours(5)).map(|t| t.tier), Some(Tier::KindnessAmbassador));
    assert_eq!(table.next_after(hours(12)), None);
  }
}
