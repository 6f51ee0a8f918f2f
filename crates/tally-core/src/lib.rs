//! Domain model and services for the Tally volunteer-hours ledger.
//!
//! Submissions move through review; approved hours accrue onto the owning
//! volunteer, who climbs the tier ladder and collects badges on the way.
//! Storage sits behind [`store::HoursStore`]; HTTP lives in `tally-api`.

pub mod accrual;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod store;
pub mod submission;
pub mod tier;
pub mod volunteer;

pub use error::{Error, Result};
pub use ledger::Ledger;
