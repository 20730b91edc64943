//! The outreach cadence: four ordered stages and their due-date offsets.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator as _};

// ─── Stage ───────────────────────────────────────────────────────────────────

/// A position in the outreach sequence. Variants are declared in cadence
/// order, so the derived `Ord` follows the sequence.
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
  EnumIter,
  EnumString,
)]
pub enum Stage {
  #[serde(rename = "First Email")]
  #[strum(serialize = "First Email")]
  FirstEmail,
  #[serde(rename = "Second Email")]
  #[strum(serialize = "Second Email")]
  SecondEmail,
  #[serde(rename = "Phone/LinkedIn Connect")]
  #[strum(serialize = "Phone/LinkedIn Connect")]
  PhoneLinkedInConnect,
  #[serde(rename = "Breakup Email")]
  #[strum(serialize = "Breakup Email")]
  BreakupEmail,
}

impl Stage {
  /// The stage every new contact starts at.
  pub const FIRST: Stage = Stage::FirstEmail;

  /// The stage after `self`. The terminal stage is absorbing: it returns
  /// itself.
  pub fn next(self) -> Stage {
    match self {
      Self::FirstEmail => Self::SecondEmail,
      Self::SecondEmail => Self::PhoneLinkedInConnect,
      Self::PhoneLinkedInConnect => Self::BreakupEmail,
      Self::BreakupEmail => Self::BreakupEmail,
    }
  }

  /// Cumulative days from the contact's creation at which this stage is due.
  pub fn offset_days(self) -> i64 {
    match self {
      Self::FirstEmail => 0,
      Self::SecondEmail => 7,
      Self::PhoneLinkedInConnect => 14,
      Self::BreakupEmail => 21,
    }
  }

  pub fn is_terminal(self) -> bool { self == Self::BreakupEmail }

  /// All stages in cadence order.
  pub fn all() -> impl Iterator<Item = Stage> { Self::iter() }
}

// ─── WeekDay ─────────────────────────────────────────────────────────────────

/// A user-chosen weekday bucket for grouping contacts. Not a scheduling input.
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
  EnumIter,
  EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum WeekDay {
  Monday,
  Tuesday,
  Wednesday,
  Thursday,
  Friday,
}
